//! Bus to admittance-matrix index mapping.

/// How buses are numbered in the admittance matrix and Jacobian.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BusOrdering {
    /// Insertion order.
    #[default]
    Insertion,
    /// Ascending incidence count, ties kept in insertion order. A cheap
    /// fill-reducing heuristic for the sparse factorisation.
    Optimal,
}

/// Matrix index to bus position, given each bus's in-service incidence count.
pub fn compute_order(ordering: BusOrdering, incidence: &[usize]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..incidence.len()).collect();
    if ordering == BusOrdering::Optimal {
        // sort_by_key is stable
        order.sort_by_key(|&bus| incidence[bus]);
    }
    order
}

/// Inverse permutation: bus position to matrix index.
pub fn invert(order: &[usize]) -> Vec<usize> {
    let mut position = vec![0; order.len()];
    for (index, &bus) in order.iter().enumerate() {
        position[bus] = index;
    }
    position
}
