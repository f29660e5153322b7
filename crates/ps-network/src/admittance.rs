//! Sparse bus admittance matrix.
//!
//! For every in-service line between matrix indices `i` and `j` with series
//! admittance `g + jb`:
//!
//! ```text
//! G[i,i] += g   B[i,i] -= b   G[i,j] = -g   B[i,j] = b
//! ```
//!
//! and symmetrically for `j`, followed by `G[i,i] += g_sh, B[i,i] -= b_sh`
//! for each bus shunt. The stored `B` is therefore the negated physical
//! susceptance. Parallel lines accumulate.

use nalgebra_sparse::{CooMatrix, CsrMatrix};
use ps_core::Admittance;

/// Conductance and susceptance parts of `Y`, sharing one sparsity pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct AdmittanceMatrix {
    g: CsrMatrix<f64>,
    b: CsrMatrix<f64>,
}

impl AdmittanceMatrix {
    /// Assemble from branches `(i, j, y)` and per-index shunts.
    ///
    /// Every diagonal entry is structurally present, even for isolated buses.
    pub fn assemble(branches: &[(usize, usize, Admittance)], shunts: &[Admittance]) -> Self {
        let n = shunts.len();
        let mut g = CooMatrix::new(n, n);
        let mut b = CooMatrix::new(n, n);

        for (i, shunt) in shunts.iter().enumerate() {
            g.push(i, i, shunt.conductance);
            b.push(i, i, -shunt.susceptance);
        }
        for &(i, j, y) in branches {
            for (from, to) in [(i, j), (j, i)] {
                g.push(from, from, y.conductance);
                b.push(from, from, -y.susceptance);
                g.push(from, to, -y.conductance);
                b.push(from, to, y.susceptance);
            }
        }

        // Duplicates are summed on conversion.
        Self {
            g: CsrMatrix::from(&g),
            b: CsrMatrix::from(&b),
        }
    }

    pub fn dim(&self) -> usize {
        self.g.nrows()
    }

    pub fn g(&self) -> &CsrMatrix<f64> {
        &self.g
    }

    pub fn b(&self) -> &CsrMatrix<f64> {
        &self.b
    }

    /// Stored entries `(column, G, B)` of row `i`, diagonal included.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        let offsets = self.g.row_offsets();
        let range = offsets[i]..offsets[i + 1];
        self.g.col_indices()[range.clone()]
            .iter()
            .zip(&self.g.values()[range.clone()])
            .zip(&self.b.values()[range])
            .map(|((&col, &g), &b)| (col, g, b))
    }

    /// Stored diagonal entry `(G_ii, B_ii)`.
    pub fn diagonal(&self, i: usize) -> Admittance {
        self.row(i)
            .find(|&(col, _, _)| col == i)
            .map(|(_, g, b)| Admittance::new(g, b))
            .unwrap_or(Admittance::ZERO)
    }

    /// Stored entry `(G_ij, B_ij)`; zero when structurally absent.
    pub fn entry(&self, i: usize, j: usize) -> Admittance {
        self.row(i)
            .find(|&(col, _, _)| col == j)
            .map(|(_, g, b)| Admittance::new(g, b))
            .unwrap_or(Admittance::ZERO)
    }

    /// Structural non-zeros (of either part).
    pub fn nnz(&self) -> usize {
        self.g.nnz()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn branch(n: usize) -> impl Strategy<Value = (usize, usize, Admittance)> {
        (0..n, 1..n, 0.0..5.0_f64, -20.0..-0.1_f64).prop_map(move |(i, off, g, b)| {
            (i, (i + off) % n, Admittance::new(g, b))
        })
    }

    proptest! {
        #[test]
        fn rows_of_series_part_sum_to_zero(
            branches in prop::collection::vec(branch(6), 0..12)
        ) {
            let m = AdmittanceMatrix::assemble(&branches, &[Admittance::ZERO; 6]);
            for i in 0..6 {
                let (gs, bs) = m.row(i).fold((0.0, 0.0), |(ga, ba), (_, g, b)| (ga + g, ba + b));
                prop_assert!(gs.abs() < 1e-9);
                prop_assert!(bs.abs() < 1e-9);
            }
        }

        #[test]
        fn matrix_is_symmetric_and_diagonal_is_negated_sum(
            branches in prop::collection::vec(branch(5), 0..10),
            shunt_b in prop::collection::vec(-1.0..1.0_f64, 5)
        ) {
            let shunts: Vec<_> = shunt_b.iter().map(|&b| Admittance::new(0.0, b)).collect();
            let m = AdmittanceMatrix::assemble(&branches, &shunts);
            for i in 0..5 {
                let mut off = Admittance::ZERO;
                for j in 0..5 {
                    let yij = m.entry(i, j);
                    let yji = m.entry(j, i);
                    prop_assert!((yij.conductance - yji.conductance).abs() < 1e-12);
                    prop_assert!((yij.susceptance - yji.susceptance).abs() < 1e-12);
                    if j != i {
                        off = off + yij;
                    }
                }
                let d = m.diagonal(i);
                prop_assert!((d.conductance + off.conductance).abs() < 1e-9);
                prop_assert!((d.susceptance + off.susceptance + shunts[i].susceptance).abs() < 1e-9);
            }
        }
    }
}
