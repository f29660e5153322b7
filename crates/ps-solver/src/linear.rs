//! Sparse direct solve and conditioning estimate for Newton steps.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use rsparse::data::Trpl;

use crate::error::{SolverError, SolverResult};

/// Solve `a * x = b` with a sparse LU factorisation.
///
/// A 1x1 system is solved as a plain scalar division.
pub fn solve_sparse(a: &CsrMatrix<f64>, b: &DVector<f64>) -> SolverResult<DVector<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(SolverError::DimensionMismatch {
            what: "jacobian columns",
            expected: n,
            actual: a.ncols(),
        });
    }
    if b.len() != n {
        return Err(SolverError::DimensionMismatch {
            what: "right-hand side",
            expected: n,
            actual: b.len(),
        });
    }

    match n {
        0 => Ok(DVector::zeros(0)),
        1 => {
            let pivot: f64 = a.triplet_iter().map(|(_, _, v)| *v).sum();
            if pivot == 0.0 || !pivot.is_finite() {
                return Err(SolverError::LinearSolve {
                    what: format!("singular 1x1 jacobian ({pivot})"),
                });
            }
            Ok(DVector::from_element(1, b[0] / pivot))
        }
        _ => {
            let mut trpl = Trpl::<f64>::new();
            trpl.m = n;
            trpl.n = n;
            for (i, j, v) in a.triplet_iter() {
                trpl.append(i, j, *v);
            }
            trpl.sum_dupl();
            let csc = trpl.to_sprs();

            let mut x: Vec<f64> = b.iter().copied().collect();
            // order 1: AMD on A+A'; tol 1.0: partial pivoting
            rsparse::lusol(&csc, &mut x, 1, 1.0).map_err(|e| SolverError::LinearSolve {
                what: format!("{e:?}"),
            })?;

            if x.iter().any(|v| !v.is_finite()) {
                return Err(SolverError::LinearSolve {
                    what: "factorisation produced non-finite values".to_string(),
                });
            }
            Ok(DVector::from_vec(x))
        }
    }
}

/// 2-norm condition number `σ_max / σ_min` (infinite when singular).
///
/// Densifies the matrix, so only call it when the cost is acceptable.
pub fn condition_number(a: &CsrMatrix<f64>) -> f64 {
    if a.nrows() == 0 {
        return 1.0;
    }
    let dense: DMatrix<f64> = DMatrix::from(a);
    let sv = dense.singular_values();
    let (min, max) = sv
        .iter()
        .fold((f64::INFINITY, 0.0_f64), |(lo, hi), &s| (lo.min(s), hi.max(s)));
    if min == 0.0 || !min.is_finite() {
        f64::INFINITY
    } else {
        max / min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_sparse::CooMatrix;

    fn csr(n: usize, entries: &[(usize, usize, f64)]) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(n, n);
        for &(i, j, v) in entries {
            coo.push(i, j, v);
        }
        CsrMatrix::from(&coo)
    }

    #[test]
    fn scalar_system() {
        let a = csr(1, &[(0, 0, 4.0)]);
        let x = solve_sparse(&a, &DVector::from_element(1, 2.0)).unwrap();
        assert!((x[0] - 0.5).abs() < 1e-15);
    }

    #[test]
    fn singular_scalar_system_fails() {
        let a = csr(1, &[]);
        assert!(solve_sparse(&a, &DVector::from_element(1, 2.0)).is_err());
    }

    #[test]
    fn three_by_three_system() {
        // [4 1 0; 1 3 1; 0 1 2] x = [1 2 3]
        let a = csr(
            3,
            &[
                (0, 0, 4.0),
                (0, 1, 1.0),
                (1, 0, 1.0),
                (1, 1, 3.0),
                (1, 2, 1.0),
                (2, 1, 1.0),
                (2, 2, 2.0),
            ],
        );
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let x = solve_sparse(&a, &b).unwrap();

        let dense: DMatrix<f64> = DMatrix::from(&a);
        let residual = dense * &x - b;
        assert!(residual.amax() < 1e-12);
    }

    #[test]
    fn rhs_length_is_checked() {
        let a = csr(2, &[(0, 0, 1.0), (1, 1, 1.0)]);
        let err = solve_sparse(&a, &DVector::zeros(3)).unwrap_err();
        assert!(matches!(err, SolverError::DimensionMismatch { .. }));
    }

    #[test]
    fn condition_number_of_diagonal() {
        let a = csr(2, &[(0, 0, 10.0), (1, 1, 0.5)]);
        assert!((condition_number(&a) - 20.0).abs() < 1e-9);
        let singular = csr(2, &[(0, 0, 1.0)]);
        assert!(condition_number(&singular) > 1e12);
    }
}
