//! Newton-Raphson iteration over caller-supplied callbacks.

use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;
use ps_core::norm_inf;
use tracing::{debug, warn};

use crate::error::SolverError;
use crate::linear::{condition_number, solve_sparse};

/// Newton solver configuration.
#[derive(Clone, Debug)]
pub struct NewtonConfig {
    /// Convergence threshold on the infinity norm of the function vector.
    pub tolerance: f64,
    /// Hard iteration cap.
    pub max_iterations: usize,
    /// Iteration after which the Jacobian condition number is checked on every step.
    pub conditioning_check_after: usize,
    /// Condition number above which the system is declared numerically unstable.
    pub max_condition_number: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 500,
            conditioning_check_after: 100,
            max_condition_number: 5e4,
        }
    }
}

/// Newton iteration result.
#[derive(Clone, Debug)]
pub struct NewtonResult {
    /// Solution vector
    pub x: DVector<f64>,
    /// Number of Jacobian solves performed
    pub iterations: usize,
    /// Final residual infinity norm
    pub residual_norm: f64,
}

/// The four callbacks the solver drives.
///
/// `save_state` is called after every update; implementations decide where
/// the iterate lives (typically a pending slot of a time series).
pub trait NewtonProblem {
    type Error: From<SolverError>;

    /// Current state vector.
    fn state(&self) -> Result<DVector<f64>, Self::Error>;

    /// Store an updated state vector.
    fn save_state(&mut self, x: &DVector<f64>) -> Result<(), Self::Error>;

    /// Jacobian of the function vector at the saved state.
    fn jacobian(&self) -> Result<CsrMatrix<f64>, Self::Error>;

    /// Function (mismatch) vector at the saved state.
    fn function_vector(&self) -> Result<DVector<f64>, Self::Error>;
}

/// Solve `f(x) = 0` by Newton-Raphson: `J h = f(x)`, `x <- x - h`.
pub fn newton_solve<P: NewtonProblem>(
    problem: &mut P,
    config: &NewtonConfig,
) -> Result<NewtonResult, P::Error> {
    let mut x = problem.state()?;
    let mut fx = problem.function_vector()?;
    if fx.len() != x.len() {
        return Err(SolverError::DimensionMismatch {
            what: "function vector",
            expected: x.len(),
            actual: fx.len(),
        }
        .into());
    }

    let mut residual = norm_inf(fx.as_slice());
    if !residual.is_finite() {
        return Err(SolverError::NonFinite { iteration: 0 }.into());
    }
    if residual < config.tolerance {
        return Ok(NewtonResult {
            x,
            iterations: 0,
            residual_norm: residual,
        });
    }

    for iteration in 1..=config.max_iterations {
        let jac = problem.jacobian()?;

        if iteration > config.conditioning_check_after {
            let cond = condition_number(&jac);
            if cond > config.max_condition_number {
                warn!(iteration, cond, "jacobian ill-conditioned, aborting solve");
                return Err(SolverError::IllConditioned {
                    iterations: iteration,
                    condition_number: cond,
                }
                .into());
            }
        }

        let h = solve_sparse(&jac, &fx)?;
        x -= h;
        problem.save_state(&x)?;

        fx = problem.function_vector()?;
        residual = norm_inf(fx.as_slice());
        debug!(iteration, residual, "newton iteration");

        if !residual.is_finite() {
            return Err(SolverError::NonFinite { iteration }.into());
        }
        if residual < config.tolerance {
            return Ok(NewtonResult {
                x,
                iterations: iteration,
                residual_norm: residual,
            });
        }
    }

    Err(SolverError::ConvergenceFailed {
        iterations: config.max_iterations,
        residual,
    }
    .into())
}
