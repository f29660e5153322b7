//! Error types for solver operations.

use ps_core::PsError;
use thiserror::Error;

/// Errors that can occur while iterating towards a root.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Linear solve failed: {what}")]
    LinearSolve { what: String },

    #[error(
        "Jacobian ill-conditioned after {iterations} iterations (condition number {condition_number:.3e})"
    )]
    IllConditioned {
        iterations: usize,
        condition_number: f64,
    },

    #[error("Convergence failed after {iterations} iterations, residual = {residual:e}")]
    ConvergenceFailed { iterations: usize, residual: f64 },

    #[error("Non-finite residual at iteration {iteration}")]
    NonFinite { iteration: usize },

    #[error("Core error: {0}")]
    Core(#[from] PsError),
}

pub type SolverResult<T> = Result<T, SolverError>;
