//! Generic Newton-Raphson root finder for sparse nonlinear systems.
//!
//! The solver knows nothing about power networks: callers implement
//! [`NewtonProblem`] to expose their state vector, residual (function
//! vector) and analytic Jacobian, and the solver drives the iteration.

pub mod error;
pub mod jacobian;
pub mod linear;
pub mod newton;

pub use error::{SolverError, SolverResult};
pub use jacobian::central_difference_jacobian;
pub use linear::{condition_number, solve_sparse};
pub use newton::{NewtonConfig, NewtonProblem, NewtonResult, newton_solve};
