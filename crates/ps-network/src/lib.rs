//! ps-network: buses, lines and the AC power-flow problem.
//!
//! A [`Network`] owns its buses (each with one injection model) and the
//! lines between them. From these it derives the sparse admittance matrix,
//! a per-bus classification with the matching Jacobian layout, and solves
//! the power-flow equations with the Newton solver from `ps-solver`.
//!
//! The dynamic hooks in [`dynamic`] drive the model state machines and
//! expose state vectors and derivatives to the time integrator.

pub mod admittance;
pub mod bus;
pub mod classify;
pub mod config;
pub mod dynamic;
pub mod error;
pub mod flows;
pub mod jacobian;
pub mod line;
pub mod mismatch;
pub mod network;
pub mod ordering;
pub mod powerflow;

pub use admittance::AdmittanceMatrix;
pub use bus::Bus;
pub use classify::{BusClass, JacobianLayout};
pub use config::PowerFlowConfig;
pub use error::{NetworkError, NetworkResult};
pub use flows::LineFlow;
pub use jacobian::{JacobianBlock, diagonal_block, off_diagonal_block};
pub use line::Line;
pub use network::Network;
pub use ordering::BusOrdering;
pub use powerflow::PowerFlowReport;
