//! ps-sim: time-domain simulation of a power network.
//!
//! Dynamic injection models are integrated with a fixed-step scheme while
//! the algebraic network is re-solved at every derivative evaluation.
//! Scheduled [`SystemChange`]s (line outages, faults, set-point steps) are
//! switched on and off as simulated time crosses their boundaries.

pub mod error;
pub mod grid;
pub mod integrator;
pub mod model;
pub mod perturbation;
pub mod sim;

pub use error::{SimError, SimResult};
pub use grid::GridDynamics;
pub use integrator::{ForwardEuler, Integrator, LegacyRk4, Rk4};
pub use model::TransientModel;
pub use perturbation::{BusFault, LineOutage, PerturbationSchedule, SetpointChange, SystemChange};
pub use sim::{IntegratorType, SimOptions, SimRecord, initialize_simulation, run_simulation};
