//! Network-level error types.

use ps_core::{BusId, LineId, PsError};
use ps_models::ModelError;
use ps_solver::SolverError;
use thiserror::Error;

/// Errors raised while building or solving a network.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("Power flow needs a slack bus")]
    MissingSlackBus,

    #[error("Bus {existing} is already the slack bus (requested {requested})")]
    SecondSlackBus { existing: BusId, requested: BusId },

    #[error("Simulation needs an angle reference bus")]
    MissingAngleReference,

    #[error("Unknown bus {0}")]
    UnknownBus(BusId),

    #[error("Unknown line {0}")]
    UnknownLine(LineId),

    #[error("Line {0} is not attached to two buses")]
    LineNotAttached(LineId),

    #[error("Invalid topology: {what}")]
    InvalidTopology { what: &'static str },

    #[error("Model at bus {bus}: {source}")]
    Model {
        bus: BusId,
        #[source]
        source: ModelError,
    },

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Core error: {0}")]
    Core(#[from] PsError),
}

pub type NetworkResult<T> = Result<T, NetworkError>;

pub(crate) trait AtBus<T> {
    fn at_bus(self, bus: BusId) -> NetworkResult<T>;
}

impl<T> AtBus<T> for Result<T, ModelError> {
    fn at_bus(self, bus: BusId) -> NetworkResult<T> {
        self.map_err(|source| NetworkError::Model { bus, source })
    }
}
