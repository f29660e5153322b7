//! Error types for simulation runs.

use ps_network::NetworkError;
use thiserror::Error;

/// Errors encountered during a time-domain simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: &'static str },

    #[error("Change '{change}' failed at t={time}: {source}")]
    Change {
        change: String,
        time: f64,
        #[source]
        source: NetworkError,
    },

    #[error(transparent)]
    Network(#[from] NetworkError),
}

pub type SimResult<T> = Result<T, SimError>;
