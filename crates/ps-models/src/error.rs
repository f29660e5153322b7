//! Model-specific error types.

use ps_core::PsError;
use thiserror::Error;

use crate::traits::ModelPhase;

/// Errors raised by injection models.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("{model} does not support {what}")]
    MissingCapability {
        model: &'static str,
        what: &'static str,
    },

    #[error("{model} is in phase {actual:?}, operation requires {expected:?}")]
    WrongPhase {
        model: &'static str,
        expected: ModelPhase,
        actual: ModelPhase,
    },

    #[error("{model} states have not been initialized")]
    NotInitialized { model: &'static str },

    #[error("Invalid parameter for {model}: {what}")]
    InvalidParameter {
        model: &'static str,
        what: &'static str,
    },

    #[error("State length mismatch for {model}: expected {expected}, got {actual}")]
    StateLength {
        model: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Non-physical condition in {model}: {what}")]
    NonPhysical {
        model: &'static str,
        what: &'static str,
    },

    #[error("Core error: {0}")]
    Core(#[from] PsError),
}

pub type ModelResult<T> = Result<T, ModelError>;
