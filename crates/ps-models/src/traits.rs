//! Core traits for bus injection models.

use std::fmt;

use num_complex::Complex64;
use ps_core::{CommitMode, ensure_finite};

use crate::context::BusContext;
use crate::error::{ModelError, ModelResult};

/// Which parts of the bus voltage a model pins during power flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct VoltageRole {
    pub magnitude_static: bool,
    pub angle_static: bool,
}

impl VoltageRole {
    /// Magnitude and angle solved by the network (PQ behaviour).
    pub const FREE: VoltageRole = VoltageRole {
        magnitude_static: false,
        angle_static: false,
    };
    /// Magnitude held (PV behaviour).
    pub const MAGNITUDE_HELD: VoltageRole = VoltageRole {
        magnitude_static: true,
        angle_static: false,
    };
    /// Both held.
    pub const HELD: VoltageRole = VoltageRole {
        magnitude_static: true,
        angle_static: true,
    };
}

/// Lifecycle of a dynamic model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ModelPhase {
    #[default]
    Uninitialized,
    /// Solving the initial operating point; the model acts as a static injection.
    InitialValue,
    /// States integrated in time, injection a function of state.
    Simulating,
}

/// Partial derivatives of a model's injection with respect to its bus voltage.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PowerSensitivities {
    pub dp_dtheta: f64,
    pub dp_dv: f64,
    pub dq_dtheta: f64,
    pub dq_dv: f64,
}

/// A model attached to a bus that injects complex power into the network.
///
/// Positive injection means power delivered to the network (generation);
/// loads inject negative power.
pub trait InjectionModel: fmt::Debug + Send + Sync {
    /// Model kind for logs and error messages.
    fn kind(&self) -> &'static str;

    fn is_generator(&self) -> bool {
        false
    }

    /// Voltage components this model holds fixed in the current phase.
    fn voltage_role(&self) -> VoltageRole;

    /// Specified complex power injection at the bus.
    fn power_injection(&self, ctx: &BusContext<'_>) -> ModelResult<Complex64>;

    /// Injection sensitivities, for models whose injection depends on the bus voltage.
    fn power_sensitivities(&self, _ctx: &BusContext<'_>) -> Option<PowerSensitivities> {
        None
    }

    /// Voltage magnitude the model was configured with, if any.
    fn voltage_setpoint(&self) -> Option<f64> {
        None
    }

    /// Overwrite the configured voltage magnitude with the bus value.
    fn adopt_voltage_setpoint(&mut self, _magnitude: f64) {}

    /// Active power set-point, if the model has one.
    fn power_setpoint(&self) -> Option<f64> {
        None
    }

    fn set_power_setpoint(&mut self, _p: f64) -> ModelResult<()> {
        Err(ModelError::MissingCapability {
            model: self.kind(),
            what: "power set-point",
        })
    }

    fn as_dynamic(&self) -> Option<&dyn DynamicModel> {
        None
    }

    fn as_dynamic_mut(&mut self) -> Option<&mut dyn DynamicModel> {
        None
    }

    fn is_dynamic(&self) -> bool {
        self.as_dynamic().is_some()
    }
}

/// Dynamic view of an injection model: owned states and their derivatives.
pub trait DynamicModel {
    fn phase(&self) -> ModelPhase;

    /// Number of scalar states.
    fn state_count(&self) -> usize;

    fn state_names(&self) -> &'static [&'static str];

    /// Enter initial-value mode: behave as a static injection while the
    /// operating point is solved.
    fn prepare_for_initial_values(&mut self);

    /// Derive the initial states from a converged operating point.
    ///
    /// `network_injection` is the complex power the network draws at the bus.
    fn initialize_states(
        &mut self,
        ctx: &BusContext<'_>,
        network_injection: Complex64,
    ) -> ModelResult<()>;

    /// Enter simulation mode; states must be initialized.
    fn prepare_for_simulation(&mut self) -> ModelResult<()>;

    /// Current states (pending iterate if any).
    fn states(&self) -> &[f64];

    /// Stage a new state vector as the pending iterate.
    fn set_states(&mut self, states: &[f64]) -> ModelResult<()>;

    /// Resolve the pending state iterate.
    fn commit_states(&mut self, mode: CommitMode);

    fn state_history(&self) -> &[Vec<f64>];

    /// Evaluate state derivatives into `out`.
    ///
    /// `omega_ref` is the angular speed of the reference frame; models that
    /// need it fail with [`ModelError::MissingCapability`] when it is absent.
    fn state_derivatives(
        &self,
        ctx: &BusContext<'_>,
        omega_ref: Option<f64>,
        out: &mut [f64],
    ) -> ModelResult<()>;

    /// Rotor angular speed, for models that have one.
    fn angular_speed(&self) -> Option<f64> {
        None
    }

    fn nominal_angular_speed(&self) -> Option<f64> {
        None
    }

    /// Bus angle the model imposes during simulation, if any.
    fn imposed_angle(&self) -> Option<f64> {
        None
    }
}

/// Shared guard for `set_states` implementations.
pub(crate) fn check_state_len(model: &'static str, expected: usize, states: &[f64]) -> ModelResult<()> {
    if states.len() != expected {
        return Err(ModelError::StateLength {
            model,
            expected,
            actual: states.len(),
        });
    }
    for &value in states {
        ensure_finite(value, "model state")?;
    }
    Ok(())
}
