//! Kuramoto-type oscillator bus.
//!
//! The single state is the bus phase. While simulating the phase is imposed
//! on the bus angle and evolves as `D dφ/dt = u − P(φ)`, where `P(φ)` is the
//! power drawn by the network given the neighbours' voltages.

use num_complex::Complex64;
use ps_core::{CommitMode, TimeSeries, VoltagePolar};

use crate::context::BusContext;
use crate::error::{ModelError, ModelResult};
use crate::traits::{DynamicModel, InjectionModel, ModelPhase, VoltageRole, check_state_len};

const MODEL: &str = "kuramoto oscillator";
const STATE_NAMES: &[&str] = &["phase"];

#[derive(Debug, Clone, PartialEq)]
pub struct KuramotoParams {
    /// Damping D; larger values slow the phase response.
    pub damping: f64,
}

impl Default for KuramotoParams {
    fn default() -> Self {
        Self { damping: 1.0 }
    }
}

#[derive(Debug, Clone)]
pub struct KuramotoOscillator {
    params: KuramotoParams,
    phase: ModelPhase,
    setpoint: TimeSeries<f64>,
    states: TimeSeries<Vec<f64>>,
}

impl KuramotoOscillator {
    pub fn new(params: KuramotoParams, p: f64) -> ModelResult<Self> {
        if !(params.damping.is_finite() && params.damping > 0.0) {
            return Err(ModelError::InvalidParameter {
                model: MODEL,
                what: "damping must be positive",
            });
        }
        Ok(Self {
            params,
            phase: ModelPhase::Uninitialized,
            setpoint: TimeSeries::with_initial(p),
            states: TimeSeries::new(),
        })
    }

    pub fn setpoint_history(&self) -> &[f64] {
        self.setpoint.history()
    }

    fn setpoint_value(&self) -> f64 {
        self.setpoint.current().copied().unwrap_or(0.0)
    }

    fn oscillator_phase(&self) -> Option<f64> {
        self.states.current().and_then(|x| x.first().copied())
    }
}

impl InjectionModel for KuramotoOscillator {
    fn kind(&self) -> &'static str {
        MODEL
    }

    fn is_generator(&self) -> bool {
        self.setpoint_value() > 0.0
    }

    fn voltage_role(&self) -> VoltageRole {
        match self.phase {
            ModelPhase::Simulating => VoltageRole::HELD,
            ModelPhase::Uninitialized | ModelPhase::InitialValue => VoltageRole::MAGNITUDE_HELD,
        }
    }

    fn power_injection(&self, ctx: &BusContext<'_>) -> ModelResult<Complex64> {
        match self.phase {
            // Bus fully held: whatever the network draws is balanced by the oscillator.
            ModelPhase::Simulating => Ok(ctx.network_injection()),
            ModelPhase::Uninitialized | ModelPhase::InitialValue => {
                Ok(Complex64::new(self.setpoint_value(), 0.0))
            }
        }
    }

    fn power_setpoint(&self) -> Option<f64> {
        Some(self.setpoint_value())
    }

    fn set_power_setpoint(&mut self, p: f64) -> ModelResult<()> {
        self.setpoint.push(p);
        Ok(())
    }

    fn as_dynamic(&self) -> Option<&dyn DynamicModel> {
        Some(self)
    }

    fn as_dynamic_mut(&mut self) -> Option<&mut dyn DynamicModel> {
        Some(self)
    }
}

impl DynamicModel for KuramotoOscillator {
    fn phase(&self) -> ModelPhase {
        self.phase
    }

    fn state_count(&self) -> usize {
        STATE_NAMES.len()
    }

    fn state_names(&self) -> &'static [&'static str] {
        STATE_NAMES
    }

    fn prepare_for_initial_values(&mut self) {
        self.phase = ModelPhase::InitialValue;
    }

    fn initialize_states(
        &mut self,
        ctx: &BusContext<'_>,
        network_injection: Complex64,
    ) -> ModelResult<()> {
        if self.phase != ModelPhase::InitialValue {
            return Err(ModelError::WrongPhase {
                model: MODEL,
                expected: ModelPhase::InitialValue,
                actual: self.phase,
            });
        }
        self.states = TimeSeries::with_initial(vec![ctx.voltage.angle]);
        self.setpoint.push(network_injection.re);
        Ok(())
    }

    fn prepare_for_simulation(&mut self) -> ModelResult<()> {
        if self.states.is_empty() {
            return Err(ModelError::NotInitialized { model: MODEL });
        }
        self.phase = ModelPhase::Simulating;
        Ok(())
    }

    fn states(&self) -> &[f64] {
        self.states.current().map(Vec::as_slice).unwrap_or(&[])
    }

    fn set_states(&mut self, states: &[f64]) -> ModelResult<()> {
        check_state_len(MODEL, STATE_NAMES.len(), states)?;
        self.states.stage(states.to_vec());
        Ok(())
    }

    fn commit_states(&mut self, mode: CommitMode) {
        self.states.settle(mode);
    }

    fn state_history(&self) -> &[Vec<f64>] {
        self.states.history()
    }

    fn state_derivatives(
        &self,
        ctx: &BusContext<'_>,
        _omega_ref: Option<f64>,
        out: &mut [f64],
    ) -> ModelResult<()> {
        if self.phase != ModelPhase::Simulating {
            return Err(ModelError::WrongPhase {
                model: MODEL,
                expected: ModelPhase::Simulating,
                actual: self.phase,
            });
        }
        if out.len() != STATE_NAMES.len() {
            return Err(ModelError::StateLength {
                model: MODEL,
                expected: STATE_NAMES.len(),
                actual: out.len(),
            });
        }
        let phi = self
            .oscillator_phase()
            .ok_or(ModelError::NotInitialized { model: MODEL })?;
        let p_net = ctx
            .network_injection_at(VoltagePolar::new(ctx.voltage.magnitude, phi))
            .re;
        out[0] = (self.setpoint_value() - p_net) / self.params.damping;
        Ok(())
    }

    fn imposed_angle(&self) -> Option<f64> {
        match self.phase {
            ModelPhase::Simulating => self.oscillator_phase(),
            ModelPhase::Uninitialized | ModelPhase::InitialValue => None,
        }
    }
}
