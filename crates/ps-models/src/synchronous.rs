//! Structure-preserving synchronous generator.
//!
//! Classical swing-equation machine behind a transient reactance with a
//! first-order droop governor. States are `[δ, ω, P_m]`: rotor angle,
//! rotor angular speed and mechanical (governor) power.
//!
//! ```text
//! dδ/dt   = ω − ω_ref
//! dω/dt   = (P_m − P_e − D (ω − ω_ref)) / M
//! dP_m/dt = (u − P_m − (ω − ω_ref) / (R_d ω_ref)) / τ_g
//! P_e     = E V sin(δ − θ) / X'd
//! Q_e     = (E V cos(δ − θ) − V²) / X'd
//! ```

use num_complex::Complex64;
use ps_core::{CommitMode, TimeSeries};
use tracing::debug;

use crate::context::BusContext;
use crate::error::{ModelError, ModelResult};
use crate::traits::{
    DynamicModel, InjectionModel, ModelPhase, PowerSensitivities, VoltageRole, check_state_len,
};

const MODEL: &str = "synchronous generator";
const STATE_NAMES: &[&str] = &["rotor_angle", "angular_speed", "mechanical_power"];

/// Default nominal angular speed, 2π·50 rad/s.
pub const DEFAULT_ANGULAR_SPEED: f64 = 2.0 * std::f64::consts::PI * 50.0;

/// Machine and governor parameters (per unit on the system base).
#[derive(Debug, Clone, PartialEq)]
pub struct SynchronousGeneratorParams {
    /// Inertia constant M
    pub inertia: f64,
    /// Damping coefficient D
    pub damping: f64,
    /// Transient reactance X'd
    pub transient_reactance: f64,
    /// Governor time constant τ_g (s)
    pub governor_time_constant: f64,
    /// Droop R_d
    pub droop: f64,
    /// Nominal angular speed (rad/s)
    pub nominal_angular_speed: f64,
}

impl Default for SynchronousGeneratorParams {
    fn default() -> Self {
        Self {
            inertia: 0.1,
            damping: 0.01,
            transient_reactance: 0.06,
            governor_time_constant: 0.5,
            droop: 0.05,
            nominal_angular_speed: DEFAULT_ANGULAR_SPEED,
        }
    }
}

impl SynchronousGeneratorParams {
    fn validate(&self) -> ModelResult<()> {
        let positive = [
            (self.inertia, "inertia must be positive"),
            (
                self.transient_reactance,
                "transient reactance must be positive",
            ),
            (
                self.governor_time_constant,
                "governor time constant must be positive",
            ),
            (self.droop, "droop must be positive"),
            (
                self.nominal_angular_speed,
                "nominal angular speed must be positive",
            ),
        ];
        for (value, what) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ModelError::InvalidParameter { model: MODEL, what });
            }
        }
        if !(self.damping.is_finite() && self.damping >= 0.0) {
            return Err(ModelError::InvalidParameter {
                model: MODEL,
                what: "damping must be non-negative",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SynchronousGenerator {
    params: SynchronousGeneratorParams,
    phase: ModelPhase,
    setpoint: TimeSeries<f64>,
    states: TimeSeries<Vec<f64>>,
    /// Internal EMF magnitude, fixed once initialized.
    emf: Option<f64>,
    terminal_voltage: Option<f64>,
}

impl SynchronousGenerator {
    /// Generator with an active power set-point `p`.
    pub fn new(params: SynchronousGeneratorParams, p: f64) -> ModelResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            phase: ModelPhase::Uninitialized,
            setpoint: TimeSeries::with_initial(p),
            states: TimeSeries::new(),
            emf: None,
            terminal_voltage: None,
        })
    }

    /// Terminal voltage magnitude the generator was specified with.
    pub fn with_terminal_voltage(mut self, magnitude: f64) -> Self {
        self.terminal_voltage = Some(magnitude);
        self
    }

    pub fn params(&self) -> &SynchronousGeneratorParams {
        &self.params
    }

    pub fn emf(&self) -> Option<f64> {
        self.emf
    }

    pub fn setpoint_history(&self) -> &[f64] {
        self.setpoint.history()
    }

    fn setpoint_value(&self) -> f64 {
        self.setpoint.current().copied().unwrap_or(0.0)
    }

    /// `(E, δ)` while simulating.
    fn internal_voltage(&self) -> ModelResult<(f64, f64)> {
        let emf = self
            .emf
            .ok_or(ModelError::NotInitialized { model: MODEL })?;
        let delta = self
            .states
            .current()
            .and_then(|x| x.first().copied())
            .ok_or(ModelError::NotInitialized { model: MODEL })?;
        Ok((emf, delta))
    }

    fn electrical_power(&self, ctx: &BusContext<'_>) -> ModelResult<Complex64> {
        let (e, delta) = self.internal_voltage()?;
        let v = ctx.voltage.magnitude;
        let (sin, cos) = (delta - ctx.voltage.angle).sin_cos();
        let x = self.params.transient_reactance;
        Ok(Complex64::new(e * v * sin / x, (e * v * cos - v * v) / x))
    }
}

impl InjectionModel for SynchronousGenerator {
    fn kind(&self) -> &'static str {
        MODEL
    }

    fn is_generator(&self) -> bool {
        true
    }

    fn voltage_role(&self) -> VoltageRole {
        match self.phase {
            ModelPhase::Simulating => VoltageRole::FREE,
            ModelPhase::Uninitialized | ModelPhase::InitialValue => VoltageRole::MAGNITUDE_HELD,
        }
    }

    fn power_injection(&self, ctx: &BusContext<'_>) -> ModelResult<Complex64> {
        match self.phase {
            ModelPhase::Simulating => self.electrical_power(ctx),
            ModelPhase::Uninitialized | ModelPhase::InitialValue => {
                Ok(Complex64::new(self.setpoint_value(), 0.0))
            }
        }
    }

    fn power_sensitivities(&self, ctx: &BusContext<'_>) -> Option<PowerSensitivities> {
        if self.phase != ModelPhase::Simulating {
            return None;
        }
        let (e, delta) = self.internal_voltage().ok()?;
        let v = ctx.voltage.magnitude;
        let (sin, cos) = (delta - ctx.voltage.angle).sin_cos();
        let x = self.params.transient_reactance;
        Some(PowerSensitivities {
            dp_dtheta: -e * v * cos / x,
            dp_dv: e * sin / x,
            dq_dtheta: e * v * sin / x,
            dq_dv: (e * cos - 2.0 * v) / x,
        })
    }

    fn voltage_setpoint(&self) -> Option<f64> {
        self.terminal_voltage
    }

    fn adopt_voltage_setpoint(&mut self, magnitude: f64) {
        self.terminal_voltage = Some(magnitude);
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

impl DynamicModel for SynchronousGenerator {
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
        let v = ctx.voltage.phasor();
        if v.norm() == 0.0 {
            return Err(ModelError::NonPhysical {
                model: MODEL,
                what: "zero terminal voltage",
            });
        }

        // E∠δ = V∠θ + jX'd I, with I = conj(S / V)
        let current = (network_injection / v).conj();
        let internal = v + Complex64::i() * self.params.transient_reactance * current;
        let (emf, delta) = internal.to_polar();

        self.emf = Some(emf);
        self.states = TimeSeries::with_initial(vec![
            delta,
            self.params.nominal_angular_speed,
            network_injection.re,
        ]);
        self.setpoint.push(network_injection.re);
        debug!(emf, delta, p = network_injection.re, "generator states initialized");
        Ok(())
    }

    fn prepare_for_simulation(&mut self) -> ModelResult<()> {
        if self.emf.is_none() || self.states.is_empty() {
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
        omega_ref: Option<f64>,
        out: &mut [f64],
    ) -> ModelResult<()> {
        if self.phase != ModelPhase::Simulating {
            return Err(ModelError::WrongPhase {
                model: MODEL,
                expected: ModelPhase::Simulating,
                actual: self.phase,
            });
        }
        let omega_ref = omega_ref.ok_or(ModelError::MissingCapability {
            model: MODEL,
            what: "reference angular speed",
        })?;
        if out.len() != STATE_NAMES.len() {
            return Err(ModelError::StateLength {
                model: MODEL,
                expected: STATE_NAMES.len(),
                actual: out.len(),
            });
        }
        let (omega, p_mech) = match self.states() {
            [_, omega, p_mech] => (*omega, *p_mech),
            _ => return Err(ModelError::NotInitialized { model: MODEL }),
        };

        let p_elec = self.electrical_power(ctx)?.re;
        let slip = omega - omega_ref;
        let SynchronousGeneratorParams {
            inertia,
            damping,
            governor_time_constant,
            droop,
            ..
        } = self.params;

        out[0] = slip;
        out[1] = (p_mech - p_elec - damping * slip) / inertia;
        out[2] = (self.setpoint_value() - p_mech - slip / (droop * omega_ref))
            / governor_time_constant;
        Ok(())
    }

    fn angular_speed(&self) -> Option<f64> {
        self.states().get(1).copied()
    }

    fn nominal_angular_speed(&self) -> Option<f64> {
        Some(self.params.nominal_angular_speed)
    }
}
