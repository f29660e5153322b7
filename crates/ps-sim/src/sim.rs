//! Simulation runner and result recording.

use nalgebra::DVector;
use ps_core::CommitMode;
use ps_network::Network;
use tracing::{debug, info};

use crate::error::{SimError, SimResult};
use crate::grid::GridDynamics;
use crate::integrator::{ForwardEuler, Integrator, LegacyRk4, Rk4};
use crate::model::TransientModel;
use crate::perturbation::PerturbationSchedule;

/// Integrator selection for simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegratorType {
    /// Classical 4th-order Runge-Kutta (default, 4 rhs calls per step).
    #[default]
    Rk4,
    /// Runge-Kutta with the last stage taken from `k2`, for reproducing older runs.
    LegacyRk4,
    /// Forward Euler (1st-order, 1 rhs call per step).
    ForwardEuler,
}

impl IntegratorType {
    pub fn step<M: TransientModel>(
        self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        match self {
            IntegratorType::Rk4 => Rk4.step(model, t, x, dt),
            IntegratorType::LegacyRk4 => LegacyRk4.step(model, t, x, dt),
            IntegratorType::ForwardEuler => ForwardEuler.step(model, t, x, dt),
        }
    }
}

/// Options for simulation runs.
#[derive(Clone, Debug, PartialEq)]
pub struct SimOptions {
    /// Fixed time step (seconds)
    pub dt: f64,
    /// Final simulation time (seconds)
    pub t_end: f64,
    /// Maximum number of steps (safety limit)
    pub max_steps: usize,
    /// Record every N-th step (decimation)
    pub record_every: usize,
    /// Integrator type (default: RK4)
    pub integrator: IntegratorType,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 1e-3,
            t_end: 1.0,
            max_steps: 100_000,
            record_every: 10,
            integrator: IntegratorType::default(),
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SimError::InvalidArg {
                what: "dt must be positive",
            });
        }
        if !(self.t_end.is_finite() && self.t_end >= 0.0) {
            return Err(SimError::InvalidArg {
                what: "t_end must be non-negative",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        if self.record_every == 0 {
            return Err(SimError::InvalidArg {
                what: "record_every must be positive",
            });
        }
        Ok(())
    }

    /// Steps needed to reach `t_end`, capped at `max_steps`.
    pub fn step_count(&self) -> usize {
        let steps = (self.t_end / self.dt - 1e-9).ceil().max(0.0) as usize;
        steps.min(self.max_steps)
    }
}

/// Record of simulation results.
#[derive(Clone, Debug)]
pub struct SimRecord<S> {
    /// Time points (seconds)
    pub t: Vec<f64>,
    /// State snapshots
    pub x: Vec<S>,
}

impl<S> SimRecord<S> {
    fn push(&mut self, t: f64, x: S) {
        self.t.push(t);
        self.x.push(x);
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

/// Bring a freshly built network to a consistent initial operating point.
///
/// Dynamic models act as PV buses for the initial power flow, derive their
/// states from the converged voltages, and then switch to simulation mode.
/// The slack bus becomes the angle reference. A second solve in simulation
/// mode replaces the first so step 0 holds one voltage per bus.
pub fn initialize_simulation(net: &mut Network) -> SimResult<()> {
    net.prepare_initial_values();
    let report = net.solve_power_flow(CommitMode::Replace)?;
    debug!(iterations = report.iterations, "initial power flow solved");
    net.initialize_dynamic_states()?;
    net.prepare_for_simulation()?;
    net.solve_power_flow(CommitMode::Replace)?;
    Ok(())
}

/// Run a fixed-step simulation of `net`.
///
/// Per step: poll the perturbation schedule (rebuilding the admittance
/// matrix when a change asks for it), advance the dynamic states with the
/// selected integrator, then solve the network at the new states and append
/// both to their histories.
pub fn run_simulation(
    net: &mut Network,
    schedule: &mut PerturbationSchedule,
    opts: &SimOptions,
) -> SimResult<SimRecord<DVector<f64>>> {
    opts.validate()?;
    initialize_simulation(net)?;

    let mut x = net.dynamic_states();
    let mut record = SimRecord {
        t: vec![0.0],
        x: vec![x.clone()],
    };

    let steps = opts.step_count();
    info!(
        steps,
        dt = opts.dt,
        states = x.len(),
        integrator = ?opts.integrator,
        "simulation started"
    );

    let mut t = 0.0;
    for step in 1..=steps {
        if schedule.poll(t, net)? {
            net.invalidate_admittance();
        }

        x = {
            let mut model = GridDynamics::new(net);
            opts.integrator.step(&mut model, t, &x, opts.dt)?
        };
        if x.iter().any(|v| !v.is_finite()) {
            return Err(SimError::NonPhysical {
                what: "non-finite dynamic state",
            });
        }

        net.set_dynamic_states(&x)?;
        net.solve_power_flow(CommitMode::Append)?;
        net.commit_dynamic_states(CommitMode::Append);
        t = step as f64 * opts.dt;

        if step % opts.record_every == 0 || step == steps {
            record.push(t, x.clone());
        }
    }

    info!(t, steps, "simulation finished");
    Ok(record)
}
