//! Hooks that move dynamic models through their lifecycle and expose their
//! states to a time integrator.
//!
//! Dynamic states are concatenated bus by bus in insertion order.

use nalgebra::DVector;
use num_complex::Complex64;
use ps_core::{Admittance, BusId, CommitMode, VoltagePolar};
use ps_models::{BusContext, Neighbor};
use tracing::info;

use crate::error::{AtBus, NetworkError, NetworkResult};
use crate::network::Network;

/// Owned copy of a bus context, so models can be mutated afterwards.
struct OwnedContext {
    position: usize,
    voltage: VoltagePolar,
    self_admittance: Admittance,
    neighbors: Vec<Neighbor>,
    injection: Complex64,
}

impl Network {
    /// Put every dynamic model into initial-value mode and adopt its
    /// voltage role.
    pub fn prepare_initial_values(&mut self) {
        for bus in &mut self.buses {
            if let Some(d) = bus.model_mut().as_dynamic_mut() {
                d.prepare_for_initial_values();
                bus.apply_model_role();
            }
        }
        self.layout = None;
    }

    /// Initialize dynamic states from the current (converged) voltages.
    pub fn initialize_dynamic_states(&mut self) -> NetworkResult<()> {
        self.ensure_layout()?;
        let contexts: Vec<OwnedContext> = {
            let view = self.view()?;
            let mut scratch = Vec::new();
            self.buses
                .iter()
                .enumerate()
                .filter(|(_, bus)| bus.model().is_dynamic())
                .map(|(position, _)| {
                    let ctx = view.context(self.position[position], &mut scratch);
                    OwnedContext {
                        position,
                        voltage: ctx.voltage,
                        self_admittance: ctx.self_admittance,
                        injection: ctx.network_injection(),
                        neighbors: ctx.neighbors.to_vec(),
                    }
                })
                .collect()
        };

        for c in contexts {
            let bus = &mut self.buses[c.position];
            let id = bus.id();
            let ctx = BusContext::new(c.voltage, c.self_admittance, &c.neighbors);
            if let Some(d) = bus.model_mut().as_dynamic_mut() {
                d.initialize_states(&ctx, c.injection).at_bus(id)?;
            }
        }
        Ok(())
    }

    /// Switch dynamic models to simulation mode.
    ///
    /// The angle reference defaults to the slack bus, which then stops being
    /// slack: during simulation bus angles are anchored by the machines. A
    /// network without dynamic models keeps its slack bus.
    pub fn prepare_for_simulation(&mut self) -> NetworkResult<()> {
        let reference = self
            .angle_reference
            .or(self.slack)
            .ok_or(NetworkError::MissingAngleReference)?;
        self.angle_reference = Some(reference);

        for bus in &mut self.buses {
            let id = bus.id();
            if let Some(d) = bus.model_mut().as_dynamic_mut() {
                d.prepare_for_simulation().at_bus(id)?;
                bus.apply_model_role();
            }
        }
        if self.buses.iter().any(|b| b.model().is_dynamic()) {
            self.clear_slack_bus();
        }
        self.layout = None;
        info!(reference = %reference, states = self.dynamic_state_count(), "network prepared for simulation");
        Ok(())
    }

    /// Total number of dynamic states.
    pub fn dynamic_state_count(&self) -> usize {
        self.buses
            .iter()
            .filter_map(|b| b.model().as_dynamic())
            .map(|d| d.state_count())
            .sum()
    }

    /// `(bus, state name)` for every entry of the state vector.
    pub fn dynamic_state_labels(&self) -> Vec<(BusId, &'static str)> {
        self.buses
            .iter()
            .filter_map(|b| b.model().as_dynamic().map(|d| (b.id(), d.state_names())))
            .flat_map(|(id, names)| names.iter().map(move |&n| (id, n)))
            .collect()
    }

    /// Current dynamic states (pending iterates included).
    pub fn dynamic_states(&self) -> DVector<f64> {
        let states: Vec<f64> = self
            .buses
            .iter()
            .filter_map(|b| b.model().as_dynamic())
            .flat_map(|d| d.states().iter().copied())
            .collect();
        DVector::from_vec(states)
    }

    /// Stage `x` as the pending dynamic states.
    pub fn set_dynamic_states(&mut self, x: &DVector<f64>) -> NetworkResult<()> {
        let expected = self.dynamic_state_count();
        if x.len() != expected {
            return Err(ps_core::PsError::Arity {
                what: "dynamic state vector",
                expected,
                actual: x.len(),
            }
            .into());
        }
        let mut offset = 0;
        for bus in &mut self.buses {
            let id = bus.id();
            if let Some(d) = bus.model_mut().as_dynamic_mut() {
                let n = d.state_count();
                d.set_states(&x.as_slice()[offset..offset + n]).at_bus(id)?;
                offset += n;
            }
        }
        Ok(())
    }

    /// Time derivatives of the dynamic states at the current voltages.
    pub fn dynamic_derivatives(&mut self) -> NetworkResult<DVector<f64>> {
        self.ensure_layout()?;
        let reference = self.angle_reference;
        let reference_speed = match reference {
            Some(id) => self
                .bus(id)?
                .model()
                .as_dynamic()
                .and_then(|d| d.angular_speed()),
            None => None,
        };

        let view = self.view()?;
        let mut dx = DVector::zeros(self.dynamic_state_count());
        let mut scratch = Vec::new();
        let mut offset = 0;
        for (position, bus) in self.buses.iter().enumerate() {
            let Some(d) = bus.model().as_dynamic() else {
                continue;
            };
            let n = d.state_count();
            // The reference machine measures itself against nominal speed.
            let omega_ref = if Some(bus.id()) == reference {
                d.nominal_angular_speed()
            } else {
                reference_speed
            };
            let ctx = view.context(self.position[position], &mut scratch);
            d.state_derivatives(&ctx, omega_ref, &mut dx.as_mut_slice()[offset..offset + n])
                .at_bus(bus.id())?;
            offset += n;
        }
        Ok(dx)
    }

    /// Resolve pending dynamic states.
    pub fn commit_dynamic_states(&mut self, mode: CommitMode) {
        for bus in &mut self.buses {
            if let Some(d) = bus.model_mut().as_dynamic_mut() {
                d.commit_states(mode);
            }
        }
    }
}
