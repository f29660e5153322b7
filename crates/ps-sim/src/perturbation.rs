//! Scheduled changes to the network during a simulation.
//!
//! A [`SystemChange`] is active on `[start_time, end_time)`. The
//! [`PerturbationSchedule`] polls every change at the start of each step and
//! activates or deactivates it when the step time crosses a boundary.

use std::fmt;

use ps_core::{Admittance, BusId, LineId};
use ps_network::{Network, NetworkResult};
use tracing::info;

use crate::error::{SimError, SimResult};

/// Something that alters the network for a window of simulated time.
pub trait SystemChange: fmt::Debug + Send {
    /// Short description used in logs and errors.
    fn label(&self) -> String;

    fn start_time(&self) -> f64;

    /// `None` keeps the change in force until the end of the run.
    fn end_time(&self) -> Option<f64>;

    fn activate(&mut self, net: &mut Network) -> NetworkResult<()>;

    fn deactivate(&mut self, net: &mut Network) -> NetworkResult<()>;

    /// Whether (de)activating alters line or shunt admittances.
    fn admittance_matrix_recompute_required(&self) -> bool;
}

#[derive(Debug)]
struct Scheduled {
    change: Box<dyn SystemChange>,
    active: bool,
}

/// Registered changes and whether each is currently in force.
#[derive(Debug, Default)]
pub struct PerturbationSchedule {
    entries: Vec<Scheduled>,
}

impl PerturbationSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: impl SystemChange + 'static) {
        self.push_boxed(Box::new(change));
    }

    pub fn push_boxed(&mut self, change: Box<dyn SystemChange>) {
        self.entries.push(Scheduled {
            change,
            active: false,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of changes currently in force.
    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|e| e.active).count()
    }

    /// Bring every change in line with time `t`.
    ///
    /// Returns whether the admittance matrix must be rebuilt.
    pub fn poll(&mut self, t: f64, net: &mut Network) -> SimResult<bool> {
        let mut recompute = false;
        for entry in &mut self.entries {
            let change = &mut entry.change;
            let in_window =
                t >= change.start_time() && change.end_time().is_none_or(|end| t < end);

            if in_window == entry.active {
                continue;
            }
            let result = if in_window {
                change.activate(net)
            } else {
                change.deactivate(net)
            };
            result.map_err(|source| SimError::Change {
                change: change.label(),
                time: t,
                source,
            })?;
            entry.active = in_window;
            recompute |= change.admittance_matrix_recompute_required();
            info!(
                t,
                change = %change.label(),
                active = in_window,
                "system change {}",
                if in_window { "activated" } else { "deactivated" }
            );
        }
        Ok(recompute)
    }
}

/// Takes a line out of service.
#[derive(Clone, Debug, PartialEq)]
pub struct LineOutage {
    pub line: LineId,
    pub start: f64,
    pub end: Option<f64>,
}

impl SystemChange for LineOutage {
    fn label(&self) -> String {
        format!("outage of line {}", self.line)
    }

    fn start_time(&self) -> f64 {
        self.start
    }

    fn end_time(&self) -> Option<f64> {
        self.end
    }

    fn activate(&mut self, net: &mut Network) -> NetworkResult<()> {
        net.set_line_in_service(self.line, false)
    }

    fn deactivate(&mut self, net: &mut Network) -> NetworkResult<()> {
        net.set_line_in_service(self.line, true)
    }

    fn admittance_matrix_recompute_required(&self) -> bool {
        true
    }
}

/// Adds a fault admittance to a bus shunt, restoring the original shunt
/// when cleared.
#[derive(Clone, Debug, PartialEq)]
pub struct BusFault {
    pub bus: BusId,
    pub shunt: Admittance,
    pub start: f64,
    pub end: Option<f64>,
    saved: Option<Admittance>,
}

impl BusFault {
    pub fn new(bus: BusId, shunt: Admittance, start: f64, end: Option<f64>) -> Self {
        Self {
            bus,
            shunt,
            start,
            end,
            saved: None,
        }
    }
}

impl SystemChange for BusFault {
    fn label(&self) -> String {
        format!("fault at bus {}", self.bus)
    }

    fn start_time(&self) -> f64 {
        self.start
    }

    fn end_time(&self) -> Option<f64> {
        self.end
    }

    fn activate(&mut self, net: &mut Network) -> NetworkResult<()> {
        let base = net.bus(self.bus)?.shunt();
        let faulted = Admittance::new(
            base.conductance + self.shunt.conductance,
            base.susceptance + self.shunt.susceptance,
        );
        net.set_bus_shunt(self.bus, faulted)?;
        self.saved = Some(base);
        Ok(())
    }

    fn deactivate(&mut self, net: &mut Network) -> NetworkResult<()> {
        if let Some(base) = self.saved.take() {
            net.set_bus_shunt(self.bus, base)?;
        }
        Ok(())
    }

    fn admittance_matrix_recompute_required(&self) -> bool {
        true
    }
}

/// Steps the power set-point of a bus model, restoring the previous value
/// when the change ends.
#[derive(Clone, Debug, PartialEq)]
pub struct SetpointChange {
    pub bus: BusId,
    pub setpoint: f64,
    pub start: f64,
    pub end: Option<f64>,
    previous: Option<f64>,
}

impl SetpointChange {
    pub fn new(bus: BusId, setpoint: f64, start: f64, end: Option<f64>) -> Self {
        Self {
            bus,
            setpoint,
            start,
            end,
            previous: None,
        }
    }
}

impl SystemChange for SetpointChange {
    fn label(&self) -> String {
        format!("set-point {} at bus {}", self.setpoint, self.bus)
    }

    fn start_time(&self) -> f64 {
        self.start
    }

    fn end_time(&self) -> Option<f64> {
        self.end
    }

    fn activate(&mut self, net: &mut Network) -> NetworkResult<()> {
        let previous = net.bus(self.bus)?.model().power_setpoint();
        net.set_power_setpoint(self.bus, self.setpoint)?;
        self.previous = previous;
        Ok(())
    }

    fn deactivate(&mut self, net: &mut Network) -> NetworkResult<()> {
        if let Some(p) = self.previous.take() {
            net.set_power_setpoint(self.bus, p)?;
        }
        Ok(())
    }

    fn admittance_matrix_recompute_required(&self) -> bool {
        false
    }
}
