//! The network: buses, lines and their derived solver structures.

use num_complex::Complex64;
use ps_core::{Admittance, BusId, IdAllocator, LineId, SeriesParameters, VoltagePolar};
use ps_models::{InjectionModel, Neighbor};
use tracing::debug;

use crate::admittance::AdmittanceMatrix;
use crate::bus::Bus;
use crate::classify::{BusClass, BusFlags, JacobianLayout};
use crate::config::PowerFlowConfig;
use crate::error::{AtBus, NetworkError, NetworkResult};
use crate::line::Line;
use crate::mismatch::NetworkView;
use crate::ordering::{BusOrdering, compute_order, invert};

/// Buses and lines, plus the admittance matrix and Jacobian layout derived
/// from them.
///
/// Derived structures are rebuilt lazily: topology, impedance and ordering
/// changes drop the admittance matrix, flag and slack changes drop the
/// layout.
#[derive(Debug, Default)]
pub struct Network {
    pub(crate) buses: Vec<Bus>,
    pub(crate) lines: Vec<Line>,
    bus_ids: IdAllocator,
    line_ids: IdAllocator,
    pub(crate) ordering: BusOrdering,
    /// Matrix index -> bus position.
    pub(crate) order: Vec<usize>,
    /// Bus position -> matrix index.
    pub(crate) position: Vec<usize>,
    pub(crate) admittance: Option<AdmittanceMatrix>,
    pub(crate) layout: Option<JacobianLayout>,
    pub(crate) slack: Option<BusId>,
    pub(crate) angle_reference: Option<BusId>,
    pub(crate) config: PowerFlowConfig,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PowerFlowConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &PowerFlowConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PowerFlowConfig) {
        self.config = config;
    }

    // ---- topology ----

    /// Add a bus hosting `model`, with `voltage` as its initial value.
    pub fn add_bus(
        &mut self,
        name: impl Into<String>,
        voltage: VoltagePolar,
        model: Box<dyn InjectionModel>,
    ) -> BusId {
        let id = self.bus_ids.allocate();
        self.buses.push(Bus::new(id, name.into(), voltage, model));
        self.invalidate_admittance();
        id
    }

    pub fn set_bus_shunt(&mut self, bus: BusId, shunt: Admittance) -> NetworkResult<()> {
        self.bus_mut(bus)?.set_shunt(shunt);
        self.invalidate_admittance();
        Ok(())
    }

    /// Add a line that is not yet connected to any bus.
    pub fn add_line(&mut self, params: SeriesParameters) -> NetworkResult<LineId> {
        let admittance = params.resolve()?;
        let id = self.line_ids.allocate();
        self.lines.push(Line::new(id, admittance));
        Ok(id)
    }

    pub fn attach_line(&mut self, line: LineId, a: BusId, b: BusId) -> NetworkResult<()> {
        self.bus(a)?;
        self.bus(b)?;
        self.line_mut(line)?.attach(a, b)?;
        self.invalidate_admittance();
        Ok(())
    }

    /// Add a line between `a` and `b`.
    pub fn connect_buses(
        &mut self,
        a: BusId,
        b: BusId,
        params: SeriesParameters,
    ) -> NetworkResult<LineId> {
        self.bus(a)?;
        self.bus(b)?;
        let line = self.add_line(params)?;
        self.attach_line(line, a, b)?;
        Ok(line)
    }

    pub fn set_line_in_service(&mut self, line: LineId, in_service: bool) -> NetworkResult<()> {
        let l = self.line_mut(line)?;
        if l.in_service() != in_service {
            l.set_in_service(in_service);
            self.invalidate_admittance();
        }
        Ok(())
    }

    /// Make `bus` the slack bus. A different existing slack bus must be
    /// cleared first.
    pub fn set_slack_bus(&mut self, bus: BusId) -> NetworkResult<()> {
        self.bus(bus)?;
        match self.slack {
            Some(existing) if existing != bus => Err(NetworkError::SecondSlackBus {
                existing,
                requested: bus,
            }),
            _ => {
                self.slack = Some(bus);
                self.layout = None;
                Ok(())
            }
        }
    }

    pub fn clear_slack_bus(&mut self) {
        if self.slack.take().is_some() {
            self.layout = None;
        }
    }

    pub fn slack_bus(&self) -> Option<BusId> {
        self.slack
    }

    pub fn set_angle_reference_bus(&mut self, bus: BusId) -> NetworkResult<()> {
        self.bus(bus)?;
        self.angle_reference = Some(bus);
        Ok(())
    }

    pub fn angle_reference_bus(&self) -> Option<BusId> {
        self.angle_reference
    }

    pub fn set_ordering(&mut self, ordering: BusOrdering) {
        if self.ordering != ordering {
            self.ordering = ordering;
            self.invalidate_admittance();
        }
    }

    pub fn ordering(&self) -> BusOrdering {
        self.ordering
    }

    /// Override which voltage parts of `bus` are held during power flow.
    pub fn set_bus_static_flags(
        &mut self,
        bus: BusId,
        magnitude: bool,
        angle: bool,
    ) -> NetworkResult<()> {
        self.bus_mut(bus)?.set_static_flags(magnitude, angle);
        self.layout = None;
        Ok(())
    }

    /// Drop the admittance matrix (and everything indexed like it).
    pub fn invalidate_admittance(&mut self) {
        self.admittance = None;
        self.layout = None;
    }

    pub fn set_power_setpoint(&mut self, bus: BusId, p: f64) -> NetworkResult<()> {
        self.bus_mut(bus)?.model_mut().set_power_setpoint(p).at_bus(bus)
    }

    // ---- lookup ----

    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn bus(&self, id: BusId) -> NetworkResult<&Bus> {
        self.buses
            .get(id.index() as usize)
            .ok_or(NetworkError::UnknownBus(id))
    }

    pub fn bus_mut(&mut self, id: BusId) -> NetworkResult<&mut Bus> {
        self.buses
            .get_mut(id.index() as usize)
            .ok_or(NetworkError::UnknownBus(id))
    }

    pub fn bus_by_name(&self, name: &str) -> Option<&Bus> {
        self.buses.iter().find(|b| b.name() == name)
    }

    pub fn line(&self, id: LineId) -> NetworkResult<&Line> {
        self.lines
            .get(id.index() as usize)
            .ok_or(NetworkError::UnknownLine(id))
    }

    pub(crate) fn line_mut(&mut self, id: LineId) -> NetworkResult<&mut Line> {
        self.lines
            .get_mut(id.index() as usize)
            .ok_or(NetworkError::UnknownLine(id))
    }

    /// In-service line count per bus position.
    pub fn incidence_counts(&self) -> NetworkResult<Vec<usize>> {
        let mut counts = vec![0; self.buses.len()];
        for line in self.lines.iter().filter(|l| l.in_service()) {
            let (a, b) = line.incident_buses()?;
            counts[a.index() as usize] += 1;
            counts[b.index() as usize] += 1;
        }
        Ok(counts)
    }

    // ---- derived structures ----

    /// Rebuild the ordering and admittance matrix if stale.
    pub fn ensure_admittance(&mut self) -> NetworkResult<&AdmittanceMatrix> {
        if self.admittance.is_none() {
            let incidence = self.incidence_counts()?;
            self.order = compute_order(self.ordering, &incidence);
            self.position = invert(&self.order);

            let mut branches = Vec::with_capacity(self.lines.len());
            for line in self.lines.iter().filter(|l| l.in_service()) {
                let (a, b) = line.incident_buses()?;
                branches.push((
                    self.position[a.index() as usize],
                    self.position[b.index() as usize],
                    line.admittance(),
                ));
            }
            let shunts: Vec<Admittance> =
                self.order.iter().map(|&pos| self.buses[pos].shunt()).collect();

            let matrix = AdmittanceMatrix::assemble(&branches, &shunts);
            debug!(
                buses = matrix.dim(),
                nnz = matrix.nnz(),
                ordering = ?self.ordering,
                "admittance matrix rebuilt"
            );
            self.admittance = Some(matrix);
            self.layout = None;
        }
        self.admittance
            .as_ref()
            .ok_or(NetworkError::InvalidTopology {
                what: "admittance matrix unavailable",
            })
    }

    /// Rebuild the classification and Jacobian layout if stale.
    pub fn ensure_layout(&mut self) -> NetworkResult<&JacobianLayout> {
        self.ensure_admittance()?;
        if self.layout.is_none() {
            let flags: Vec<BusFlags> = self
                .order
                .iter()
                .map(|&pos| {
                    let bus = &self.buses[pos];
                    BusFlags {
                        slack: self.slack == Some(bus.id()),
                        dynamic: bus.model().is_dynamic(),
                        magnitude_static: bus.magnitude_static(),
                        angle_static: bus.angle_static(),
                    }
                })
                .collect();
            self.layout = Some(JacobianLayout::build(&flags));
        }
        self.layout.as_ref().ok_or(NetworkError::InvalidTopology {
            what: "jacobian layout unavailable",
        })
    }

    /// Admittance-matrix index of `bus` under the current ordering.
    pub fn matrix_index(&mut self, bus: BusId) -> NetworkResult<usize> {
        self.bus(bus)?;
        self.ensure_admittance()?;
        Ok(self.position[bus.index() as usize])
    }

    /// Classification of `bus` in the current layout.
    pub fn bus_class(&mut self, bus: BusId) -> NetworkResult<BusClass> {
        let index = self.matrix_index(bus)?;
        Ok(self.ensure_layout()?.class(index))
    }

    pub fn jacobian_dimension(&mut self) -> NetworkResult<usize> {
        Ok(self.ensure_layout()?.dim())
    }

    /// Snapshot of the current voltages and models. Derived structures
    /// must be up to date.
    pub(crate) fn view(&self) -> NetworkResult<NetworkView<'_>> {
        let (Some(y), Some(layout)) = (self.admittance.as_ref(), self.layout.as_ref()) else {
            return Err(NetworkError::InvalidTopology {
                what: "derived structures are stale",
            });
        };
        let buses = self.order.iter().map(|&pos| &self.buses[pos]);
        Ok(NetworkView {
            y,
            layout,
            ids: buses.clone().map(Bus::id).collect(),
            voltages: buses.clone().map(Bus::voltage).collect(),
            models: buses.map(Bus::model).collect(),
        })
    }

    /// Complex power the network draws from `bus` at the current voltages.
    pub fn network_injection(&mut self, bus: BusId) -> NetworkResult<Complex64> {
        let index = self.matrix_index(bus)?;
        self.ensure_layout()?;
        let view = self.view()?;
        let mut scratch: Vec<Neighbor> = Vec::new();
        Ok(view.context(index, &mut scratch).network_injection())
    }
}
