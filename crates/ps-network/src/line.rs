//! Series branch between two buses.

use ps_core::{Admittance, BusId, CommitMode, LineId, TimeSeries};

use crate::error::{NetworkError, NetworkResult};
use crate::flows::LineFlow;

/// A line's ends are stored in ascending id order; flows are reported
/// from `bus_a` towards `bus_b`.
#[derive(Debug, Clone)]
pub struct Line {
    id: LineId,
    ends: Option<(BusId, BusId)>,
    admittance: Admittance,
    in_service: bool,
    flows: TimeSeries<LineFlow>,
}

impl Line {
    pub(crate) fn new(id: LineId, admittance: Admittance) -> Self {
        Self {
            id,
            ends: None,
            admittance,
            in_service: true,
            flows: TimeSeries::new(),
        }
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    /// Series admittance `g + jb`.
    pub fn admittance(&self) -> Admittance {
        self.admittance
    }

    pub fn in_service(&self) -> bool {
        self.in_service
    }

    /// `(bus_a, bus_b)`, failing when the line has not been connected.
    pub fn incident_buses(&self) -> NetworkResult<(BusId, BusId)> {
        self.ends.ok_or(NetworkError::LineNotAttached(self.id))
    }

    /// The bus at the other end from `bus`, if `bus` is an end.
    pub fn other_end(&self, bus: BusId) -> Option<BusId> {
        match self.ends? {
            (a, b) if a == bus => Some(b),
            (a, b) if b == bus => Some(a),
            _ => None,
        }
    }

    pub fn flow_history(&self) -> &[LineFlow] {
        self.flows.history()
    }

    pub fn flow(&self) -> Option<LineFlow> {
        self.flows.current().copied()
    }

    pub(crate) fn attach(&mut self, a: BusId, b: BusId) -> NetworkResult<()> {
        if a == b {
            return Err(NetworkError::InvalidTopology {
                what: "line cannot connect a bus to itself",
            });
        }
        self.ends = Some(if a < b { (a, b) } else { (b, a) });
        Ok(())
    }

    pub(crate) fn set_in_service(&mut self, in_service: bool) {
        self.in_service = in_service;
    }

    pub(crate) fn stage_flow(&mut self, flow: LineFlow) {
        self.flows.stage(flow);
    }

    pub(crate) fn settle_flow(&mut self, mode: CommitMode) {
        self.flows.settle(mode);
    }
}
