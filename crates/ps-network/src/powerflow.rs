//! Newton-Raphson power-flow solve over the network.

use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;
use ps_core::{CommitMode, VoltagePolar};
use ps_models::ModelPhase;
use ps_solver::{NewtonProblem, newton_solve};
use tracing::{debug, info};

use crate::error::{NetworkError, NetworkResult};
use crate::flows::LineFlow;
use crate::jacobian;
use crate::mismatch;
use crate::network::Network;

/// Outcome of a converged power-flow solve.
#[derive(Clone, Debug, PartialEq)]
pub struct PowerFlowReport {
    pub iterations: usize,
    /// Infinity norm of the final mismatch.
    pub residual: f64,
}

/// Adapter exposing the network's voltages to the Newton solver.
///
/// The state vector is laid out like the Jacobian: a bus contributes its
/// angle on its angle row and its magnitude on its magnitude row. Iterates
/// are staged as pending bus voltages.
struct PowerFlowProblem<'n> {
    net: &'n mut Network,
}

impl NewtonProblem for PowerFlowProblem<'_> {
    type Error = NetworkError;

    fn state(&self) -> NetworkResult<DVector<f64>> {
        let view = self.net.view()?;
        let layout = view.layout;
        let mut x = DVector::zeros(layout.dim());
        for (index, v) in view.voltages.iter().enumerate() {
            if let Some(row) = layout.angle_row(index) {
                x[row] = v.angle;
            }
            if let Some(row) = layout.magnitude_row(index) {
                x[row] = v.magnitude;
            }
        }
        Ok(x)
    }

    fn save_state(&mut self, x: &DVector<f64>) -> NetworkResult<()> {
        let net = &mut *self.net;
        let layout = net.layout.as_ref().ok_or(NetworkError::InvalidTopology {
            what: "jacobian layout unavailable",
        })?;
        if x.len() != layout.dim() {
            return Err(ps_solver::SolverError::DimensionMismatch {
                what: "power-flow state",
                expected: layout.dim(),
                actual: x.len(),
            }
            .into());
        }
        for (index, &pos) in net.order.iter().enumerate() {
            let (angle_row, magnitude_row) =
                (layout.angle_row(index), layout.magnitude_row(index));
            if angle_row.is_none() && magnitude_row.is_none() {
                continue;
            }
            let bus = &mut net.buses[pos];
            let mut v = bus.voltage();
            if let Some(row) = angle_row {
                v.angle = x[row];
            }
            if let Some(row) = magnitude_row {
                v.magnitude = x[row];
            }
            bus.stage_voltage(v);
        }
        Ok(())
    }

    fn jacobian(&self) -> NetworkResult<CsrMatrix<f64>> {
        let view = self.net.view()?;
        jacobian::assemble(&view, self.net.config.parallel_jacobian)
    }

    fn function_vector(&self) -> NetworkResult<DVector<f64>> {
        mismatch::function_vector(&self.net.view()?)
    }
}

impl Network {
    /// Solve the power-flow equations from the current voltages.
    ///
    /// `mode` decides what happens to the converged voltages and line
    /// flows: a new step, a replacement of the latest step, or left
    /// pending for the caller.
    pub fn solve_power_flow(&mut self, mode: CommitMode) -> NetworkResult<PowerFlowReport> {
        self.ensure_layout()?;
        if !self.angle_anchored() {
            return Err(NetworkError::MissingSlackBus);
        }

        // Every bus gets a pending iterate, so settling always yields one entry per step.
        for bus in &mut self.buses {
            let mut v = bus.voltage();
            if let Some(angle) = bus.model().as_dynamic().and_then(|d| d.imposed_angle()) {
                v.angle = angle;
            }
            bus.stage_voltage(v);
        }

        let newton = self.config.newton.clone();
        let result = newton_solve(&mut PowerFlowProblem { net: self }, &newton);
        let result = match result {
            Ok(r) => r,
            Err(e) => {
                self.discard_pending_voltages();
                return Err(e);
            }
        };

        self.stage_line_flows()?;
        for bus in &mut self.buses {
            bus.settle_voltage(mode);
        }
        for line in &mut self.lines {
            line.settle_flow(mode);
        }

        let report = PowerFlowReport {
            iterations: result.iterations,
            residual: result.residual_norm,
        };
        match mode {
            CommitMode::Pending => debug!(?report, "power flow converged"),
            CommitMode::Append | CommitMode::Replace => info!(
                iterations = report.iterations,
                residual = report.residual,
                ?mode,
                "power flow converged"
            ),
        }
        Ok(report)
    }

    /// Whether bus angles are pinned to something: a slack bus, a held
    /// angle, or a simulating machine whose injection depends on angle.
    fn angle_anchored(&self) -> bool {
        self.slack.is_some()
            || self.buses.iter().any(|bus| {
                bus.angle_static()
                    || bus
                        .model()
                        .as_dynamic()
                        .is_some_and(|d| d.phase() == ModelPhase::Simulating)
            })
    }

    fn discard_pending_voltages(&mut self) {
        for bus in &mut self.buses {
            bus.discard_pending_voltage();
        }
    }

    fn stage_line_flows(&mut self) -> NetworkResult<()> {
        for line in &mut self.lines {
            let flow = if line.in_service() {
                let (a, b) = line.incident_buses()?;
                LineFlow::compute(
                    line.admittance(),
                    self.buses[a.index() as usize].voltage(),
                    self.buses[b.index() as usize].voltage(),
                )
            } else {
                LineFlow::default()
            };
            line.stage_flow(flow);
        }
        Ok(())
    }

    /// Power-flow unknowns at the current voltages, in Jacobian layout.
    pub fn power_flow_state(&mut self) -> NetworkResult<DVector<f64>> {
        self.ensure_layout()?;
        PowerFlowProblem { net: self }.state()
    }

    /// Mismatch vector at `x`. Pending voltage iterates are discarded afterwards.
    pub fn mismatch_at(&mut self, x: &DVector<f64>) -> NetworkResult<DVector<f64>> {
        self.ensure_layout()?;
        let f = {
            let mut problem = PowerFlowProblem { net: self };
            problem.save_state(x).and_then(|()| problem.function_vector())
        };
        self.discard_pending_voltages();
        f
    }

    /// Analytic Jacobian at `x`. Pending voltage iterates are discarded afterwards.
    pub fn jacobian_at(&mut self, x: &DVector<f64>) -> NetworkResult<CsrMatrix<f64>> {
        self.ensure_layout()?;
        let jac = {
            let mut problem = PowerFlowProblem { net: self };
            problem.save_state(x).and_then(|()| problem.jacobian())
        };
        self.discard_pending_voltages();
        jac
    }

    /// Voltage of every bus, in insertion order.
    pub fn voltages(&self) -> Vec<VoltagePolar> {
        self.buses.iter().map(|b| b.voltage()).collect()
    }
}
