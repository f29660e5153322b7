//! Power-flow function vector.
//!
//! For every bus with rows in the [`JacobianLayout`], the mismatch between
//! the power drawn by the network and the power specified by the bus model:
//! `f_P = P_i − P_spec` on the angle row, `f_Q = Q_i − Q_spec` on the
//! magnitude row.

use nalgebra::DVector;
use ps_core::{Admittance, BusId, VoltagePolar};
use ps_models::{BusContext, InjectionModel, Neighbor};

use crate::admittance::AdmittanceMatrix;
use crate::classify::JacobianLayout;
use crate::error::{AtBus, NetworkResult};

/// Read-only snapshot of everything a solve iteration reads, by matrix index.
pub struct NetworkView<'a> {
    pub(crate) y: &'a AdmittanceMatrix,
    pub(crate) layout: &'a JacobianLayout,
    pub(crate) ids: Vec<BusId>,
    pub(crate) voltages: Vec<VoltagePolar>,
    pub(crate) models: Vec<&'a dyn InjectionModel>,
}

impl<'a> NetworkView<'a> {
    pub fn len(&self) -> usize {
        self.voltages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voltages.is_empty()
    }

    /// Fill `scratch` with the neighbours of `index` and return its context.
    pub fn context<'s>(&'s self, index: usize, scratch: &'s mut Vec<Neighbor>) -> BusContext<'s> {
        scratch.clear();
        let mut self_admittance = Admittance::ZERO;
        for (col, g, b) in self.y.row(index) {
            if col == index {
                self_admittance = Admittance::new(g, b);
            } else {
                scratch.push(Neighbor {
                    admittance: Admittance::new(g, b),
                    voltage: self.voltages[col],
                });
            }
        }
        BusContext::new(self.voltages[index], self_admittance, scratch)
    }
}

/// Evaluate `f(x)` at the voltages held in `view`.
pub fn function_vector(view: &NetworkView<'_>) -> NetworkResult<DVector<f64>> {
    let layout = view.layout;
    let mut f = DVector::zeros(layout.dim());
    let mut scratch = Vec::new();

    for index in 0..view.len() {
        let (angle_row, magnitude_row) = (layout.angle_row(index), layout.magnitude_row(index));
        if angle_row.is_none() && magnitude_row.is_none() {
            continue;
        }
        let ctx = view.context(index, &mut scratch);
        let network = ctx.network_injection();
        let specified = view.models[index]
            .power_injection(&ctx)
            .at_bus(view.ids[index])?;

        if let Some(row) = angle_row {
            f[row] = network.re - specified.re;
        }
        if let Some(row) = magnitude_row {
            f[row] = network.im - specified.im;
        }
    }
    Ok(f)
}
