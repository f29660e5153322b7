//! The network's dynamic models seen as one ODE system.

use nalgebra::DVector;
use ps_core::CommitMode;
use ps_network::Network;

use crate::error::SimResult;
use crate::model::TransientModel;

/// Dynamic states of every bus model, concatenated in bus order.
///
/// Each right-hand-side evaluation stages the candidate states, re-solves
/// the algebraic network with the result left pending, and returns the
/// state derivatives at the solved voltages. Nothing is committed; the
/// caller settles the accepted step.
#[derive(Debug)]
pub struct GridDynamics<'n> {
    net: &'n mut Network,
}

impl<'n> GridDynamics<'n> {
    pub fn new(net: &'n mut Network) -> Self {
        Self { net }
    }

    pub fn network(&self) -> &Network {
        self.net
    }
}

impl TransientModel for GridDynamics<'_> {
    type State = DVector<f64>;

    fn initial_state(&self) -> DVector<f64> {
        self.net.dynamic_states()
    }

    fn rhs(&mut self, _t: f64, x: &DVector<f64>) -> SimResult<DVector<f64>> {
        self.net.set_dynamic_states(x)?;
        self.net.solve_power_flow(CommitMode::Pending)?;
        Ok(self.net.dynamic_derivatives()?)
    }

    fn add(&self, a: &DVector<f64>, b: &DVector<f64>) -> DVector<f64> {
        a + b
    }

    fn scale(&self, a: &DVector<f64>, scale: f64) -> DVector<f64> {
        a * scale
    }
}
