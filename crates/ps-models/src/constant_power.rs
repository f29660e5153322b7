//! Constant complex power injection (PQ bus).

use num_complex::Complex64;

use crate::context::BusContext;
use crate::error::ModelResult;
use crate::traits::{InjectionModel, VoltageRole};

/// Fixed `P + jQ` injection, independent of the bus voltage.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantPower {
    /// Active power injected into the network (pu)
    pub p: f64,
    /// Reactive power injected into the network (pu)
    pub q: f64,
}

impl ConstantPower {
    pub fn new(p: f64, q: f64) -> Self {
        Self { p, q }
    }

    /// A load consuming `p + jq`; stored as the negated injection.
    pub fn load(p: f64, q: f64) -> Self {
        Self { p: -p, q: -q }
    }
}

impl InjectionModel for ConstantPower {
    fn kind(&self) -> &'static str {
        "constant power"
    }

    fn is_generator(&self) -> bool {
        self.p > 0.0
    }

    fn voltage_role(&self) -> VoltageRole {
        VoltageRole::FREE
    }

    fn power_injection(&self, _ctx: &BusContext<'_>) -> ModelResult<Complex64> {
        Ok(Complex64::new(self.p, self.q))
    }

    fn power_setpoint(&self) -> Option<f64> {
        Some(self.p)
    }

    fn set_power_setpoint(&mut self, p: f64) -> ModelResult<()> {
        self.p = p;
        Ok(())
    }
}
