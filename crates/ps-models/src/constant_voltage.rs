//! Static PV generator.

use num_complex::Complex64;

use crate::context::BusContext;
use crate::error::{ModelError, ModelResult};
use crate::traits::{InjectionModel, VoltageRole};

/// Holds the bus voltage magnitude and injects a fixed active power.
///
/// Reactive power is whatever the network needs to hold the magnitude,
/// so only the active part of the injection is ever checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantVoltage {
    /// Active power set-point (pu)
    pub p: f64,
    /// Voltage magnitude set-point (pu)
    pub voltage: f64,
}

impl ConstantVoltage {
    pub fn new(p: f64, voltage: f64) -> ModelResult<Self> {
        if !(voltage.is_finite() && voltage > 0.0) {
            return Err(ModelError::InvalidParameter {
                model: "constant voltage",
                what: "voltage magnitude must be positive",
            });
        }
        Ok(Self { p, voltage })
    }
}

impl InjectionModel for ConstantVoltage {
    fn kind(&self) -> &'static str {
        "constant voltage"
    }

    fn is_generator(&self) -> bool {
        true
    }

    fn voltage_role(&self) -> VoltageRole {
        VoltageRole::MAGNITUDE_HELD
    }

    fn power_injection(&self, _ctx: &BusContext<'_>) -> ModelResult<Complex64> {
        Ok(Complex64::new(self.p, 0.0))
    }

    fn voltage_setpoint(&self) -> Option<f64> {
        Some(self.voltage)
    }

    fn adopt_voltage_setpoint(&mut self, magnitude: f64) {
        self.voltage = magnitude;
    }

    fn power_setpoint(&self) -> Option<f64> {
        Some(self.p)
    }

    fn set_power_setpoint(&mut self, p: f64) -> ModelResult<()> {
        self.p = p;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_magnitude_only() {
        let pv = ConstantVoltage::new(1.63, 1.025).unwrap();
        assert_eq!(pv.voltage_role(), VoltageRole::MAGNITUDE_HELD);
        assert_eq!(pv.voltage_setpoint(), Some(1.025));
        assert!(pv.is_generator());
    }

    #[test]
    fn rejects_non_positive_voltage() {
        assert!(ConstantVoltage::new(1.0, 0.0).is_err());
        assert!(ConstantVoltage::new(1.0, f64::NAN).is_err());
    }
}
