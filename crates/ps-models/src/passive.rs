//! Bus without an active injection.

use num_complex::Complex64;

use crate::context::BusContext;
use crate::error::ModelResult;
use crate::traits::{InjectionModel, VoltageRole};

/// Zero injection. Any shunt element lives in the bus shunt admittance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PassiveShunt;

impl InjectionModel for PassiveShunt {
    fn kind(&self) -> &'static str {
        "passive shunt"
    }

    fn voltage_role(&self) -> VoltageRole {
        VoltageRole::FREE
    }

    fn power_injection(&self, _ctx: &BusContext<'_>) -> ModelResult<Complex64> {
        Ok(Complex64::new(0.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;

    #[test]
    fn has_no_setpoint() {
        let mut shunt = PassiveShunt;
        assert!(matches!(
            shunt.set_power_setpoint(1.0),
            Err(ModelError::MissingCapability { .. })
        ));
        assert_eq!(shunt.power_setpoint(), None);
    }
}
