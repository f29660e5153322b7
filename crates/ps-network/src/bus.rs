//! Network node with a voltage history and one injection model.

use ps_core::{Admittance, BusId, CommitMode, TimeSeries, VoltagePolar};
use ps_models::InjectionModel;
use tracing::debug;

#[derive(Debug)]
pub struct Bus {
    id: BusId,
    name: String,
    voltage: TimeSeries<VoltagePolar>,
    shunt: Admittance,
    model: Box<dyn InjectionModel>,
    magnitude_static: bool,
    angle_static: bool,
}

impl Bus {
    /// Create a bus with `voltage` committed as step 0.
    ///
    /// A voltage set-point carried by the model is overwritten with the bus
    /// magnitude.
    pub(crate) fn new(
        id: BusId,
        name: String,
        voltage: VoltagePolar,
        mut model: Box<dyn InjectionModel>,
    ) -> Self {
        if let Some(hint) = model.voltage_setpoint() {
            if hint != voltage.magnitude {
                debug!(
                    bus = %name,
                    model = hint,
                    bus_value = voltage.magnitude,
                    "model voltage set-point overridden by bus voltage"
                );
                model.adopt_voltage_setpoint(voltage.magnitude);
            }
        }
        let role = model.voltage_role();
        Self {
            id,
            name,
            voltage: TimeSeries::with_initial(voltage),
            shunt: Admittance::ZERO,
            model,
            magnitude_static: role.magnitude_static,
            angle_static: role.angle_static,
        }
    }

    pub fn id(&self) -> BusId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Latest voltage, including an in-progress iterate.
    pub fn voltage(&self) -> VoltagePolar {
        self.voltage.current().copied().unwrap_or(VoltagePolar::FLAT)
    }

    pub fn voltage_history(&self) -> &[VoltagePolar] {
        self.voltage.history()
    }

    pub fn shunt(&self) -> Admittance {
        self.shunt
    }

    pub fn model(&self) -> &dyn InjectionModel {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> &mut dyn InjectionModel {
        self.model.as_mut()
    }

    pub fn magnitude_static(&self) -> bool {
        self.magnitude_static
    }

    pub fn angle_static(&self) -> bool {
        self.angle_static
    }

    pub(crate) fn set_shunt(&mut self, shunt: Admittance) {
        self.shunt = shunt;
    }

    pub(crate) fn set_static_flags(&mut self, magnitude: bool, angle: bool) {
        self.magnitude_static = magnitude;
        self.angle_static = angle;
    }

    /// Copy the model's current voltage role into the bus flags.
    pub(crate) fn apply_model_role(&mut self) {
        let role = self.model.voltage_role();
        self.set_static_flags(role.magnitude_static, role.angle_static);
    }

    pub(crate) fn stage_voltage(&mut self, voltage: VoltagePolar) {
        self.voltage.stage(voltage);
    }

    pub(crate) fn settle_voltage(&mut self, mode: CommitMode) {
        self.voltage.settle(mode);
    }

    pub(crate) fn discard_pending_voltage(&mut self) {
        self.voltage.discard_pending();
    }
}
