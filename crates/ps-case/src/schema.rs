//! Case schema definitions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Case {
    pub version: u32,
    pub name: String,
    #[serde(default = "default_base_mva")]
    pub base_mva: f64,
    #[serde(default)]
    pub units: UnitsDef,
    #[serde(default)]
    pub buses: Vec<BusDef>,
    #[serde(default)]
    pub lines: Vec<LineDef>,
    /// Name of the slack bus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack: Option<String>,
    /// Bus whose machine sets the reference speed once the slack role is dropped.
    /// Defaults to the slack bus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle_reference: Option<String>,
    #[serde(default)]
    pub ordering: OrderingDef,
    #[serde(default)]
    pub power_flow: PowerFlowDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation: Option<SimulationDef>,
    #[serde(default)]
    pub changes: Vec<ChangeDef>,
}

fn default_base_mva() -> f64 {
    100.0
}

/// How powers in the file are expressed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnitsDef {
    /// Per unit on `base_mva`.
    #[default]
    PerUnit,
    /// MW / Mvar, divided by `base_mva` on build.
    Physical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderingDef {
    #[default]
    Insertion,
    Optimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusDef {
    pub name: String,
    /// `[magnitude (pu), angle (degrees)]`
    pub voltage: Vec<f64>,
    /// `[conductance, susceptance]`, per unit. With physical units this is
    /// `[MW, Mvar]` drawn at 1 pu voltage and is divided by `base_mva`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shunt: Option<Vec<f64>>,
    pub model: ModelDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ModelDef {
    /// Fixed injection (generation positive).
    ConstantPower { p: f64, q: f64 },
    /// Fixed consumption.
    Load { p: f64, q: f64 },
    /// Static PV generator.
    ConstantVoltage { p: f64, v: f64 },
    PassiveShunt,
    SynchronousGenerator {
        p: f64,
        inertia: f64,
        #[serde(default)]
        damping: f64,
        transient_reactance: f64,
        #[serde(default = "default_governor_time_constant")]
        governor_time_constant: f64,
        #[serde(default = "default_droop")]
        droop: f64,
        #[serde(default = "default_frequency_hz")]
        frequency_hz: f64,
    },
    Kuramoto {
        p: f64,
        #[serde(default = "default_kuramoto_damping")]
        damping: f64,
    },
}

fn default_governor_time_constant() -> f64 {
    0.5
}

fn default_droop() -> f64 {
    0.05
}

fn default_frequency_hz() -> f64 {
    50.0
}

fn default_kuramoto_damping() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineDef {
    /// Needed only when a change refers to the line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub from: String,
    pub to: String,
    /// `[resistance, reactance]`, always per unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impedance: Option<Vec<f64>>,
    /// `[conductance, susceptance]`, always per unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admittance: Option<Vec<f64>>,
    /// Total line charging susceptance in per unit, whatever `units` says.
    /// Split evenly between the end buses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charging: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PowerFlowDef {
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_conditioning_check_after")]
    pub conditioning_check_after: usize,
    #[serde(default = "default_max_condition_number")]
    pub max_condition_number: f64,
    #[serde(default)]
    pub parallel_jacobian: bool,
}

impl Default for PowerFlowDef {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
            conditioning_check_after: default_conditioning_check_after(),
            max_condition_number: default_max_condition_number(),
            parallel_jacobian: false,
        }
    }
}

fn default_tolerance() -> f64 {
    1e-8
}

fn default_max_iterations() -> usize {
    500
}

fn default_conditioning_check_after() -> usize {
    100
}

fn default_max_condition_number() -> f64 {
    5e4
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationDef {
    pub dt_s: f64,
    pub t_end_s: f64,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default = "default_record_every")]
    pub record_every: usize,
    #[serde(default)]
    pub integrator: IntegratorDef,
}

fn default_max_steps() -> usize {
    100_000
}

fn default_record_every() -> usize {
    1
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorDef {
    #[default]
    Rk4,
    LegacyRk4,
    ForwardEuler,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ChangeDef {
    LineOutage {
        line: String,
        start_s: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_s: Option<f64>,
    },
    BusFault {
        bus: String,
        /// `[conductance, susceptance]` added to the bus shunt, in the same
        /// units as [`BusDef::shunt`].
        shunt: Vec<f64>,
        start_s: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_s: Option<f64>,
    },
    SetpointChange {
        bus: String,
        /// Power set-point, in the same units as the bus models.
        setpoint: f64,
        start_s: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_s: Option<f64>,
    },
}

impl ChangeDef {
    pub fn window(&self) -> (f64, Option<f64>) {
        match self {
            ChangeDef::LineOutage { start_s, end_s, .. }
            | ChangeDef::BusFault { start_s, end_s, .. }
            | ChangeDef::SetpointChange { start_s, end_s, .. } => (*start_s, *end_s),
        }
    }
}
