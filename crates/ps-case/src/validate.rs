//! Case validation logic.

use crate::schema::{BusDef, Case, ChangeDef, LineDef, ModelDef};
use std::collections::HashSet;

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Case has no slack bus")]
    MissingSlack,

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn check_pair(field: String, values: &[f64]) -> Result<(), ValidationError> {
    if values.len() != 2 {
        return Err(invalid(field, format!("{values:?}"), "expected 2 values"));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(invalid(field, format!("{values:?}"), "must be finite"));
    }
    Ok(())
}

fn check_positive(field: String, value: f64) -> Result<(), ValidationError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(invalid(field, value, "must be positive"));
    }
    Ok(())
}

pub fn validate_case(case: &Case) -> Result<(), ValidationError> {
    if case.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: case.version,
        });
    }
    check_positive("base_mva".to_string(), case.base_mva)?;

    let mut bus_names = HashSet::new();
    for bus in &case.buses {
        if !bus_names.insert(bus.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: bus.name.clone(),
                context: "buses".to_string(),
            });
        }
        validate_bus(bus)?;
    }

    let mut line_names = HashSet::new();
    for (index, line) in case.lines.iter().enumerate() {
        if let Some(name) = &line.name {
            if !line_names.insert(name.as_str()) {
                return Err(ValidationError::DuplicateId {
                    id: name.clone(),
                    context: "lines".to_string(),
                });
            }
        }
        validate_line(index, line, &bus_names)?;
    }

    let slack = case.slack.as_ref().ok_or(ValidationError::MissingSlack)?;
    if !bus_names.contains(slack.as_str()) {
        return Err(ValidationError::MissingReference {
            id: slack.clone(),
            context: "slack".to_string(),
        });
    }
    if let Some(reference) = &case.angle_reference {
        if !bus_names.contains(reference.as_str()) {
            return Err(ValidationError::MissingReference {
                id: reference.clone(),
                context: "angle_reference".to_string(),
            });
        }
    }

    let pf = &case.power_flow;
    check_positive("power_flow.tolerance".to_string(), pf.tolerance)?;
    check_positive(
        "power_flow.max_condition_number".to_string(),
        pf.max_condition_number,
    )?;
    if pf.max_iterations == 0 {
        return Err(invalid("power_flow.max_iterations", 0, "must be positive"));
    }

    if let Some(sim) = &case.simulation {
        check_positive("simulation.dt_s".to_string(), sim.dt_s)?;
        if !(sim.t_end_s.is_finite() && sim.t_end_s >= 0.0) {
            return Err(invalid("simulation.t_end_s", sim.t_end_s, "must be non-negative"));
        }
        if sim.max_steps == 0 {
            return Err(invalid("simulation.max_steps", 0, "must be positive"));
        }
        if sim.record_every == 0 {
            return Err(invalid("simulation.record_every", 0, "must be positive"));
        }
    }

    for (index, change) in case.changes.iter().enumerate() {
        validate_change(index, change, &bus_names, &line_names)?;
    }

    Ok(())
}

fn validate_bus(bus: &BusDef) -> Result<(), ValidationError> {
    let field = |what: &str| format!("buses.{}.{what}", bus.name);
    check_pair(field("voltage"), &bus.voltage)?;
    check_positive(field("voltage[0]"), bus.voltage[0])?;
    if let Some(shunt) = &bus.shunt {
        check_pair(field("shunt"), shunt)?;
    }
    match &bus.model {
        ModelDef::ConstantVoltage { v, .. } => check_positive(field("model.v"), *v),
        ModelDef::SynchronousGenerator {
            inertia,
            transient_reactance,
            frequency_hz,
            ..
        } => {
            check_positive(field("model.inertia"), *inertia)?;
            check_positive(field("model.transient_reactance"), *transient_reactance)?;
            check_positive(field("model.frequency_hz"), *frequency_hz)
        }
        ModelDef::Kuramoto { damping, .. } => check_positive(field("model.damping"), *damping),
        ModelDef::ConstantPower { .. } | ModelDef::Load { .. } | ModelDef::PassiveShunt => Ok(()),
    }
}

fn validate_line(
    index: usize,
    line: &LineDef,
    bus_names: &HashSet<&str>,
) -> Result<(), ValidationError> {
    let context = format!("lines[{index}]");
    for end in [&line.from, &line.to] {
        if !bus_names.contains(end.as_str()) {
            return Err(ValidationError::MissingReference {
                id: end.clone(),
                context: context.clone(),
            });
        }
    }
    if line.from == line.to {
        return Err(invalid(
            format!("{context}.to"),
            &line.to,
            "line must connect two different buses",
        ));
    }
    if line.impedance.is_none() && line.admittance.is_none() {
        return Err(invalid(
            context,
            "none",
            "line needs an impedance or an admittance",
        ));
    }
    if let Some(z) = &line.impedance {
        check_pair(format!("{context}.impedance"), z)?;
    }
    if let Some(y) = &line.admittance {
        check_pair(format!("{context}.admittance"), y)?;
    }
    Ok(())
}

fn validate_change(
    index: usize,
    change: &ChangeDef,
    bus_names: &HashSet<&str>,
    line_names: &HashSet<&str>,
) -> Result<(), ValidationError> {
    let context = format!("changes[{index}]");
    let (start, end) = change.window();
    if !(start.is_finite() && start >= 0.0) {
        return Err(invalid(format!("{context}.start_s"), start, "must be non-negative"));
    }
    if let Some(end) = end {
        if !(end > start) {
            return Err(invalid(format!("{context}.end_s"), end, "must be after start_s"));
        }
    }

    match change {
        ChangeDef::LineOutage { line, .. } => {
            if !line_names.contains(line.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: line.clone(),
                    context,
                });
            }
        }
        ChangeDef::BusFault { bus, shunt, .. } => {
            if !bus_names.contains(bus.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: bus.clone(),
                    context,
                });
            }
            check_pair(format!("{context}.shunt"), shunt)?;
        }
        ChangeDef::SetpointChange { bus, setpoint, .. } => {
            if !bus_names.contains(bus.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: bus.clone(),
                    context,
                });
            }
            if !setpoint.is_finite() {
                return Err(invalid(format!("{context}.setpoint"), setpoint, "must be finite"));
            }
        }
    }
    Ok(())
}
