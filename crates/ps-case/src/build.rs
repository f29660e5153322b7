//! Turn a validated [`Case`] into a [`Network`], its scheduled changes and
//! simulation options.

use ps_core::{Admittance, Impedance, SeriesParameters, VoltagePolar};
use ps_models::{
    ConstantPower, ConstantVoltage, InjectionModel, KuramotoOscillator, KuramotoParams,
    ModelResult, PassiveShunt, SynchronousGenerator, SynchronousGeneratorParams,
};
use ps_network::{BusOrdering, Network, NetworkError, PowerFlowConfig};
use ps_sim::{
    BusFault, IntegratorType, LineOutage, PerturbationSchedule, SetpointChange, SimOptions,
};
use ps_solver::NewtonConfig;
use tracing::debug;

use crate::schema::{Case, ChangeDef, IntegratorDef, ModelDef, OrderingDef, UnitsDef};
use crate::validate::validate_case;
use crate::{CaseError, CaseResult};

impl Case {
    /// Factor converting powers in the file to per unit.
    pub fn power_scale(&self) -> f64 {
        match self.units {
            UnitsDef::PerUnit => 1.0,
            UnitsDef::Physical => 1.0 / self.base_mva,
        }
    }
}

fn build_model(model: &ModelDef, scale: f64) -> ModelResult<Box<dyn InjectionModel>> {
    Ok(match *model {
        ModelDef::ConstantPower { p, q } => Box::new(ConstantPower::new(p * scale, q * scale)),
        ModelDef::Load { p, q } => Box::new(ConstantPower::load(p * scale, q * scale)),
        ModelDef::ConstantVoltage { p, v } => Box::new(ConstantVoltage::new(p * scale, v)?),
        ModelDef::PassiveShunt => Box::new(PassiveShunt),
        ModelDef::SynchronousGenerator {
            p,
            inertia,
            damping,
            transient_reactance,
            governor_time_constant,
            droop,
            frequency_hz,
        } => {
            let params = SynchronousGeneratorParams {
                inertia,
                damping,
                transient_reactance,
                governor_time_constant,
                droop,
                nominal_angular_speed: 2.0 * std::f64::consts::PI * frequency_hz,
            };
            Box::new(SynchronousGenerator::new(params, p * scale)?)
        }
        ModelDef::Kuramoto { p, damping } => Box::new(KuramotoOscillator::new(
            KuramotoParams { damping },
            p * scale,
        )?),
    })
}

fn pair(values: &[f64]) -> CaseResult<(f64, f64)> {
    let y = Admittance::try_from(values)?;
    Ok((y.conductance, y.susceptance))
}

fn power_flow_config(case: &Case) -> PowerFlowConfig {
    let pf = &case.power_flow;
    PowerFlowConfig {
        newton: NewtonConfig {
            tolerance: pf.tolerance,
            max_iterations: pf.max_iterations,
            conditioning_check_after: pf.conditioning_check_after,
            max_condition_number: pf.max_condition_number,
        },
        parallel_jacobian: pf.parallel_jacobian,
    }
}

/// Build the network described by `case`.
///
/// Buses and lines are added in file order. Line charging is split evenly
/// into the shunts of the two end buses.
pub fn build_network(case: &Case) -> CaseResult<Network> {
    validate_case(case)?;
    let scale = case.power_scale();

    let mut net = Network::with_config(power_flow_config(case));
    net.set_ordering(match case.ordering {
        OrderingDef::Insertion => BusOrdering::Insertion,
        OrderingDef::Optimal => BusOrdering::Optimal,
    });

    let mut shunts = Vec::with_capacity(case.buses.len());
    for bus in &case.buses {
        let model = build_model(&bus.model, scale).map_err(|source| CaseError::Model {
            bus: bus.name.clone(),
            source,
        })?;
        let voltage = VoltagePolar::try_from(bus.voltage.as_slice())?;
        let id = net.add_bus(
            bus.name.as_str(),
            VoltagePolar::from_degrees(voltage.magnitude, voltage.angle),
            model,
        );
        let shunt = match &bus.shunt {
            Some(values) => {
                let (g, b) = pair(values)?;
                Admittance::new(g * scale, b * scale)
            }
            None => Admittance::ZERO,
        };
        shunts.push((id, shunt));
    }

    let index_of = |name: &str| {
        case.buses
            .iter()
            .position(|b| b.name == name)
            .ok_or_else(|| NetworkError::InvalidTopology {
                what: "line refers to an unknown bus",
            })
    };
    for line in &case.lines {
        let (from, to) = (index_of(&line.from)?, index_of(&line.to)?);
        let params = SeriesParameters {
            impedance: line
                .impedance
                .as_deref()
                .map(Impedance::try_from)
                .transpose()?,
            admittance: line
                .admittance
                .as_deref()
                .map(Admittance::try_from)
                .transpose()?,
        };
        net.connect_buses(shunts[from].0, shunts[to].0, params)?;
        if let Some(charging) = line.charging {
            shunts[from].1.susceptance += charging / 2.0;
            shunts[to].1.susceptance += charging / 2.0;
        }
    }

    for (id, shunt) in shunts {
        if shunt != Admittance::ZERO {
            net.set_bus_shunt(id, shunt)?;
        }
    }

    if let Some(slack) = &case.slack {
        net.set_slack_bus(bus_id(&net, slack)?)?;
    }
    if let Some(reference) = &case.angle_reference {
        net.set_angle_reference_bus(bus_id(&net, reference)?)?;
    }

    debug!(
        case = %case.name,
        buses = net.buses().len(),
        lines = net.lines().len(),
        "network built"
    );
    Ok(net)
}

fn bus_id(net: &Network, name: &str) -> CaseResult<ps_core::BusId> {
    net.bus_by_name(name)
        .map(|b| b.id())
        .ok_or_else(|| {
            crate::ValidationError::MissingReference {
                id: name.to_string(),
                context: "network".to_string(),
            }
            .into()
        })
}

/// Scheduled changes of `case`, resolved against a network from [`build_network`].
pub fn build_changes(case: &Case, net: &Network) -> CaseResult<PerturbationSchedule> {
    let scale = case.power_scale();
    let mut schedule = PerturbationSchedule::new();
    for change in &case.changes {
        match change {
            ChangeDef::LineOutage {
                line,
                start_s,
                end_s,
            } => {
                let target = case
                    .lines
                    .iter()
                    .position(|l| l.name.as_deref() == Some(line.as_str()))
                    .and_then(|i| net.lines().get(i))
                    .ok_or_else(|| crate::ValidationError::MissingReference {
                        id: line.clone(),
                        context: "network".to_string(),
                    })?;
                schedule.push(LineOutage {
                    line: target.id(),
                    start: *start_s,
                    end: *end_s,
                });
            }
            ChangeDef::BusFault {
                bus,
                shunt,
                start_s,
                end_s,
            } => {
                let (g, b) = pair(shunt)?;
                schedule.push(BusFault::new(
                    bus_id(net, bus)?,
                    Admittance::new(g * scale, b * scale),
                    *start_s,
                    *end_s,
                ));
            }
            ChangeDef::SetpointChange {
                bus,
                setpoint,
                start_s,
                end_s,
            } => {
                schedule.push(SetpointChange::new(
                    bus_id(net, bus)?,
                    setpoint * scale,
                    *start_s,
                    *end_s,
                ));
            }
        }
    }
    Ok(schedule)
}

/// Simulation options of `case`, or the defaults when it has none.
pub fn sim_options(case: &Case) -> SimOptions {
    let Some(sim) = &case.simulation else {
        return SimOptions::default();
    };
    SimOptions {
        dt: sim.dt_s,
        t_end: sim.t_end_s,
        max_steps: sim.max_steps,
        record_every: sim.record_every,
        integrator: match sim.integrator {
            IntegratorDef::Rk4 => IntegratorType::Rk4,
            IntegratorDef::LegacyRk4 => IntegratorType::LegacyRk4,
            IntegratorDef::ForwardEuler => IntegratorType::ForwardEuler,
        },
    }
}
