//! Run results exported from a simulated network.

use ps_core::VoltagePolar;
use ps_network::Network;
use serde::{Deserialize, Serialize};

use crate::CaseResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunResults {
    pub case: String,
    /// Step times (s). Empty for a power-flow-only run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time_s: Vec<f64>,
    pub buses: Vec<BusTrace>,
    pub lines: Vec<LineTrace>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<StateTrace>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusTrace {
    pub name: String,
    pub voltage: Vec<VoltagePolar>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineTrace {
    pub from: String,
    pub to: String,
    pub flows: Vec<FlowSnapshot>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FlowSnapshot {
    pub p_from: f64,
    pub q_from: f64,
    pub p_to: f64,
    pub q_to: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateTrace {
    pub bus: String,
    pub state: String,
    pub values: Vec<f64>,
}

impl RunResults {
    /// Collect the committed histories of `net`.
    ///
    /// With `dt` the step times are filled in from the voltage history length.
    pub fn from_network(case: &str, net: &Network, dt: Option<f64>) -> CaseResult<Self> {
        let bus_name = |id| net.bus(id).map(|b| b.name().to_string());

        let buses: Vec<BusTrace> = net
            .buses()
            .iter()
            .map(|b| BusTrace {
                name: b.name().to_string(),
                voltage: b.voltage_history().to_vec(),
            })
            .collect();

        let mut lines = Vec::with_capacity(net.lines().len());
        for line in net.lines() {
            let (a, b) = line.incident_buses()?;
            lines.push(LineTrace {
                from: bus_name(a)?,
                to: bus_name(b)?,
                flows: line
                    .flow_history()
                    .iter()
                    .map(|f| FlowSnapshot {
                        p_from: f.p_ab,
                        q_from: f.q_ab,
                        p_to: f.p_ba,
                        q_to: f.q_ba,
                    })
                    .collect(),
            });
        }

        let mut states = Vec::new();
        for bus in net.buses() {
            let Some(d) = bus.model().as_dynamic() else {
                continue;
            };
            for (i, name) in d.state_names().iter().enumerate() {
                states.push(StateTrace {
                    bus: bus.name().to_string(),
                    state: (*name).to_string(),
                    values: d.state_history().iter().map(|s| s[i]).collect(),
                });
            }
        }

        let steps = buses.first().map_or(0, |b| b.voltage.len());
        let time_s = match dt {
            Some(dt) => (0..steps).map(|k| k as f64 * dt).collect(),
            None => Vec::new(),
        };

        Ok(Self {
            case: case.to_string(),
            time_s,
            buses,
            lines,
            states,
        })
    }
}

pub fn save_results_json(path: &std::path::Path, results: &RunResults) -> CaseResult<()> {
    let content = serde_json::to_string_pretty(results)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_results_json(path: &std::path::Path) -> CaseResult<RunResults> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
