//! WSCC 9-bus system with dynamic machines.

#![allow(dead_code)]

use ps_core::{Admittance, BusId, LineId, SeriesParameters, VoltagePolar};
use ps_models::{
    ConstantPower, InjectionModel, KuramotoOscillator, KuramotoParams, PassiveShunt,
    SynchronousGenerator, SynchronousGeneratorParams,
};
use ps_network::Network;

/// `(from, to, r, x, total charging)`, 1-based bus numbers.
const LINES: [(usize, usize, f64, f64, f64); 9] = [
    (1, 4, 0.0, 0.0576, 0.0),
    (4, 5, 0.010, 0.085, 0.176),
    (4, 6, 0.017, 0.092, 0.158),
    (5, 7, 0.032, 0.161, 0.306),
    (6, 9, 0.039, 0.170, 0.358),
    (7, 8, 0.0085, 0.072, 0.149),
    (8, 9, 0.0119, 0.1008, 0.209),
    (2, 7, 0.0, 0.0625, 0.0),
    (3, 9, 0.0, 0.0586, 0.0),
];

pub struct Wscc9 {
    pub net: Network,
    pub buses: Vec<BusId>,
    pub lines: Vec<LineId>,
}

pub fn machine(number: usize, p: f64, v: f64) -> Box<dyn InjectionModel> {
    let params = SynchronousGeneratorParams {
        inertia: [0.15, 0.05, 0.03][number - 1],
        damping: 0.02,
        transient_reactance: [0.0608, 0.1198, 0.1813][number - 1],
        ..SynchronousGeneratorParams::default()
    };
    Box::new(
        SynchronousGenerator::new(params, p)
            .unwrap()
            .with_terminal_voltage(v),
    )
}

pub fn oscillator(p: f64) -> Box<dyn InjectionModel> {
    Box::new(KuramotoOscillator::new(KuramotoParams { damping: 0.5 }, p).unwrap())
}

/// Buses 1-3 get `generator(number, p, v)`; bus 1 is slack.
pub fn wscc9_with(
    mut generator: impl FnMut(usize, f64, f64) -> Box<dyn InjectionModel>,
) -> Wscc9 {
    let mut net = Network::new();
    let gens = [(0.0, 1.04), (1.63, 1.025), (0.85, 1.025)];
    let loads = [(5, 1.25, 0.5), (6, 0.9, 0.3), (8, 1.0, 0.35)];

    let mut buses = Vec::with_capacity(9);
    for number in 1..=9 {
        let (voltage, model): (f64, Box<dyn InjectionModel>) = if number <= 3 {
            let (p, v) = gens[number - 1];
            (v, generator(number, p, v))
        } else if let Some(&(_, p, q)) = loads.iter().find(|l| l.0 == number) {
            (1.0, Box::new(ConstantPower::load(p, q)))
        } else {
            (1.0, Box::new(PassiveShunt))
        };
        buses.push(net.add_bus(
            format!("bus{number}"),
            VoltagePolar::new(voltage, 0.0),
            model,
        ));
    }

    let mut charging = [0.0; 9];
    let mut lines = Vec::with_capacity(LINES.len());
    for (from, to, r, x, b) in LINES {
        lines.push(
            net.connect_buses(
                buses[from - 1],
                buses[to - 1],
                SeriesParameters::from_impedance(r, x),
            )
            .unwrap(),
        );
        charging[from - 1] += b / 2.0;
        charging[to - 1] += b / 2.0;
    }
    for (id, b) in buses.iter().zip(charging) {
        if b != 0.0 {
            net.set_bus_shunt(*id, Admittance::new(0.0, b)).unwrap();
        }
    }
    net.set_slack_bus(buses[0]).unwrap();
    Wscc9 { net, buses, lines }
}

pub fn wscc9_machines() -> Wscc9 {
    wscc9_with(machine)
}

pub fn max_deviation(a: &nalgebra::DVector<f64>, b: &nalgebra::DVector<f64>) -> f64 {
    (a - b).amax()
}
