//! Shared test networks.

#![allow(dead_code)]

use ps_core::{Admittance, BusId, SeriesParameters, VoltagePolar};
use ps_models::{ConstantPower, ConstantVoltage, InjectionModel, PassiveShunt};
use ps_network::{BusOrdering, Network};

/// WSCC 3-machine 9-bus system on a 100 MVA base.
/// Lines as `(from, to, r, x, total charging)`, 1-based bus numbers.
pub const WSCC9_LINES: [(usize, usize, f64, f64, f64); 9] = [
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

/// Published solution, `(|V|, θ in degrees)` for buses 1..=9.
pub const WSCC9_SOLUTION: [(f64, f64); 9] = [
    (1.040, 0.0),
    (1.025, 9.2800),
    (1.025, 4.6648),
    (1.0258, -2.2168),
    (0.9956, -3.9888),
    (1.0127, -3.6874),
    (1.0258, 3.7197),
    (1.0159, 0.7275),
    (1.0324, 1.9667),
];

/// Injection models for buses 1..=9, with `generator` supplying buses 1-3
/// given `(p, v)`.
pub fn wscc9_with(
    ordering: BusOrdering,
    mut generator: impl FnMut(usize, f64, f64) -> Box<dyn InjectionModel>,
) -> (Network, Vec<BusId>) {
    let mut net = Network::new();
    net.set_ordering(ordering);

    let gens = [(0.0, 1.04), (1.63, 1.025), (0.85, 1.025)];
    let loads = [(5, 1.25, 0.5), (6, 0.9, 0.3), (8, 1.0, 0.35)];

    let mut ids = Vec::with_capacity(9);
    for number in 1..=9 {
        let (voltage, model): (f64, Box<dyn InjectionModel>) = if number <= 3 {
            let (p, v) = gens[number - 1];
            (v, generator(number, p, v))
        } else if let Some(&(_, p, q)) = loads.iter().find(|l| l.0 == number) {
            (1.0, Box::new(ConstantPower::load(p, q)))
        } else {
            (1.0, Box::new(PassiveShunt))
        };
        ids.push(net.add_bus(
            format!("bus{number}"),
            VoltagePolar::new(voltage, 0.0),
            model,
        ));
    }

    let mut charging = [0.0; 9];
    for (from, to, r, x, b) in WSCC9_LINES {
        net.connect_buses(
            ids[from - 1],
            ids[to - 1],
            SeriesParameters::from_impedance(r, x),
        )
        .unwrap();
        charging[from - 1] += b / 2.0;
        charging[to - 1] += b / 2.0;
    }
    for (id, b) in ids.iter().zip(charging) {
        if b != 0.0 {
            net.set_bus_shunt(*id, Admittance::new(0.0, b)).unwrap();
        }
    }
    net.set_slack_bus(ids[0]).unwrap();
    (net, ids)
}

/// Static WSCC 9-bus: PV generators, constant-power loads.
pub fn wscc9(ordering: BusOrdering) -> (Network, Vec<BusId>) {
    wscc9_with(ordering, |_, p, v| {
        Box::new(ConstantVoltage::new(p, v).unwrap())
    })
}

/// Largest absolute entrywise difference.
pub fn max_abs_diff(a: &nalgebra::DMatrix<f64>, b: &nalgebra::DMatrix<f64>) -> f64 {
    (a - b).amax()
}
