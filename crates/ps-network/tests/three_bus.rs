//! Small ring networks: power balance and configuration errors.

use ps_core::{CommitMode, SeriesParameters, VoltagePolar};
use ps_models::{ConstantPower, ConstantVoltage, PassiveShunt};
use ps_network::{BusClass, Network, NetworkError};

fn ring() -> (Network, [ps_core::BusId; 3]) {
    let mut net = Network::new();
    let slack = net.add_bus(
        "slack",
        VoltagePolar::new(1.0, 0.0),
        Box::new(ConstantVoltage::new(0.0, 1.0).unwrap()),
    );
    let pv = net.add_bus(
        "pv",
        VoltagePolar::new(1.01, 0.0),
        Box::new(ConstantVoltage::new(0.4, 1.01).unwrap()),
    );
    let load = net.add_bus(
        "load",
        VoltagePolar::FLAT,
        Box::new(ConstantPower::load(0.9, 0.3)),
    );
    for (a, b) in [(slack, pv), (pv, load), (load, slack)] {
        net.connect_buses(a, b, SeriesParameters::from_impedance(0.02, 0.1))
            .unwrap();
    }
    net.set_slack_bus(slack).unwrap();
    (net, [slack, pv, load])
}

#[test]
fn ring_balances_power() {
    let (mut net, [slack, pv, load]) = ring();
    net.solve_power_flow(CommitMode::Replace).unwrap();

    let s_slack = net.network_injection(slack).unwrap();
    let s_pv = net.network_injection(pv).unwrap();
    let s_load = net.network_injection(load).unwrap();

    // Specified injections are met.
    assert!((s_pv.re - 0.4).abs() < 1e-8);
    assert!((s_load.re + 0.9).abs() < 1e-8);
    assert!((s_load.im + 0.3).abs() < 1e-8);
    assert!((net.bus(pv).unwrap().voltage().magnitude - 1.01).abs() < 1e-15);

    // Generation covers load plus series losses.
    let losses: f64 = net
        .lines()
        .iter()
        .map(|l| l.flow().unwrap().losses().re)
        .sum();
    assert!(losses > 0.0);
    assert!((s_slack.re + s_pv.re + s_load.re - losses).abs() < 1e-9);
    assert!((s_slack.re - (0.9 - 0.4 + losses)).abs() < 1e-9);
}

#[test]
fn each_line_end_sees_consistent_flow() {
    let (mut net, [_, _, load]) = ring();
    net.solve_power_flow(CommitMode::Replace).unwrap();

    // Power into the load bus equals the sum of flows arriving there.
    let mut arriving = 0.0;
    for line in net.lines() {
        let (a, b) = line.incident_buses().unwrap();
        let flow = line.flow().unwrap();
        if a == load {
            arriving += flow.p_ab;
        } else if b == load {
            arriving += flow.p_ba;
        }
    }
    assert!((arriving - net.network_injection(load).unwrap().re).abs() < 1e-9);
}

#[test]
fn missing_slack_bus_is_a_configuration_error() {
    let (mut net, _) = ring();
    net.clear_slack_bus();
    assert_eq!(
        net.solve_power_flow(CommitMode::Replace),
        Err(NetworkError::MissingSlackBus)
    );
}

#[test]
fn radial_passive_bus_floats_at_slack_voltage() {
    let (mut net, [slack, ..]) = ring();
    let island = net.add_bus("island", VoltagePolar::FLAT, Box::new(PassiveShunt));
    net.connect_buses(slack, island, SeriesParameters::from_impedance(0.0, 0.2))
        .unwrap();
    assert_eq!(net.bus_class(island).unwrap(), BusClass::Pq);
    net.solve_power_flow(CommitMode::Replace).unwrap();
    // No load: the radial bus floats at the slack voltage.
    let v = net.bus(island).unwrap().voltage();
    assert!((v.magnitude - 1.0).abs() < 1e-9);
    assert!(v.angle.abs() < 1e-9);
}

#[test]
fn outage_changes_the_solution() {
    let (mut net, [_, _, load]) = ring();
    net.solve_power_flow(CommitMode::Replace).unwrap();
    let before = net.bus(load).unwrap().voltage();

    let line = net.lines()[2].id();
    net.set_line_in_service(line, false).unwrap();
    net.solve_power_flow(CommitMode::Append).unwrap();
    let after = net.bus(load).unwrap().voltage();

    assert!(after.magnitude < before.magnitude);
    assert_eq!(net.lines()[2].flow().unwrap().p_ab, 0.0);
}
