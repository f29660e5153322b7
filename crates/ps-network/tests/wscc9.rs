//! Power flow on the WSCC 9-bus system.

mod common;

use common::{WSCC9_SOLUTION, max_abs_diff, wscc9};
use nalgebra::DMatrix;
use ps_core::CommitMode;
use ps_network::{BusOrdering, PowerFlowConfig};
use ps_solver::central_difference_jacobian;

#[test]
fn converges_to_published_solution() {
    let (mut net, ids) = wscc9(BusOrdering::Insertion);
    let report = net.solve_power_flow(CommitMode::Replace).unwrap();
    assert!(report.iterations > 0 && report.iterations < 10);
    assert!(report.residual < 1e-8);

    for (id, (v_ref, theta_ref)) in ids.iter().zip(WSCC9_SOLUTION) {
        let v = net.bus(*id).unwrap().voltage();
        assert!(
            (v.magnitude - v_ref).abs() < 5e-4,
            "{id}: |V| {} vs {v_ref}",
            v.magnitude
        );
        assert!(
            (v.angle - theta_ref.to_radians()).abs() < 1e-3,
            "{id}: θ {} vs {}",
            v.angle.to_degrees(),
            theta_ref
        );
    }
}

#[test]
fn slack_generation_matches_published_dispatch() {
    let (mut net, ids) = wscc9(BusOrdering::Insertion);
    net.solve_power_flow(CommitMode::Replace).unwrap();
    let s1 = net.network_injection(ids[0]).unwrap();
    assert!((s1.re - 0.716).abs() < 5e-3, "P1 = {}", s1.re);
    assert!((s1.im - 0.270).abs() < 5e-3, "Q1 = {}", s1.im);
}

#[test]
fn ordering_does_not_change_the_solution() {
    let (mut a, ids) = wscc9(BusOrdering::Insertion);
    let (mut b, _) = wscc9(BusOrdering::Optimal);
    a.solve_power_flow(CommitMode::Replace).unwrap();
    b.solve_power_flow(CommitMode::Replace).unwrap();

    for id in &ids {
        let va = a.bus(*id).unwrap().voltage();
        let vb = b.bus(*id).unwrap().voltage();
        assert!((va.magnitude - vb.magnitude).abs() < 1e-9);
        assert!((va.angle - vb.angle).abs() < 1e-9);
    }
}

#[test]
fn replace_mode_resolve_is_idempotent() {
    let (mut net, ids) = wscc9(BusOrdering::Insertion);
    net.solve_power_flow(CommitMode::Replace).unwrap();
    let first = net.voltages();

    let again = net.solve_power_flow(CommitMode::Replace).unwrap();
    assert_eq!(again.iterations, 0);
    assert_eq!(net.voltages(), first);
    for id in &ids {
        assert_eq!(net.bus(*id).unwrap().voltage_history().len(), 1);
    }
}

#[test]
fn append_mode_adds_a_step() {
    let (mut net, ids) = wscc9(BusOrdering::Insertion);
    net.solve_power_flow(CommitMode::Append).unwrap();
    let bus = net.bus(ids[4]).unwrap();
    assert_eq!(bus.voltage_history().len(), 2);
    assert_eq!(bus.voltage_history()[0].magnitude, 1.0);
    assert_eq!(net.lines()[0].flow_history().len(), 1);
}

#[test]
fn analytic_jacobian_matches_finite_differences() {
    let (mut net, _) = wscc9(BusOrdering::Optimal);
    net.solve_power_flow(CommitMode::Replace).unwrap();

    let mut x = net.power_flow_state().unwrap();
    // Move away from the solution so no term vanishes by accident.
    for (i, xi) in x.iter_mut().enumerate() {
        *xi += 0.01 * ((i % 3) as f64 - 1.0);
    }

    let analytic: DMatrix<f64> = DMatrix::from(&net.jacobian_at(&x).unwrap());
    let numeric = central_difference_jacobian(&x, |x| net.mismatch_at(x), 1e-6).unwrap();
    assert_eq!(analytic.shape(), (14, 14));
    assert!(max_abs_diff(&analytic, &numeric) < 1e-5);
}

#[test]
fn parallel_assembly_matches_serial() {
    let (mut serial, _) = wscc9(BusOrdering::Insertion);
    let (mut parallel, _) = wscc9(BusOrdering::Insertion);
    parallel.set_config(PowerFlowConfig {
        parallel_jacobian: true,
        ..PowerFlowConfig::default()
    });

    let x = serial.power_flow_state().unwrap();
    let a: DMatrix<f64> = DMatrix::from(&serial.jacobian_at(&x).unwrap());
    let b: DMatrix<f64> = DMatrix::from(&parallel.jacobian_at(&x).unwrap());
    assert_eq!(a, b);

    parallel.solve_power_flow(CommitMode::Replace).unwrap();
    serial.solve_power_flow(CommitMode::Replace).unwrap();
    assert_eq!(parallel.voltages(), serial.voltages());
}

#[test]
fn line_losses_balance_injections() {
    let (mut net, ids) = wscc9(BusOrdering::Insertion);
    net.solve_power_flow(CommitMode::Replace).unwrap();

    let total_injection: f64 = ids
        .iter()
        .map(|id| net.network_injection(*id).unwrap().re)
        .sum();
    let total_losses: f64 = net
        .lines()
        .iter()
        .map(|l| l.flow().unwrap().losses().re)
        .sum();
    // Shunts are purely capacitive, so all active losses are series losses.
    assert!((total_injection - total_losses).abs() < 1e-9);
    assert!(total_losses > 0.0);
}
