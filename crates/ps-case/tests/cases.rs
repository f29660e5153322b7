use std::path::{Path, PathBuf};

use ps_case::*;
use ps_core::CommitMode;

fn case_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../cases")
        .join(name)
}

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("ps_case_{}_{name}", std::process::id()))
}

/// Published WSCC 9-bus solution, `(|V|, θ in degrees)`.
const WSCC9_SOLUTION: [(f64, f64); 9] = [
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

#[test]
fn bundled_cases_load_and_validate() {
    for name in ["wscc9.yaml", "wscc9_dynamic.yaml"] {
        let case = load_yaml(&case_path(name))
            .unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        validate_case(&case).unwrap();
    }
    load_json(&case_path("three_bus.json")).unwrap();
}

#[test]
fn wscc9_case_reproduces_published_solution() {
    let case = load_yaml(&case_path("wscc9.yaml")).unwrap();
    let mut net = build_network(&case).unwrap();
    assert_eq!(net.buses().len(), 9);
    assert_eq!(net.lines().len(), 9);

    // MW converted on the 100 MVA base.
    let bus2 = net.bus_by_name("bus2").unwrap();
    assert!((bus2.model().power_setpoint().unwrap() - 1.63).abs() < 1e-12);
    // Charging halves of lines 4-5 and 4-6.
    let bus4 = net.bus_by_name("bus4").unwrap();
    assert!((bus4.shunt().susceptance - (0.176 + 0.158) / 2.0).abs() < 1e-12);

    net.solve_power_flow(CommitMode::Replace).unwrap();
    for (bus, (v, deg)) in net.buses().iter().zip(WSCC9_SOLUTION) {
        let actual = bus.voltage();
        assert!((actual.magnitude - v).abs() < 5e-4, "{}", bus.name());
        assert!((actual.angle - deg.to_radians()).abs() < 1e-3, "{}", bus.name());
    }
}

#[test]
fn three_bus_json_balances_power() {
    let case = load_json(&case_path("three_bus.json")).unwrap();
    assert_eq!(case.power_flow.tolerance, 1e-10);
    assert_eq!(case.power_flow.max_iterations, 500);

    let mut net = build_network(&case).unwrap();
    net.solve_power_flow(CommitMode::Replace).unwrap();

    let ids: Vec<_> = net.buses().iter().map(|b| b.id()).collect();
    let mut total = 0.0;
    for id in ids {
        total += net.network_injection(id).unwrap().re;
    }
    let losses: f64 = net
        .lines()
        .iter()
        .map(|l| l.flow().unwrap().losses().re)
        .sum();
    assert!(losses > 0.0);
    assert!((total - losses).abs() < 1e-8);
}

#[test]
fn physical_units_scale_shunts_but_not_charging() {
    let mut case = load_json(&case_path("three_bus.json")).unwrap();
    case.units = UnitsDef::Physical;
    case.base_mva = 100.0;
    case.buses[2].shunt = Some(vec![1.0, 2.0]);
    case.lines[0].charging = Some(0.1);
    case.changes.push(ChangeDef::BusFault {
        bus: "c".to_string(),
        shunt: vec![0.0, 50.0],
        start_s: 0.0,
        end_s: None,
    });

    let mut net = build_network(&case).unwrap();
    let shunt = |net: &ps_network::Network, name: &str| net.bus_by_name(name).unwrap().shunt();
    assert!((shunt(&net, "c").conductance - 0.01).abs() < 1e-12);
    assert!((shunt(&net, "c").susceptance - 0.02).abs() < 1e-12);
    assert!((shunt(&net, "a").susceptance - 0.05).abs() < 1e-12);
    assert!((shunt(&net, "b").susceptance - 0.05).abs() < 1e-12);

    let mut schedule = build_changes(&case, &net).unwrap();
    schedule.poll(0.0, &mut net).unwrap();
    assert!((shunt(&net, "c").susceptance - 0.52).abs() < 1e-12);
}

#[test]
fn roundtrip_yaml_and_json() {
    let case = load_yaml(&case_path("wscc9_dynamic.yaml")).unwrap();
    let yaml = scratch_path("roundtrip.yaml");
    save_yaml(&yaml, &case).unwrap();
    assert_eq!(load_yaml(&yaml).unwrap(), case);

    let json = scratch_path("roundtrip.json");
    save_json(&json, &case).unwrap();
    assert_eq!(load_json(&json).unwrap(), case);
}

#[test]
fn dynamic_case_runs_with_its_changes() {
    let case = load_yaml(&case_path("wscc9_dynamic.yaml")).unwrap();
    let mut net = build_network(&case).unwrap();
    let mut schedule = build_changes(&case, &net).unwrap();
    assert_eq!(schedule.len(), 2);

    let opts = sim_options(&case);
    assert_eq!(opts.dt, 0.01);
    assert_eq!(opts.record_every, 10);

    let record = ps_sim::run_simulation(&mut net, &mut schedule, &opts).unwrap();
    assert_eq!(record.t.len(), 4);
    assert_eq!(schedule.active_count(), 1);
    assert!(net.lines().iter().all(|l| l.in_service()));

    let bus2 = net.bus_by_name("bus2").unwrap();
    assert_eq!(bus2.model().power_setpoint(), Some(1.7));

    let results = RunResults::from_network(&case.name, &net, Some(opts.dt)).unwrap();
    assert_eq!(results.time_s.len(), 31);
    assert_eq!(results.buses[0].voltage.len(), 31);
    assert_eq!(results.states.len(), 9);
    assert_eq!(results.states[5].state, "mechanical_power");
    assert_eq!(results.lines[3].from, "bus5");

    let path = scratch_path("dynamic_results.json");
    save_results_json(&path, &results).unwrap();
    let loaded = load_results_json(&path).unwrap();
    assert_eq!(loaded.case, results.case);
    assert_eq!(loaded.states.len(), results.states.len());
    let (a, b) = (&loaded.buses[4].voltage, &results.buses[4].voltage);
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert!((x.magnitude - y.magnitude).abs() < 1e-12);
        assert!((x.angle - y.angle).abs() < 1e-12);
    }
}

mod invalid {
    use super::*;

    fn base() -> Case {
        load_json(&case_path("three_bus.json")).unwrap()
    }

    #[test]
    fn duplicate_bus_name() {
        let mut case = base();
        case.buses[1].name = "a".to_string();
        assert!(matches!(
            validate_case(&case),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn unknown_line_end() {
        let mut case = base();
        case.lines[0].to = "z".to_string();
        assert_eq!(
            validate_case(&case),
            Err(ValidationError::MissingReference {
                id: "z".to_string(),
                context: "lines[0]".to_string(),
            })
        );
    }

    #[test]
    fn missing_slack() {
        let mut case = base();
        case.slack = None;
        assert_eq!(validate_case(&case), Err(ValidationError::MissingSlack));
        assert!(matches!(
            build_network(&case),
            Err(CaseError::Validation(ValidationError::MissingSlack))
        ));
    }

    #[test]
    fn wrong_voltage_arity() {
        let mut case = base();
        case.buses[0].voltage = vec![1.0];
        assert!(matches!(
            validate_case(&case),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn line_without_parameters() {
        let mut case = base();
        case.lines[2].admittance = None;
        assert!(matches!(
            validate_case(&case),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn change_on_unknown_line() {
        let mut case = base();
        case.changes.push(ChangeDef::LineOutage {
            line: "zz".to_string(),
            start_s: 0.0,
            end_s: None,
        });
        assert!(matches!(
            validate_case(&case),
            Err(ValidationError::MissingReference { .. })
        ));
    }

    #[test]
    fn change_ending_before_start() {
        let mut case = base();
        case.changes.push(ChangeDef::SetpointChange {
            bus: "b".to_string(),
            setpoint: 0.5,
            start_s: 1.0,
            end_s: Some(0.5),
        });
        assert!(matches!(
            validate_case(&case),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn future_version() {
        let mut case = base();
        case.version = LATEST_VERSION + 1;
        assert_eq!(
            validate_case(&case),
            Err(ValidationError::UnsupportedVersion {
                version: LATEST_VERSION + 1
            })
        );
    }

    #[test]
    fn malformed_yaml_is_reported() {
        let path = scratch_path("malformed.yaml");
        std::fs::write(&path, "version: [\nname").unwrap();
        assert!(matches!(load_yaml(&path), Err(CaseError::Yaml(_))));
    }
}
