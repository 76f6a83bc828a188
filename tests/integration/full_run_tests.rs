//! Full run integration tests.
//!
//! Complete runs through the library API against simulated hardware:
//! selection, binding, fault isolation, ordering and roll-ups.

use crate::mocks::*;
use board_doc::cli::output::{CsvFormatter, JsonFormatter, JunitFormatter, OutputFormatter};
use board_doc::engine::orchestrator::{PlanEntry, BIND_OPERATION, LOAD_OPERATION};
use board_doc::{exit_status, list_groups, plan_checks, run_checks, BoardDocError, Outcome, RunConfig};

fn config_for(path: std::path::PathBuf, group: Option<&str>) -> RunConfig {
    RunConfig {
        group: group.map(str::to_string),
        ..RunConfig::new(path)
    }
}

#[test]
fn test_single_i2c_instance_passes() {
    let workspace = Workspace::new();
    let path = workspace.config("base:\n  i2c:\n    - {bus: 1, addresses: [0x3c]}\n");
    let board = SimulatedBoard::new().with_i2c_device(1, 0x3c).build();

    let report = run_checks(&RunConfig::new(path), board.hardware()).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].modules.len(), 1);
    let suite = &report.groups[0].modules[0];
    assert_eq!(suite.name, "i2c");
    assert_eq!(suite.cases.len(), 1);
    assert_eq!(suite.cases[0].outcome.status(), "passed");
    assert_eq!(exit_status(&report), 0);
}

#[test]
fn test_reference_board_all_pass() {
    let workspace = Workspace::new();
    let path = workspace.config(REFERENCE_CONFIG);
    let board = reference_board();

    let report = run_checks(&RunConfig::new(path), board.hardware()).unwrap();
    let summary = report.summary();

    // 1 i2c + 2 gpio + 3 camera operations
    assert_eq!(summary.total, 6);
    assert_eq!(summary.passed, 6);
    assert!(summary.all_passed());
    assert_eq!(board.gpio.writes(), vec![(20, true), (21, false)]);
}

#[test]
fn test_case_count_is_instances_times_operations() {
    let workspace = Workspace::new();
    let path = workspace.config(concat!(
        "base:\n",
        "  gpio:\n",
        "    - {number: 1, value: 1}\n",
        "    - {number: 2, value: 1}\n",
        "    - {number: 3, value: 1}\n",
        "  camera:\n",
        "    - {device: /dev/video0, camera_name: USB Camera, driver_name: uvcvideo}\n",
        "    - {device: /dev/video1, camera_name: CSI, driver_name: unicam}\n",
    ));
    let board = reference_board();

    let report = run_checks(&RunConfig::new(path), board.hardware()).unwrap();
    let modules = &report.groups[0].modules;

    assert_eq!(modules[0].cases.len(), 3);
    assert_eq!(modules[1].cases.len(), 6);
    // /dev/video1 is absent: exists fails, name and driver cannot be read
    let camera = modules[1].summary();
    assert_eq!((camera.passed, camera.failed, camera.errored), (3, 1, 2));
}

#[test]
fn test_group_selection_runs_only_that_group() {
    let workspace = Workspace::new();
    let path = workspace.config(REFERENCE_CONFIG);
    let board = reference_board();

    let report = run_checks(&config_for(path, Some("additional")), board.hardware()).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].name, "additional");
    assert_eq!(report.summary().total, 3);
    assert_eq!(board.i2c.detect_count(), 0);
    assert!(board.gpio.writes().is_empty());
}

#[test]
fn test_unknown_group_touches_no_hardware() {
    let workspace = Workspace::new();
    let path = workspace.config(REFERENCE_CONFIG);
    let board = reference_board();

    let err = run_checks(&config_for(path, Some("nonexistent")), board.hardware()).unwrap_err();

    assert!(matches!(err, BoardDocError::UnknownGroup(ref g) if g == "nonexistent"));
    assert!(err.is_fatal());
    assert_eq!(board.access_count(), 0);
}

#[test]
fn test_unparseable_description_touches_no_hardware() {
    let workspace = Workspace::new();
    let path = workspace.config("base:\n  i2c: [unterminated\n");
    let board = reference_board();

    let err = run_checks(&RunConfig::new(path), board.hardware()).unwrap_err();

    assert!(matches!(err, BoardDocError::ConfigParse { .. }));
    assert_eq!(board.access_count(), 0);
}

#[test]
fn test_missing_parameter_isolated() {
    let workspace = Workspace::new();
    let path = workspace.config(concat!(
        "base:\n",
        "  gpio:\n",
        "    - {number: 20, value: 1}\n",
        "    - {number: 21}\n",
        "    - {number: 22, value: 1}\n",
    ));
    let board = reference_board();

    let report = run_checks(&RunConfig::new(path), board.hardware()).unwrap();
    let cases = &report.groups[0].modules[0].cases;

    assert_eq!(cases.len(), 3);
    assert_eq!(cases[1].operation, BIND_OPERATION);
    assert_eq!(
        cases[1].outcome,
        Outcome::errored("Module 'gpio' requires parameter 'value'")
    );
    assert!(cases[0].outcome.is_passed());
    assert!(cases[2].outcome.is_passed());
    assert_eq!(board.gpio.writes(), vec![(20, true), (22, true)]);
    assert_eq!(exit_status(&report), 1);
}

#[test]
fn test_unknown_module_isolated() {
    let workspace = Workspace::new();
    let path = workspace.config(concat!(
        "base:\n",
        "  thermometer:\n",
        "    - {zone: 0}\n",
        "  i2c:\n",
        "    - {bus: 1, addresses: [0x3c]}\n",
    ));
    let board = reference_board();

    let report = run_checks(&RunConfig::new(path), board.hardware()).unwrap();
    let modules = &report.groups[0].modules;

    assert_eq!(modules[0].name, "thermometer");
    assert_eq!(modules[0].cases[0].operation, LOAD_OPERATION);
    assert!(modules[0].cases[0].outcome.message().contains("Unknown module"));
    assert!(modules[1].cases[0].outcome.is_passed());
}

#[test]
fn test_failed_and_errored_stay_distinct() {
    let workspace = Workspace::new();
    let path = workspace.config(concat!(
        "base:\n",
        "  i2c:\n",
        "    - {bus: 2, addresses: [0x68]}\n",
        "    - {bus: 7, addresses: [0x68]}\n",
    ));
    let board = reference_board();

    let report = run_checks(&RunConfig::new(path), board.hardware()).unwrap();
    let cases = &report.groups[0].modules[0].cases;

    assert!(matches!(cases[0].outcome, Outcome::Failed { .. }));
    assert!(matches!(cases[1].outcome, Outcome::Errored { .. }));
    let summary = report.summary();
    assert_eq!((summary.failed, summary.errored), (1, 1));
}

#[test]
fn test_stuck_gpio_fails() {
    let workspace = Workspace::new();
    let path = workspace.config("base:\n  gpio:\n    - {number: 5, value: 1}\n");
    let board = SimulatedBoard::new().with_stuck_gpio(5).build();

    let report = run_checks(&RunConfig::new(path), board.hardware()).unwrap();
    assert_eq!(
        report.groups[0].modules[0].cases[0].outcome,
        Outcome::failed("GPIO5: wrote 1, read back 0")
    );
}

#[test]
fn test_rerun_is_deterministic() {
    let workspace = Workspace::new();
    let path = workspace.config(REFERENCE_CONFIG);
    let board = reference_board();
    let config = RunConfig::new(path);

    let strip = |mut report: board_doc::Report| {
        report.timestamp = chrono::DateTime::<chrono::Utc>::UNIX_EPOCH;
        report.total_duration_ms = 0;
        for group in &mut report.groups {
            for module in &mut group.modules {
                for case in &mut module.cases {
                    case.duration_ms = 0;
                }
            }
        }
        report
    };

    let first = strip(run_checks(&config, board.hardware()).unwrap());
    let second = strip(run_checks(&config, board.hardware()).unwrap());
    assert_eq!(first, second);

    let formatters: [&dyn OutputFormatter; 3] = [&JsonFormatter::new(true), &JunitFormatter::new(), &CsvFormatter::new()];
    for formatter in formatters {
        assert_eq!(formatter.format(&first), formatter.format(&second));
    }
}

#[test]
fn test_list_groups_in_order() {
    let workspace = Workspace::new();
    let path = workspace.config(REFERENCE_CONFIG);
    assert_eq!(list_groups(&path).unwrap(), vec!["base", "additional"]);
}

#[test]
fn test_plan_executes_nothing() {
    let workspace = Workspace::new();
    let path = workspace.config(REFERENCE_CONFIG);
    let board = reference_board();

    let plan = plan_checks(&RunConfig::new(path), board.hardware()).unwrap();

    assert_eq!(plan.len(), 6);
    assert!(plan.iter().all(|entry| matches!(entry, PlanEntry::Unit(_))));
    assert_eq!(board.access_count(), 0);
}

#[test]
fn test_empty_group_yields_empty_report() {
    let workspace = Workspace::new();
    let path = workspace.config("base:\n");
    let report = run_checks(&RunConfig::new(path), reference_board().hardware()).unwrap();

    assert!(report.groups.is_empty());
    assert_eq!(exit_status(&report), 0);
}
