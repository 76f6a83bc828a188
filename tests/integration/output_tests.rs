//! Output formatting tests over real runs.

use crate::mocks::*;
use board_doc::cli::args::OutputFormat;
use board_doc::cli::output::{get_formatter, render_docs, CsvFormatter, JunitFormatter, OutputFormatter};
use board_doc::{plan_checks, run_checks, Report, RunConfig};

const MIXED_CONFIG: &str = r#"
base:
  i2c:
    - bus: 1
      addresses: [0x3c]
    - bus: 2
      addresses: [0x68]
  gpio:
    - number: 20
additional:
  camera:
    - device: /dev/video0
      camera_name: USB Camera
      driver_name: uvcvideo
"#;

fn mixed_report() -> Report {
    let workspace = Workspace::new();
    let path = workspace.config(MIXED_CONFIG);
    run_checks(&RunConfig::new(path), reference_board().hardware()).unwrap()
}

#[test]
fn test_junit_suites_follow_modules() {
    let xml = JunitFormatter::new().format(&mixed_report());

    assert!(xml.contains("tests=\"6\" failures=\"1\" errors=\"1\""));
    assert!(xml.contains("<testsuite name=\"i2c\" package=\"base\" tests=\"2\" failures=\"1\" errors=\"0\""));
    assert!(xml.contains("<testsuite name=\"gpio\" package=\"base\" tests=\"1\" failures=\"0\" errors=\"1\""));
    assert!(xml.contains("<testsuite name=\"camera\" package=\"additional\" tests=\"3\""));
    assert!(xml.contains("<testcase name=\"test_bus_detect[1]\" classname=\"base.i2c\""));
    assert!(xml.contains("<error message=\"Module &apos;gpio&apos; requires parameter &apos;value&apos;\">"));

    let i2c = xml.find("name=\"i2c\"").unwrap();
    let gpio = xml.find("name=\"gpio\"").unwrap();
    let camera = xml.find("name=\"camera\"").unwrap();
    assert!(i2c < gpio && gpio < camera);
}

#[test]
fn test_json_round_trips_through_serde() {
    let json = get_formatter(OutputFormat::Json, true, false, false).format(&mixed_report());
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["summary"]["total"], 6);
    assert_eq!(value["summary"]["errored"], 1);
    assert_eq!(value["groups"][0]["name"], "base");
    assert_eq!(value["groups"][1]["modules"][0]["name"], "camera");
    let bus2 = &value["groups"][0]["modules"][0]["cases"][1];
    assert_eq!(bus2["status"], "failed");
    assert_eq!(bus2["instance"], 1);
}

#[test]
fn test_terminal_summary_line() {
    let text = get_formatter(OutputFormat::Text, true, false, false).format(&mixed_report());
    assert!(text.contains("SUMMARY: 4 passed, 1 failed, 1 errored"));
    assert!(text.contains("BASE (1/3 passed)"));
    assert!(text.contains("ADDITIONAL (3/3 passed)"));
}

#[test]
fn test_csv_has_row_per_case() {
    let csv = CsvFormatter::new().format(&mixed_report());
    assert_eq!(csv.lines().count(), 7);
    assert!(csv.contains("base,gpio,0,bind,errored,0,"));
}

#[test]
fn test_generated_docs_list_every_check() {
    let workspace = Workspace::new();
    let path = workspace.config(REFERENCE_CONFIG);
    let plan = plan_checks(&RunConfig::new(path), reference_board().hardware()).unwrap();
    let docs = render_docs(&plan);

    assert!(docs.starts_with("# Board checks"));
    assert!(docs.contains("## base"));
    assert!(docs.contains("## additional"));
    assert!(docs.contains("| 0 | `test_bus_detect` | I2C bus 1: devices respond at addresses [60, 80] |"));
    assert!(docs.contains("| 1 | `test_read_write` | GPIO21: write the value '0' and read to confirm |"));
    assert!(docs.contains("| 0 | `test_driver_name` | /dev/video0: bound to the 'uvcvideo' driver |"));
}
