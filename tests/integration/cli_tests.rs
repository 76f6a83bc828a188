//! CLI integration tests.
//!
//! Run the built binary against temporary descriptions. Only descriptions
//! that never reach real hardware are used: external script providers,
//! unknown modules, and runs that stop before execution.

use crate::mocks::*;
use std::path::Path;
use std::process::{Command, Output};

fn board_doc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_board-doc"))
        .args(args)
        .env_remove("BOARD_DOC_FORMAT")
        .env_remove("BOARD_DOC_TIMEOUT")
        .env_remove("RUST_LOG")
        .output()
        .expect("run board-doc")
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_list_groups_prints_names_without_loading() {
    let workspace = Workspace::new();
    let path = workspace.config(concat!(
        "base:\n",
        "  i2c: [{bus: 1, addresses: [0x3c]}]\n",
        "additional:\n",
        "  sensor:\n",
        "    path: /nonexistent/provider\n",
        "    tests: [{}]\n",
    ));

    let output = board_doc(&[arg(&path), "--list-groups"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "base\nadditional\n");
}

#[test]
fn test_unknown_group_exits_nonzero() {
    let workspace = Workspace::new();
    let path = workspace.config("base:\n  i2c: [{bus: 1, addresses: [0x3c]}]\n");

    let output = board_doc(&[arg(&path), "--group", "nonexistent"]);

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("Unknown group: 'nonexistent'"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_unparseable_description_exits_nonzero() {
    let workspace = Workspace::new();
    let path = workspace.config("base: [unterminated\n");

    let output = board_doc(&[arg(&path)]);

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("Parse error"));
}

#[test]
fn test_missing_description_exits_nonzero() {
    let output = board_doc(&["/nonexistent/board.yml"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_usage_error() {
    let output = board_doc(&["--no-such-flag"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_version_flag() {
    let output = board_doc(&["--version"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_module_exits_one_with_report() {
    let workspace = Workspace::new();
    let path = workspace.config("base:\n  thermometer: [{zone: 0}]\n");
    let junit = workspace.path().join("report.xml");

    let output = board_doc(&[arg(&path), "--no-color", "-o", arg(&junit)]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("SUMMARY: 0 passed, 0 failed, 1 errored"));
    let xml = std::fs::read_to_string(&junit).unwrap();
    assert!(xml.contains("<testsuite name=\"thermometer\""));
    assert!(xml.contains("<error message=\"Unknown module: &apos;thermometer&apos;\">"));
}

#[cfg(unix)]
#[test]
fn test_passing_external_run_exits_zero() {
    let workspace = Workspace::new();
    workspace.provider("sensor", "sensor", &["channel"], &[("test_reading", "echo 21.5C")]);
    let path = workspace.config("bench:\n  sensor:\n    path: providers/sensor\n    tests: [{channel: 1}]\n");
    let junit = workspace.path().join("out").join("report.xml");
    std::fs::create_dir_all(junit.parent().unwrap()).unwrap();
    let csv = workspace.path().join("report.csv");

    let output = board_doc(&[
        arg(&path),
        "--format",
        "json",
        "--output",
        arg(&junit),
        "--csv",
        arg(&csv),
    ]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["summary"]["passed"], 1);
    assert!(std::fs::read_to_string(&junit).unwrap().contains("<testsuite name=\"sensor\" package=\"bench\" tests=\"1\" failures=\"0\" errors=\"0\""));
    assert!(std::fs::read_to_string(&csv).unwrap().contains("bench,sensor,0,test_reading,passed,"));
}

#[cfg(unix)]
#[test]
fn test_failing_external_run_exits_one() {
    let workspace = Workspace::new();
    workspace.provider("sensor", "sensor", &[], &[("test_reading", "exit 1")]);
    let path = workspace.config("bench:\n  sensor:\n    path: providers/sensor\n    tests: [{}]\n");

    let output = board_doc(&[arg(&path), "--quiet", "--no-color"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("[FAIL] test_reading[0]"));
}

#[cfg(unix)]
#[test]
fn test_timeout_flag() {
    let workspace = Workspace::new();
    workspace.provider("slow", "slow", &[], &[("test_wait", "sleep 5")]);
    let path = workspace.config("bench:\n  slow:\n    path: providers/slow\n    tests: [{}]\n");

    let output = board_doc(&[arg(&path), "--timeout", "1", "--no-color"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("timed out after 1s, check process killed"));
}

#[test]
fn test_generate_docs_runs_nothing() {
    let workspace = Workspace::new();
    let path = workspace.config(REFERENCE_CONFIG);
    let docs = workspace.path().join("CHECKS.md");

    let output = board_doc(&[arg(&path), "--generate-docs", arg(&docs)]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).is_empty());
    let text = std::fs::read_to_string(&docs).unwrap();
    assert!(text.contains("### i2c"));
    assert!(text.contains("`test_camera_name`"));
}

#[test]
fn test_logs_go_to_stderr() {
    let workspace = Workspace::new();
    let path = workspace.config("base:\n  thermometer: [{zone: 0}]\n");

    let output = board_doc(&[arg(&path), "--format", "json", "--log-json"]);

    // stdout stays machine-readable even with warnings logged
    assert!(serde_json::from_str::<serde_json::Value>(&stdout(&output)).is_ok());
    assert!(stderr(&output).contains("\"level\":\"WARN\""));
}

#[cfg(unix)]
#[test]
fn test_system_report_archive() {
    let workspace = Workspace::new();
    let commands = workspace.config(concat!(
        "kernel:\n",
        "  run: echo Linux board 6.1.0\n",
        "  output: uname.txt\n",
        "  summary: [{title: Release, run: cut -d' ' -f3}]\n",
        "missing:\n",
        "  run: exit 1\n",
        "  output: missing.txt\n",
    ));
    let archive = workspace.path().join("report.zip");

    let output = board_doc(&[arg(&commands), "--system-report", arg(&archive)]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "kernel completed\nmissing failed\n");

    let mut zip = zip::ZipArchive::new(std::fs::File::open(&archive).unwrap()).unwrap();
    assert_eq!(zip.len(), 3);
    let mut overview = String::new();
    std::io::Read::read_to_string(&mut zip.by_name("system_report_summary.html").unwrap(), &mut overview).unwrap();
    assert!(overview.contains("<h3>Release</h3>\n<pre>6.1.0\n</pre>"));
    assert!(zip.by_name("missing.txt").is_err());
}

#[test]
fn test_system_report_rejects_bad_command_list() {
    let workspace = Workspace::new();
    let commands = workspace.config("kernel:\n  run: uname -a\n");
    let archive = workspace.path().join("report.zip");

    let output = board_doc(&[arg(&commands), "--system-report", arg(&archive)]);

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("kernel: "));
    assert!(!archive.exists());
}
