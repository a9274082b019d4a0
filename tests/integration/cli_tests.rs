//! CLI integration tests
//!
//! These tests run the binary against graph documents and check the report
//! it produces for various options.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get the path to the test fixtures directory
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn app_graph() -> PathBuf {
    fixtures_path().join("graphs").join("app.json")
}

fn swiftdeadcode() -> Command {
    Command::cargo_bin("swiftdeadcode").unwrap()
}

/// Run with JSON output and parse the report document
fn run_json(input: &Path, args: &[&str]) -> serde_json::Value {
    let output = swiftdeadcode()
        .arg(input)
        .args(["--format", "json", "--quiet"])
        .args(args)
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

/// Issue names in a report document, as `code:name`
fn issue_names(report: &serde_json::Value) -> Vec<String> {
    report["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| {
            format!(
                "{}:{}",
                issue["code"].as_str().unwrap(),
                issue["name"].as_str().unwrap()
            )
        })
        .collect()
}

/// Copy the app fixture into a fresh directory
fn project_with_graph() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("graph.json");
    fs::copy(app_graph(), &input).unwrap();
    (dir, input)
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_cli_help() {
    swiftdeadcode()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("swiftdeadcode"))
        .stdout(predicate::str::contains("--retain-public"))
        .stdout(predicate::str::contains("--format"));
}

#[test]
fn test_cli_version() {
    swiftdeadcode()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("swiftdeadcode"));
}

#[test]
fn test_cli_missing_input_fails() {
    swiftdeadcode()
        .arg("does/not/exist.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read graph document"));
}

#[test]
fn test_cli_malformed_input_fails() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("graph.json");
    fs::write(&input, "{ \"fragments\": [ { \"declarations\": 3 } ] }").unwrap();

    swiftdeadcode()
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse graph document"));
}

// ============================================================================
// Report Tests
// ============================================================================

#[test]
fn test_cli_json_report() {
    let report = run_json(&app_graph(), &[]);
    let names = issue_names(&report);

    assert_eq!(report["version"], "1.0");
    assert!(names.contains(&"SD001:unusedHelper()".to_string()), "{:?}", names);
    assert!(names.contains(&"SD001:legacy()".to_string()), "{:?}", names);
    assert!(names.contains(&"SD001:Client".to_string()), "{:?}", names);
    assert!(names.contains(&"SD004:Networking".to_string()), "{:?}", names);

    // Members of an unused type are not reported on their own
    assert!(!names.iter().any(|n| n.ends_with(":fetch()")));
    // Foreign modules cannot be judged
    assert!(!names.iter().any(|n| n.ends_with(":Foundation")));
    // Reachable from top-level code
    assert!(!names.iter().any(|n| n.ends_with(":greet()") || n.ends_with(":Greeter")));

    assert_eq!(report["total_issues"], names.len());
}

#[test]
fn test_cli_terminal_report() {
    swiftdeadcode()
        .arg(app_graph())
        .args(["--format", "terminal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sources/App/Greeter.swift"))
        .stdout(predicate::str::contains("unusedHelper()"))
        .stdout(predicate::str::contains("Summary:"));
}

#[test]
fn test_cli_output_file() {
    let dir = TempDir::new().unwrap();
    let report_path = dir.path().join("report.json");

    swiftdeadcode()
        .arg(app_graph())
        .args(["--format", "json", "--quiet", "--output"])
        .arg(&report_path)
        .assert()
        .success();

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert!(report["total_issues"].as_u64().unwrap() > 0);
}

// ============================================================================
// Retention Flag Tests
// ============================================================================

#[test]
fn test_cli_retain_pattern() {
    let report = run_json(&app_graph(), &["--retain", "unusedHelper", "--retain", "legacy"]);
    let names = issue_names(&report);

    assert!(!names.contains(&"SD001:unusedHelper()".to_string()), "{:?}", names);
    assert!(!names.contains(&"SD001:legacy()".to_string()), "{:?}", names);
    assert!(names.contains(&"SD001:Client".to_string()), "{:?}", names);
}

#[test]
fn test_cli_retain_public() {
    let report = run_json(&app_graph(), &["--retain-public"]);
    let names = issue_names(&report);

    assert!(!names.iter().any(|n| n.ends_with(":Client") || n.ends_with(":fetch()")));
    assert!(names.contains(&"SD001:unusedHelper()".to_string()));
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_cli_config_in_project_directory() {
    let (dir, input) = project_with_graph();
    fs::write(
        dir.path().join(".swiftdeadcode.yml"),
        "retain_patterns:\n  - legacy\ndetection:\n  unused_imports: false\n",
    )
    .unwrap();

    let names = issue_names(&run_json(&input, &[]));

    assert!(!names.contains(&"SD001:legacy()".to_string()), "{:?}", names);
    assert!(!names.iter().any(|n| n.starts_with("SD004")), "{:?}", names);
    assert!(names.contains(&"SD001:unusedHelper()".to_string()));
}

#[test]
fn test_cli_explicit_config_file() {
    let (dir, input) = project_with_graph();
    let config_path = dir.path().join("analysis.toml");
    fs::write(
        &config_path,
        "retain_public = true\nreport_exclude = [\"Sources/App/**\"]\n",
    )
    .unwrap();

    let report = run_json(&input, &["--config", config_path.to_str().unwrap()]);
    let names = issue_names(&report);

    // Everything left lives in App, which is excluded; Client is retained
    assert!(names.is_empty(), "{:?}", names);
    assert_eq!(report["summary"]["warnings"], 0);
}

#[test]
fn test_cli_config_report_format() {
    let (dir, input) = project_with_graph();
    fs::write(dir.path().join("swiftdeadcode.toml"), "[report]\nformat = \"json\"\n").unwrap();

    let output = swiftdeadcode().arg(&input).arg("--quiet").output().unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(report["issues"].is_array());
}

#[test]
fn test_cli_invalid_config_format_fails() {
    let (dir, input) = project_with_graph();
    fs::write(dir.path().join("swiftdeadcode.toml"), "[report]\nformat = \"xml\"\n").unwrap();

    swiftdeadcode()
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid report.format"));
}
