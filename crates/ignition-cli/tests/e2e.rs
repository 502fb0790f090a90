//! End-to-end tests for Ignition CLI commands.
//!
//! These tests verify that the CLI produces expected output
//! when run against real notebook files.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin for tests

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Create a temporary directory with a test notebook.
struct TestNotebook {
    _temp_dir: TempDir,
    notebook_path: PathBuf,
}

impl TestNotebook {
    fn new(source: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let notebook_path = temp_dir.path().join("notebook.json");
        fs::write(&notebook_path, source).expect("Failed to write notebook");

        Self {
            _temp_dir: temp_dir,
            notebook_path,
        }
    }

    fn path(&self) -> &PathBuf {
        &self.notebook_path
    }
}

fn ignition() -> Command {
    Command::cargo_bin("ignition").expect("binary should build")
}

/// `a = 1`, `b = a`, plus a text cell.
fn simple_notebook() -> &'static str {
    r#"{"cells": [
        {"kind": "code", "exports": {"a": 1}},
        {"kind": "text", "text": "Some notes"},
        {"kind": "code", "imports": ["a"], "exports": {"b": "$a"}}
    ]}"#
}

fn cyclic_notebook() -> &'static str {
    r#"{"cells": [
        {"kind": "code", "imports": ["y"], "exports": {"x": "$y"}},
        {"kind": "code", "imports": ["x"], "exports": {"y": "$x"}}
    ]}"#
}

fn run_json(notebook: &TestNotebook) -> Value {
    let output = ignition()
        .arg("run")
        .arg(notebook.path())
        .arg("--json")
        .output()
        .expect("Failed to run ignition");
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).expect("run --json should print JSON")
}

// =============================================================================
// Run
// =============================================================================

#[test]
fn test_run_simple_notebook() {
    let notebook = TestNotebook::new(simple_notebook());

    ignition()
        .arg("run")
        .arg(notebook.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Running"))
        .stdout(predicate::str::contains(r#"cell_2: {"b":1}"#))
        .stdout(predicate::str::contains("Completed"));
}

#[test]
fn test_run_json_report() {
    let notebook = TestNotebook::new(simple_notebook());
    let report = run_json(&notebook);

    assert_eq!(report["cell_0"]["status"], "success");
    assert_eq!(report["cell_0"]["value"]["a"], 1);
    assert_eq!(report["cell_2"]["value"]["b"], 1);
    assert!(report.get("cell_1").is_none());
}

#[test]
fn test_run_reports_thrown_errors() {
    let notebook = TestNotebook::new(
        r#"{"cells": [{"kind": "code", "exports": {"a": {"$throw": "boom"}}}]}"#,
    );
    let report = run_json(&notebook);

    assert_eq!(report["cell_0"]["status"], "error");
    assert_eq!(report["cell_0"]["error"], "boom");
}

#[test]
fn test_run_cycle_reports_mistakes() {
    let notebook = TestNotebook::new(cyclic_notebook());
    let report = run_json(&notebook);

    assert_eq!(
        report["cell_0"]["error"],
        "Cyclical dependency (`x` -> `y` -> `x`)"
    );
    assert_eq!(
        report["cell_1"]["error"],
        "Cyclical dependency (`y` -> `x` -> `y`)"
    );
}

#[test]
fn test_run_tick_limit() {
    let notebook = TestNotebook::new(simple_notebook());

    ignition()
        .arg("run")
        .arg(notebook.path())
        .args(["--max-ticks", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("did not settle within 1 ticks"));
}

#[test]
fn test_run_missing_notebook() {
    ignition()
        .args(["run", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Notebook not found"));
}

#[test]
fn test_run_rejects_out_of_range_id() {
    let notebook = TestNotebook::new(
        r#"{"cells": [{"kind": "code", "id": 18446744073709551615, "exports": {"a": 1}}]}"#,
    );

    ignition()
        .arg("run")
        .arg(notebook.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("cell id out of range"));
}

#[test]
fn test_run_invalid_notebook() {
    let notebook = TestNotebook::new("{ not json");

    ignition()
        .arg("run")
        .arg(notebook.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid notebook file"));
}

// =============================================================================
// Check
// =============================================================================

#[test]
fn test_check_clean_notebook() {
    let notebook = TestNotebook::new(simple_notebook());

    ignition()
        .arg("check")
        .arg(notebook.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("All 2 cells can run"));
}

#[test]
fn test_check_reports_conflicts() {
    let notebook = TestNotebook::new(
        r#"{"cells": [
            {"kind": "code", "exports": {"x": 1}},
            {"kind": "code", "exports": {"x": 2}}
        ]}"#,
    );

    ignition()
        .arg("check")
        .arg(notebook.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Multiple definitions of `x`"))
        .stderr(predicate::str::contains("2 of 2 cells cannot run"));
}

#[test]
fn test_check_reports_compile_errors() {
    let notebook = TestNotebook::new(
        r#"{"cells": [{"kind": "code", "error": "Unexpected token (1:4)"}]}"#,
    );

    ignition()
        .arg("check")
        .arg(notebook.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Unexpected token (1:4)"));
}

// =============================================================================
// Graph
// =============================================================================

#[test]
fn test_graph_prints_edges() {
    let notebook = TestNotebook::new(simple_notebook());

    let output = ignition()
        .arg("graph")
        .arg(notebook.path())
        .output()
        .expect("Failed to run ignition");
    assert!(output.status.success());

    let graph: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(graph["order"], serde_json::json!(["cell_0", "cell_2"]));
    assert_eq!(graph["edges"][0]["from"], "cell_0");
    assert_eq!(graph["edges"][0]["to"], "cell_2");
    assert_eq!(graph["edges"][0]["input"], "a");
}
