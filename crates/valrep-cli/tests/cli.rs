//! End-to-end tests for the `valrep` binary over saved corpus dumps.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CORPUS: &str = r#"[
  {"page": 0, "text": "Application Number: 0012345", "x1": 100.0, "x2": 700.0, "y1": 200.0, "y2": 240.0},
  {"page": 0, "text": "Tenure", "x1": 100.0, "x2": 250.0, "y1": 500.0, "y2": 540.0},
  {"page": 0, "text": "Leasehold", "x1": 400.0, "x2": 600.0, "y1": 502.0, "y2": 542.0},
  {"page": 1, "text": "Market value in present condition £250,000", "x1": 100.0, "x2": 1000.0, "y1": 300.0, "y2": 340.0}
]"#;

/// A command with an isolated user config directory.
fn valrep(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("valrep").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home);
    cmd
}

fn workspace() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let corpus = dir.path().join("report.json");
    fs::write(&corpus, CORPUS).unwrap();
    (dir, corpus)
}

#[test]
fn test_process_corpus_to_stdout() {
    let (dir, corpus) = workspace();
    valrep(dir.path())
        .arg("process")
        .arg(&corpus)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""tenure": "Leasehold""#))
        .stdout(predicate::str::contains(r#""applicationNumber": "0012345""#))
        .stdout(predicate::str::contains(r#""marketValuePresentCondition": 250000.0"#));
}

#[test]
fn test_process_writes_output_file() {
    let (dir, corpus) = workspace();
    let output = dir.path().join("record.json");

    valrep(dir.path())
        .arg("process")
        .arg(&corpus)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let record: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(record["propertyType"]["tenure"], "Leasehold");
    assert_eq!(
        record["valuationForFinancePurposeHPP"]["marketValuePresentCondition"],
        250000.0
    );
    assert_eq!(record["propertyType"]["isFlat"], false);
}

#[test]
fn test_process_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    valrep(dir.path())
        .arg("process")
        .arg(dir.path().join("missing.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_process_rejects_malformed_corpus() {
    let dir = TempDir::new().unwrap();
    let corpus = dir.path().join("broken.json");
    fs::write(&corpus, "{not json").unwrap();

    valrep(dir.path())
        .arg("process")
        .arg(&corpus)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid corpus dump"));
}

#[test]
fn test_process_with_explicit_config() {
    let (dir, corpus) = workspace();
    let config = dir.path().join("valrep.json");

    valrep(dir.path())
        .args(["config", "init", "--output"])
        .arg(&config)
        .assert()
        .success();

    valrep(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("process")
        .arg(&corpus)
        .assert()
        .success()
        .stdout(predicate::str::contains("Leasehold"));
}

#[test]
fn test_batch_writes_records_and_summary() {
    let (dir, _) = workspace();
    fs::write(dir.path().join("second.json"), CORPUS).unwrap();
    let out = dir.path().join("out");
    let pattern = format!("{}/*.json", dir.path().display());

    valrep(dir.path())
        .arg("batch")
        .arg(&pattern)
        .arg("--output-dir")
        .arg(&out)
        .arg("--summary")
        .args(["-j", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 successful"));

    assert!(out.join("report.json").exists());
    assert!(out.join("second.json").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("filename,status,application_number"));
    assert!(lines[1].starts_with("report.json,success,0012345"));
    assert!(lines[1].contains("Leasehold"));
}

#[test]
fn test_batch_continue_on_error() {
    let (dir, _) = workspace();
    fs::write(dir.path().join("broken.json"), "[").unwrap();
    let pattern = format!("{}/*.json", dir.path().display());

    valrep(dir.path())
        .arg("batch")
        .arg(&pattern)
        .assert()
        .failure();

    valrep(dir.path())
        .arg("batch")
        .arg(&pattern)
        .arg("--continue-on-error")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 successful"))
        .stdout(predicate::str::contains("broken.json"));
}

#[test]
fn test_batch_no_matches() {
    let dir = TempDir::new().unwrap();
    let pattern = format!("{}/*.pdf", dir.path().display());

    valrep(dir.path())
        .arg("batch")
        .arg(&pattern)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();

    valrep(dir.path())
        .args(["config", "get", "matching.year_min"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1800"));

    valrep(dir.path())
        .args(["config", "set", "raster.dpi", "200"])
        .assert()
        .success();

    valrep(dir.path())
        .args(["config", "get", "raster.dpi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("200"));

    assert!(dir.path().join("valrep").join("config.json").exists());
}

#[test]
fn test_config_set_rejects_invalid_value() {
    let dir = TempDir::new().unwrap();

    valrep(dir.path())
        .args(["config", "set", "matching.year_min", "3000"])
        .assert()
        .failure();

    valrep(dir.path())
        .args(["config", "set", "matching.unknown_key", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration path not found"));
}

#[test]
fn test_config_path_reports_status() {
    let dir = TempDir::new().unwrap();
    valrep(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));
}
