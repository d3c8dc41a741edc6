//! Corruption recovery tests for the bmi binary.
//!
//! These tests verify the system can handle:
//! - Corrupted record lines
//! - Partial writes and non-UTF-8 bytes
//! - Corrupted reminder files
//! - Missing files

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write as IoWrite;
use tempfile::TempDir;

fn cli(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bmi"));
    cmd.env("XDG_CONFIG_HOME", temp_dir.path().join("config"));
    cmd.env("HOME", temp_dir.path());
    cmd.env_remove("BMI_CONFIG");
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_corrupted_record_lines_ignored() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();

    let records_path = data_dir.join("records.jsonl");
    fs::write(&records_path, "{ invalid json }\n{ more invalid }\n")
        .expect("Failed to write corrupted records");

    cli(&temp_dir)
        .arg("history")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No records found."));

    // New records are still appended and numbered from 1
    cli(&temp_dir)
        .arg("calc")
        .arg("--data-dir")
        .arg(&data_dir)
        .args(["--height", "170", "--weight", "68", "--age", "35"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Measurement #1 recorded"));

    let contents = fs::read_to_string(&records_path).unwrap();
    assert_eq!(contents.lines().count(), 3);
}

#[test]
fn test_valid_records_survive_bad_neighbours() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");

    cli(&temp_dir)
        .arg("calc")
        .arg("--data-dir")
        .arg(&data_dir)
        .args(["--height", "170", "--weight", "68", "--age", "35"])
        .assert()
        .success();

    let records_path = data_dir.join("records.jsonl");
    let mut contents = fs::read_to_string(&records_path).unwrap();
    contents.push_str("not json at all\n");
    fs::write(&records_path, contents).unwrap();

    cli(&temp_dir)
        .arg("calc")
        .arg("--data-dir")
        .arg(&data_dir)
        .args(["--height", "170", "--weight", "67", "--age", "35"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Measurement #2 recorded"));

    cli(&temp_dir)
        .args(["show", "1"])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();
}

#[test]
fn test_partial_record_line() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");

    cli(&temp_dir)
        .arg("calc")
        .arg("--data-dir")
        .arg(&data_dir)
        .args(["--height", "170", "--weight", "68", "--age", "35"])
        .assert()
        .success();

    // Simulate a crash mid-append: no trailing newline
    let records_path = data_dir.join("records.jsonl");
    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(&records_path)
        .unwrap();
    file.write_all(br#"{"id":2,"created_"#).unwrap();
    drop(file);

    cli(&temp_dir)
        .arg("calc")
        .arg("--data-dir")
        .arg(&data_dir)
        .args(["--height", "170", "--weight", "66", "--age", "35"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Measurement #2 recorded"));

    cli(&temp_dir)
        .args(["show", "2"])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("66 kg"));
}

#[test]
fn test_non_utf8_record_line() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");

    cli(&temp_dir)
        .arg("calc")
        .arg("--data-dir")
        .arg(&data_dir)
        .args(["--height", "170", "--weight", "68", "--age", "35"])
        .assert()
        .success();

    let records_path = data_dir.join("records.jsonl");
    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(&records_path)
        .unwrap();
    file.write_all(b"\xff\xfe garbage\n").unwrap();
    drop(file);

    cli(&temp_dir)
        .arg("history")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("#1"));

    cli(&temp_dir)
        .arg("export")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--out")
        .arg(temp_dir.path().join("history.csv"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 records"));
}

#[test]
fn test_oversized_reminder_interval() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");

    cli(&temp_dir)
        .args(["remind", "schedule", "--every", "100000000"])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("at most 3650 days"));

    assert!(!data_dir.join("reminder.json").exists());
}

#[test]
fn test_corrupted_reminder_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("reminder.json"), "{ invalid json }}}}").unwrap();

    cli(&temp_dir)
        .args(["remind", "status"])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No reminder scheduled."));

    // Rescheduling replaces the broken file
    cli(&temp_dir)
        .args(["remind", "schedule"])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("every 7 days"));
}

#[test]
fn test_invalid_config_fails_cleanly() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("bad.toml");
    fs::write(&config_path, "[chart]\nwidth = -5.0\n").unwrap();

    cli(&temp_dir)
        .env("BMI_CONFIG", &config_path)
        .arg("history")
        .assert()
        .failure()
        .stderr(predicate::str::contains("chart size must be positive"));
}

#[test]
fn test_missing_data_dir() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("does/not/exist");

    cli(&temp_dir)
        .arg("chart")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Add at least 2 records"));

    cli(&temp_dir)
        .args(["remind", "check"])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing due."));
}
