//! End-to-end tests for the `booker` binary
//!
//! Only commands that run offline are exercised here; anything that
//! talks to the platform is covered by scenario files instead.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn booker_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_booker"))
}

fn write_json(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write fixture");
    path
}

fn run(args: &[&str], config_dir: &Path) -> Output {
    Command::new(booker_bin())
        .args(args)
        .env("XDG_CONFIG_HOME", config_dir)
        .env("HOME", config_dir)
        .output()
        .expect("Failed to run booker")
}

#[test]
fn test_compare_matching_files() {
    let dir = TempDir::new().unwrap();
    let expected = write_json(
        dir.path(),
        "expected.json",
        r#"{"lat": 52.6351204, "name": "B&B"}"#,
    );
    let actual = write_json(
        dir.path(),
        "actual.json",
        r#"{"name": "B&B", "lat": 52.6351205}"#,
    );

    let output = run(
        &["compare", expected.to_str().unwrap(), actual.to_str().unwrap()],
        dir.path(),
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {}", stdout);
    assert!(stdout.contains("Values match"));
}

#[test]
fn test_compare_reports_every_difference() {
    let dir = TempDir::new().unwrap();
    let expected = write_json(
        dir.path(),
        "expected.json",
        r#"{"firstname": "Mark", "bookingdates": {"checkout": "2026-01-05"}}"#,
    );
    let actual = write_json(
        dir.path(),
        "actual.json",
        r#"{"firstname": "Changed", "bookingdates": {"checkout": "2026-01-06"}}"#,
    );

    let output = run(
        &["compare", expected.to_str().unwrap(), actual.to_str().unwrap()],
        dir.path(),
    );

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 field(s) differ"), "stdout: {}", stdout);
    assert!(stdout.contains("firstname"));
    assert!(stdout.contains("bookingdates.checkout"));
}

#[test]
fn test_compare_subset_and_ignore() {
    let dir = TempDir::new().unwrap();
    let expected = write_json(dir.path(), "expected.json", r#"{"description": "Changed"}"#);
    let actual = write_json(
        dir.path(),
        "actual.json",
        r#"{"description": "Changed", "name": "Shady Meadows", "bookingid": 9}"#,
    );
    let (expected, actual) = (expected.to_str().unwrap(), actual.to_str().unwrap());

    let output = run(&["compare", "--subset", expected, actual], dir.path());
    assert!(output.status.success());

    let output = run(
        &[
            "compare", "--ignore", "name", "--ignore", "bookingid", expected, actual,
        ],
        dir.path(),
    );
    assert!(output.status.success());
}

#[test]
fn test_compare_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let actual = write_json(dir.path(), "actual.json", "{}");
    let missing = dir.path().join("missing.json");

    let output = run(
        &["compare", missing.to_str().unwrap(), actual.to_str().unwrap()],
        dir.path(),
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read file"), "stderr: {}", stderr);
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[polling]\nmax_wait_secs = \"soon\"\n").unwrap();
    let file = write_json(dir.path(), "a.json", "{}");
    let file = file.to_str().unwrap();

    let output = run(
        &["--config", config.to_str().unwrap(), "compare", file, file],
        dir.path(),
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid configuration file"), "stderr: {}", stderr);
}

#[test]
fn test_compare_rejects_invalid_epsilon() {
    let dir = TempDir::new().unwrap();
    let file = write_json(dir.path(), "a.json", r#"{"lat": 52.6351204}"#);
    let file = file.to_str().unwrap();

    for epsilon in ["NaN", "-1"] {
        let flag = format!("--epsilon={}", epsilon);
        let output = run(&["compare", &flag, file, file], dir.path());

        assert!(!output.status.success(), "accepted epsilon {}", epsilon);
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("epsilon must be"), "stderr: {}", stderr);
    }
}
