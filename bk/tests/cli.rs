//! End-to-end tests for the `bk` binary

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bk(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bk").expect("bk binary builds");
    cmd.current_dir(dir.path()).env("RUST_LOG", "warn").env("NO_COLOR", "1");
    cmd
}

const FAST: [&str; 10] = [
    "--time-unit-ms",
    "2",
    "--stagger-min",
    "0",
    "--stagger-max",
    "2",
    "--seed",
    "5",
    "--travelers",
    "4",
];

#[test]
fn test_run_then_verify_event_log() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("run").join("events.jsonl");

    bk(&temp)
        .arg("run")
        .args(FAST)
        .arg("--event-log")
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("started crossing"))
        .stdout(predicate::str::contains("All travelers crossed"));

    // 8 travelers: at least an admitted and a released event each
    assert!(fs::read_to_string(&log).unwrap().lines().count() >= 16);

    bk(&temp)
        .arg("verify")
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("No violations"))
        .stdout(predicate::str::contains("Admitted: 4 northbound, 4 southbound"));
}

#[test]
fn test_quiet_run_prints_summary_only() {
    let temp = TempDir::new().unwrap();
    bk(&temp)
        .args(["run", "--quiet"])
        .args(FAST)
        .assert()
        .success()
        .stdout(predicate::str::contains("waiting...").not())
        .stdout(predicate::str::contains("Northbound: 4 travelers"));
}

#[test]
fn test_zero_streak_is_fatal() {
    let temp = TempDir::new().unwrap();
    bk(&temp)
        .args(["run", "--max-streak", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("max-streak"));
}

#[test]
fn test_oversized_population_is_fatal() {
    let temp = TempDir::new().unwrap();
    bk(&temp)
        .args(["run", "--travelers", "3000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("travelers-per-direction"));
}

#[test]
fn test_verify_reports_violations() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("bad.jsonl");
    fs::write(
        &log,
        concat!(
            r#"{"seq":1,"ts":"2026-01-01T00:00:00Z","traveler_id":0,"direction":"north","kind":"admitted","occupants_after":1}"#,
            "\n",
            r#"{"seq":2,"ts":"2026-01-01T00:00:01Z","traveler_id":0,"direction":"south","kind":"admitted","occupants_after":1}"#,
            "\n",
        ),
    )
    .unwrap();

    bk(&temp)
        .arg("verify")
        .arg(&log)
        .assert()
        .failure()
        .stdout(predicate::str::contains("northbound and 1 southbound on the lane"))
        .stdout(predicate::str::contains("never finished"));
}

#[test]
fn test_config_file_and_overrides() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("bridgekeeper.yml"), "lane:\n  max-streak: 7\n").unwrap();

    bk(&temp)
        .args(["config", "--travelers", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max-streak: 7"))
        .stdout(predicate::str::contains("travelers-per-direction: 2"));
}
