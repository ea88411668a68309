//! Integration tests for the `dayplan` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to exercise the expand and day
//! subcommands through the actual binary, including stdin piping, file I/O,
//! zone handling and error reporting.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

/// Helper: path to the week.ics fixture.
fn week_ics_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/week.ics")
}

/// Helper: path to the tasks.json fixture.
fn tasks_json_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/tasks.json")
}

/// Helper: read the week.ics fixture as a string.
fn week_ics() -> String {
    std::fs::read_to_string(week_ics_path()).expect("week.ics fixture must exist")
}

fn dayplan() -> Command {
    let mut cmd = Command::cargo_bin("dayplan").unwrap();
    cmd.env_remove("DAYPLAN_ZONE")
        .env_remove("DAYPLAN_DAYS")
        .env_remove("DAYPLAN_TASKS")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(args: &[&str]) -> Value {
    let output = dayplan().args(args).output().unwrap();
    assert!(
        output.status.success(),
        "dayplan failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout must be valid JSON")
}

fn keys(value: &Value) -> Vec<String> {
    value
        .as_object()
        .expect("day map must be a JSON object")
        .keys()
        .cloned()
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// expand subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn expand_file_to_stdout() {
    let days = stdout_json(&[
        "expand",
        "-i",
        week_ics_path(),
        "--from",
        "2026-03-01",
        "--to",
        "2026-03-31",
    ]);

    assert_eq!(
        keys(&days),
        vec![
            "2026-03-02",
            "2026-03-04",
            "2026-03-05",
            "2026-03-09",
            "2026-03-16",
            "2026-03-23",
        ]
    );
    assert_eq!(days["2026-03-02"].as_array().unwrap().len(), 2);
    assert_eq!(days["2026-03-09"][0]["title"], "Lecture (moved)");
    assert_eq!(days["2026-03-09"][0]["start"], "2026-03-09T14:00:00+00:00");
}

#[test]
fn expand_stdin_to_stdout() {
    dayplan()
        .args(["expand", "--from", "2026-03-01", "--to", "2026-03-03"])
        .write_stdin(week_ics())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"2026-03-02\""))
        .stdout(predicate::str::contains("Lab"))
        .stdout(predicate::str::contains("2026-03-09").not());
}

#[test]
fn expand_file_to_file() {
    let output_path = std::env::temp_dir().join("dayplan-test-expand-output.json");
    let _ = std::fs::remove_file(&output_path);

    dayplan()
        .args([
            "expand",
            "-i",
            week_ics_path(),
            "--anchor",
            "2026-03-10",
            "--days",
            "7",
            "-o",
        ])
        .arg(&output_path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let content = std::fs::read_to_string(&output_path).expect("output file must exist");
    let days: Value = serde_json::from_str(&content).unwrap();
    // 2026-03-03 .. 2026-03-17
    assert_eq!(
        keys(&days),
        vec!["2026-03-04", "2026-03-05", "2026-03-09", "2026-03-16"]
    );

    let _ = std::fs::remove_file(&output_path);
}

#[test]
fn expand_in_zone_moves_overnight_event_to_one_day() {
    // 23:00-01:00 UTC is 18:00-20:00 in New York: one local day, not two.
    let days = stdout_json(&[
        "expand",
        "-i",
        week_ics_path(),
        "--from",
        "2026-03-01",
        "--to",
        "2026-03-10",
        "--zone",
        "America/New_York",
    ]);
    assert_eq!(
        keys(&days),
        vec!["2026-03-02", "2026-03-04", "2026-03-09"]
    );
    assert_eq!(days["2026-03-04"][0]["start"], "2026-03-04T18:00:00-05:00");
}

#[test]
fn zone_can_come_from_environment() {
    dayplan()
        .env("DAYPLAN_ZONE", "America/New_York")
        .args(["expand", "-i", week_ics_path(), "--from", "2026-03-04", "--to", "2026-03-05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-05:00"))
        .stdout(predicate::str::contains("2026-03-05").not());
}

#[test]
fn empty_input_expands_to_empty_map() {
    dayplan()
        .args(["expand", "--anchor", "2026-03-10"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::diff("{}\n"));
}

// ─────────────────────────────────────────────────────────────────────────────
// day subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn day_text_report_shows_totals_and_timeline() {
    dayplan()
        .args(["day", "-i", week_ics_path(), "--date", "2026-03-02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2026-03-02 (Monday)"))
        .stdout(predicate::str::contains("Busy:    2.5 h"))
        .stdout(predicate::str::contains("Free:    21.5 h"))
        .stdout(predicate::str::contains("9:00 AM–11:30 AM"))
        .stdout(predicate::str::contains("Events (2):"))
        .stdout(predicate::str::contains("9:00 AM  Lecture"));
}

#[test]
fn day_with_tasks_counts_planned_time() {
    dayplan()
        .args([
            "day",
            "-i",
            week_ics_path(),
            "--date",
            "2026-03-02",
            "--tasks",
            tasks_json_path(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Planned: 2.0 h"))
        .stdout(predicate::str::contains("Free:    19.5 h"))
        .stdout(predicate::str::contains("2:00 PM–3:30 PM"));
}

#[test]
fn day_json_report() {
    let report = stdout_json(&[
        "day",
        "-i",
        week_ics_path(),
        "--date",
        "2026-03-05",
        "--tasks",
        tasks_json_path(),
        "--json",
    ]);

    assert_eq!(report["day"], "2026-03-05");
    assert_eq!(report["summary"]["busy_minutes"], 60);
    assert_eq!(report["summary"]["planned_minutes"], 120);
    assert_eq!(report["summary"]["free_minutes"], 1260);
    assert_eq!(report["calendar"][0]["start_min"], 0);
    assert_eq!(report["calendar"][0]["end_min"], 60);
    assert_eq!(report["events"][0]["title"], "Red-eye");
}

#[test]
fn day_defaults_to_first_day_with_events() {
    let report = stdout_json(&["day", "-i", week_ics_path(), "--anchor", "2026-03-10", "--json"]);
    assert_eq!(report["day"], "2026-03-02");
}

#[test]
fn day_without_events_is_all_free() {
    let report = stdout_json(&[
        "day",
        "-i",
        week_ics_path(),
        "--date",
        "2026-03-03",
        "--json",
    ]);
    assert_eq!(report["events"].as_array().unwrap().len(), 0);
    assert_eq!(report["summary"]["free_minutes"], 1440);
}

// ─────────────────────────────────────────────────────────────────────────────
// Error handling
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn unknown_zone_fails() {
    dayplan()
        .args(["expand", "-i", week_ics_path(), "--zone", "Mars/Olympus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timezone"));
}

#[test]
fn missing_input_file_fails() {
    dayplan()
        .args(["expand", "-i", "/nonexistent/calendar.ics"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn from_requires_to() {
    dayplan()
        .args(["expand", "-i", week_ics_path(), "--from", "2026-03-01"])
        .assert()
        .failure();
}

#[test]
fn reversed_window_fails() {
    dayplan()
        .args([
            "expand",
            "-i",
            week_ics_path(),
            "--from",
            "2026-03-31",
            "--to",
            "2026-03-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is before"));
}

#[test]
fn invalid_date_is_rejected() {
    dayplan()
        .args(["day", "-i", week_ics_path(), "--date", "March 2nd"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected YYYY-MM-DD"));
}

#[test]
fn invalid_tasks_json_fails() {
    dayplan()
        .args(["day", "-i", week_ics_path(), "--date", "2026-03-02", "--tasks", week_ics_path()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid tasks JSON"));
}
