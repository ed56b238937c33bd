//! CLI E2E tests.
//!
//! Each test runs the built binary against its own HOME so the config file
//! and database live in a throwaway directory.

use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_multitimer-cli"))
        .args(args)
        .env("HOME", home)
        .env_remove("MULTITIMER_ENV")
        .env_remove("MULTITIMER_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(home: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

fn add_timer(home: &Path, name: &str, category: &str, duration: u64) -> String {
    let duration = duration.to_string();
    let timer = run_json(
        home,
        &["timer", "add", name, "--duration", &duration, "--category", category],
    );
    timer["id"].as_str().unwrap().to_string()
}

#[test]
fn test_timer_add_and_list() {
    let home = TempDir::new().unwrap();
    let id = add_timer(home.path(), "Plank", "Workout", 60);

    let timers = run_json(home.path(), &["timer", "list"]);
    let timers = timers.as_array().unwrap();
    assert_eq!(timers.len(), 1);
    assert_eq!(timers[0]["id"], id.as_str());
    assert_eq!(timers[0]["name"], "Plank");
    assert_eq!(timers[0]["remaining"], 60);
    assert_eq!(timers[0]["status"], "Paused");
    assert_eq!(timers[0]["progress"], 1.0);
}

#[test]
fn test_timer_add_rejects_short_duration() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["timer", "add", "Blink", "--duration", "5"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"), "unexpected stderr: {stderr}");

    let timers = run_json(home.path(), &["timer", "list"]);
    assert!(timers.as_array().unwrap().is_empty());
}

#[test]
fn test_timer_start_pause_reset() {
    let home = TempDir::new().unwrap();
    let id = add_timer(home.path(), "Read", "Study", 30);

    let started = run_json(home.path(), &["timer", "start", &id]);
    assert_eq!(started["status"], "Running");

    let shown = run_json(home.path(), &["timer", "show", &id]);
    assert_eq!(shown["status"], "Running");

    let paused = run_json(home.path(), &["timer", "pause", &id]);
    assert_eq!(paused["status"], "Paused");

    let reset = run_json(home.path(), &["timer", "reset", &id]);
    assert_eq!(reset["remaining"], 30);
}

#[test]
fn test_unknown_timer_fails() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["timer", "start", "missing"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("missing"));
}

#[test]
fn test_category_start_all() {
    let home = TempDir::new().unwrap();
    let a = add_timer(home.path(), "Flashcards", "Study", 30);
    let b = add_timer(home.path(), "Essay", "Study", 40);
    add_timer(home.path(), "Run", "Workout", 30);

    let report = run_json(home.path(), &["category", "start", "Study"]);
    assert_eq!(report["matched"], 2);
    assert_eq!(report["changed"], serde_json::json!([a, b]));

    let summaries = run_json(home.path(), &["category", "list"]);
    let summaries = summaries.as_array().unwrap();
    assert_eq!(summaries[0]["name"], "Study");
    assert_eq!(summaries[0]["running"], 2);
    assert_eq!(summaries[1]["name"], "Workout");
    assert_eq!(summaries[1]["paused"], 1);
}

#[test]
fn test_run_until_idle_records_history() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "set", "engine.cadence_ms", "10"]);
    assert_eq!(code, 0);
    let id = add_timer(home.path(), "Sprint", "Workout", 12);
    run_json(home.path(), &["timer", "start", &id]);

    let (stdout, stderr, code) = run_cli(home.path(), &["run", "--until-idle", "--for-secs", "30"]);
    assert_eq!(code, 0, "run failed: {stderr}");
    let events: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let halfway = events.iter().filter(|e| e["type"] == "HalfwayReached").count();
    let completed = events.iter().filter(|e| e["type"] == "Completed").count();
    assert_eq!(halfway, 1);
    assert_eq!(completed, 1);
    let halfway_event = events.iter().find(|e| e["type"] == "HalfwayReached").unwrap();
    assert_eq!(halfway_event["halfSeconds"], 6);

    let history = run_json(home.path(), &["history", "list"]);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["name"], "Sprint");
    assert!(history[0]["completedAt"].is_string());

    let shown = run_json(home.path(), &["timer", "show", &id]);
    assert_eq!(shown["status"], "Completed");
    assert_eq!(shown["remaining"], 0);
}

#[test]
fn test_run_until_idle_returns_when_nothing_runs() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["run", "--until-idle"]);
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
}

#[test]
fn test_config_get_set() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "timers.default_category"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "Workout");

    let updated = run_json(home.path(), &["config", "set", "timers.default_category", "Study"]);
    assert_eq!(updated["value"], "Study");
    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "timers.default_category"]);
    assert_eq!(stdout.trim(), "Study");

    let (_, stderr, code) = run_cli(home.path(), &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no.such.key"));

    let (_, _, code) = run_cli(home.path(), &["config", "set", "engine.cadence_ms", "0"]);
    assert_eq!(code, 1);

    let listed = run_json(home.path(), &["config", "list"]);
    assert_eq!(listed["engine"]["cadence_ms"], 1000);
    assert_eq!(listed["timers"]["default_category"], "Study");

    let reset = run_json(home.path(), &["config", "reset"]);
    assert_eq!(reset["timers"]["default_category"], "Workout");

    let (stdout, _, code) = run_cli(home.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with("config.toml"));
}
