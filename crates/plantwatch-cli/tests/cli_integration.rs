//! CLI Integration Tests
//!
//! These tests run the `plantwatch` binary against a throwaway database and
//! config file and check its text and JSON output.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

/// A temporary database and config for one test.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn db(&self) -> PathBuf {
        self.dir.path().join("plants.db")
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("config").join("config.toml")
    }

    /// Run plantwatch with the sandbox database and config
    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_plantwatch"))
            .args(args)
            .env("PLANTWATCH_DB", self.db())
            .env("PLANTWATCH_CONFIG", self.config())
            .env_remove("NO_COLOR")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to run plantwatch binary")
    }

    /// Run with `--json --quiet` and parse stdout, asserting success
    fn json(&self, args: &[&str]) -> Value {
        let mut full = vec!["--json", "--quiet"];
        full.extend_from_slice(args);
        let output = self.run(&full);
        assert!(
            output.status.success(),
            "{:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["--help"]);

    assert!(output.status.success(), "Help should succeed");
    let text = stdout(&output);
    for cmd in ["plant", "sensor", "ingest", "rule", "alert", "watch", "config"] {
        assert!(text.contains(cmd), "Help should list {} command", cmd);
    }
}

#[test]
fn test_version_command() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["--version"]);

    assert!(output.status.success(), "Version should succeed");
    assert!(stdout(&output).contains("plantwatch"));
}

#[test]
fn test_subcommand_help() {
    let sandbox = Sandbox::new();
    for cmd in ["plant", "sensor", "ingest", "rule", "alert", "watch", "config"] {
        let output = sandbox.run(&[cmd, "--help"]);
        assert!(output.status.success(), "{} --help should succeed", cmd);
        assert!(!stdout(&output).is_empty(), "{} --help should produce output", cmd);
    }
}

// =============================================================================
// Config Command
// =============================================================================

#[test]
fn test_config_path_honors_env() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["config", "path"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), sandbox.config().display().to_string());
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let sandbox = Sandbox::new();

    let first = sandbox.run(&["config", "init"]);
    assert!(first.status.success(), "{}", stderr(&first));
    assert!(Path::new(&sandbox.config()).exists());

    let second = sandbox.run(&["config", "init"]);
    assert!(!second.status.success());
    assert!(stderr(&second).contains("--force"));

    let forced = sandbox.run(&["config", "init", "--force"]);
    assert!(forced.status.success());

    let shown = sandbox.json(&["config", "show"]);
    assert_eq!(shown["user_id"], 1);
}

// =============================================================================
// Plant, Sensor and Ingest Flow
// =============================================================================

#[test]
fn test_breaching_reading_puts_plant_in_alert() {
    let sandbox = Sandbox::new();

    let plant = sandbox.json(&["plant", "add", "Tomato", "--temperature", "18..28:°C"]);
    let plant_id = plant["id"].as_i64().expect("plant id");
    assert_eq!(plant["temperature"]["max"], 28.0);

    let sensor = sandbox.json(&[
        "sensor",
        "add",
        "T-1",
        "Air",
        "--type",
        "temperature",
        "--unit",
        "°C",
        "--plant",
        &plant_id.to_string(),
    ]);
    assert_eq!(sensor["type"], "TEMPERATURE");

    let outcome = sandbox.json(&["ingest", "T-1", "31"]);
    assert_eq!(outcome["reading"]["statusReading"], "CRITICAL");
    assert_eq!(outcome["alerts"].as_array().map(Vec::len), Some(0));

    let view = sandbox.json(&["plant", "show", &plant_id.to_string()]);
    assert_eq!(view["health"]["status"], "EM ALERTA");
    assert_eq!(
        view["health"]["alert_messages"][0],
        "Temperatura alta no sensor Air: 31"
    );

    let alerting = sandbox.json(&["plant", "list", "--status", "em_alerta"]);
    assert_eq!(alerting["meta"]["total"], 1);
    let online = sandbox.json(&["plant", "list", "--status", "online"]);
    assert_eq!(online["meta"]["total"], 0);
    assert_eq!(online["meta"]["lastPage"], 0);
}

#[test]
fn test_sensor_show_lists_recent_readings() {
    let sandbox = Sandbox::new();
    sandbox.json(&["sensor", "add", "H-1", "Leaf", "--type", "humidity", "--unit", "%"]);
    sandbox.json(&["ingest", "H-1", "55", "--at", "2025-03-10T08:00:00Z"]);
    sandbox.json(&["ingest", "H-1", "60", "--at", "2025-03-10T09:00:00Z"]);

    let detail = sandbox.json(&["sensor", "show", "H-1", "-n", "1"]);
    assert_eq!(detail["hardware_id"], "H-1");
    let readings = detail["readings"].as_array().expect("readings");
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0]["value"], 60.0);
    // Last reading is far in the past
    assert_eq!(detail["health"]["status"], "OFFLINE");

    let text = sandbox.run(&["--no-color", "sensor", "show", "H-1"]);
    assert!(text.status.success());
    assert!(stdout(&text).contains("[OFFLINE]"));
}

#[test]
fn test_duplicate_hardware_id_fails() {
    let sandbox = Sandbox::new();
    sandbox.json(&["sensor", "add", "P-1", "Soil", "--type", "ph"]);

    let output = sandbox.run(&["sensor", "add", "P-1", "Other", "--type", "ph"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("P-1"));
}

#[test]
fn test_ingest_unknown_sensor_fails() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["ingest", "missing", "1"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Sensor not found"));
}

#[test]
fn test_ingest_rejects_bad_timestamp() {
    let sandbox = Sandbox::new();
    sandbox.json(&["sensor", "add", "L-1", "Lamp", "--type", "light"]);

    let output = sandbox.run(&["ingest", "L-1", "500", "--at", "noon"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("RFC 3339"));
}

// =============================================================================
// Rules and Alerts
// =============================================================================

#[test]
fn test_rule_fires_and_alert_resolves() {
    let sandbox = Sandbox::new();
    sandbox.json(&["sensor", "add", "T-9", "Greenhouse", "--type", "temperature"]);

    let rule = sandbox.json(&[
        "rule",
        "add",
        "Too hot",
        "--type",
        "temperature",
        "--condition",
        "greater_than",
        "--threshold",
        "30",
        "--severity",
        "high",
        "--sensor",
        "T-9",
    ]);
    assert_eq!(rule["condition"], "GREATER_THAN");

    let quiet = sandbox.json(&["ingest", "T-9", "25"]);
    assert_eq!(quiet["alerts"].as_array().map(Vec::len), Some(0));

    let fired = sandbox.json(&["ingest", "T-9", "35"]);
    let alert = &fired["alerts"][0];
    assert_eq!(alert["title"], "Too hot");
    assert_eq!(alert["severity"], "HIGH");
    assert_eq!(alert["status"], "ACTIVE");
    let alert_id = alert["id"].as_i64().expect("alert id").to_string();

    let active = sandbox.json(&["alert", "list", "--active"]);
    assert_eq!(active.as_array().map(Vec::len), Some(1));

    let resolved = sandbox.json(&["alert", "resolve", &alert_id, "--comment", "opened vents"]);
    assert_eq!(resolved["status"], "RESOLVED");
    assert_eq!(resolved["resolved_comment"], "opened vents");
    assert_eq!(resolved["events"].as_array().map(Vec::len), Some(2));

    let again = sandbox.run(&["alert", "resolve", &alert_id]);
    assert!(!again.status.success());
    assert!(stderr(&again).contains("already resolved"));

    let active = sandbox.json(&["alert", "list", "--active"]);
    assert_eq!(active.as_array().map(Vec::len), Some(0));
}

#[test]
fn test_rule_without_threshold_is_rejected() {
    let sandbox = Sandbox::new();
    sandbox.json(&["sensor", "add", "T-2", "Bench", "--type", "temperature"]);

    let output = sandbox.run(&[
        "rule",
        "add",
        "Hot",
        "--type",
        "temperature",
        "--condition",
        "gt",
        "--sensor",
        "T-2",
    ]);
    assert!(!output.status.success());
}

#[test]
fn test_watch_stops_after_count() {
    let sandbox = Sandbox::new();
    let plant = sandbox.json(&["plant", "add", "Fern"]);
    let plant_id = plant["id"].as_i64().expect("plant id").to_string();

    let output = sandbox.run(&[
        "--no-color",
        "watch",
        "--plant",
        &plant_id,
        "--interval",
        "1",
        "--count",
        "2",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert_eq!(text.lines().count(), 2);
    assert!(text.contains("[OFFLINE] 0/0 online"));
}
