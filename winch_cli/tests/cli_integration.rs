use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Minimal valid TOML config for sim mode; the store lives in the tempdir.
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let store = dir.path().join("position.bin");
    let toml = format!(
        r#"
[control]
period_ms = 10

[persistence]
idle_ms = 5000
path = "{}"

[[channels]]
name = "left"
driver_channel = 1
pin_a = 17
pin_b = 27
duty = 0.5
travel_mm = 25.0
spool_diameter_mm = 7.0
encoder_resolution = 525.0

[[channels]]
name = "right"
driver_channel = 2
pin_a = 23
pin_b = 24
duty = 0.5
travel_mm = 25.0
spool_diameter_mm = 7.0
encoder_resolution = 525.0
"#,
        store.display()
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn winch(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("winch_cli").unwrap();
    cmd.arg("--config").arg(cfg);
    cmd
}

#[test]
fn help_prints_usage() {
    Command::cargo_bin("winch_cli")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn status_reports_uninitialized_storage() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    winch(&cfg)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("uninitialized"));
}

#[test]
fn clear_then_status_shows_zeroed_record() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    winch(&cfg)
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("cleared"));

    winch(&cfg)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("left: count 0 (target 597)"));
}

#[test]
fn run_initializes_storage_and_honors_cycle_limit() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    winch(&cfg)
        .args(["run", "--cycles", "5"])
        .assert()
        .success();

    // The control loop's startup restore leaves a valid record behind.
    winch(&cfg)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("count").and(predicate::str::contains("597")));
}

#[test]
fn run_with_json_emits_telemetry_lines() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let output = winch(&cfg)
        .args(["--json", "run", "--cycles", "3"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    for line in lines {
        let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
        let channels = parsed["channels"].as_array().unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0]["target_steps"], 597);
    }
}

#[test]
fn smoke_moves_simulated_channels_forward() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let output = winch(&cfg)
        .args(["--json", "smoke", "--seconds", "0.2"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value =
        serde_json::from_str(String::from_utf8(output.stdout).unwrap().trim()).unwrap();
    for ch in parsed["channels"].as_array().unwrap() {
        assert!(ch["count"].as_i64().unwrap() > 0, "channel did not move: {ch}");
    }
}

#[rstest]
#[case("period_ms = 10", "period_ms = 0", "period_ms")]
#[case("duty = 0.5", "duty = 2.0", "duty")]
fn invalid_config_is_rejected(
    #[case] original: &str,
    #[case] broken: &str,
    #[case] needle: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let text = fs::read_to_string(&cfg).unwrap().replacen(original, broken, 1);
    fs::write(&cfg, text).unwrap();

    winch(&cfg)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains(needle));
}

#[test]
fn missing_config_fails_with_context() {
    let mut cmd = Command::cargo_bin("winch_cli").unwrap();
    cmd.args(["--config", "/nonexistent/winch.toml", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading config"));
}
