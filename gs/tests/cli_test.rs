//! Binary tests for the `gs` command

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `gs` isolated from the user's config and log directories
fn gs(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gs").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_stages_offline_lists_fallback_script() {
    let home = TempDir::new().unwrap();
    gs(&home)
        .args(["stages", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fallback"))
        .stdout(predicate::str::contains("Welcome"))
        .stdout(predicate::str::contains("Body Scan"))
        .stdout(predicate::str::contains("6:00"));
}

#[test]
fn test_stages_offline_json() {
    let home = TempDir::new().unwrap();
    let output = gs(&home)
        .args(["stages", "--offline", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["source"], "fallback");
    assert_eq!(value["total_duration"], 360);
    assert_eq!(value["stages"].as_array().map(Vec::len), Some(5));
    assert_eq!(value["stages"][1]["id"], "breathing");
    assert_eq!(value["stages"][1]["duration"], 120);
}

#[test]
fn test_health_reports_unreachable_backend() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join(".guidedsession.yml"),
        "api:\n  base-url: http://127.0.0.1:9\n  max-retries: 0\n  timeout-ms: 500\n",
    )
    .unwrap();

    gs(&home)
        .arg("health")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Unreachable"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("bad.yml");
    std::fs::write(&config, "ambient:\n  volume: 3.0\n").unwrap();

    gs(&home)
        .args(["stages", "--offline", "-c"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_run_rejects_blank_reflection_before_starting() {
    let home = TempDir::new().unwrap();
    gs(&home)
        .args(["run", "--offline", "--reflect", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reflection must not be blank"))
        .stdout(predicate::str::contains("Session started").not());
}

#[test]
fn test_requires_subcommand() {
    let home = TempDir::new().unwrap();
    gs(&home).assert().failure();
}
