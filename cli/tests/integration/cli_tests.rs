//! Argument parsing and local-only command paths.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

/// Binary with state and config pointed into `dir`.
fn scw_gpu(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("scw-gpu"));
    cmd.env("NO_COLOR", "1")
        .env("SCW_GPU_STATE", dir.path().join("state.json"))
        .env("SCW_GPU_CONFIG", dir.path().join("config.yaml"))
        .env_remove("RUST_LOG")
        .current_dir(dir.path());
    cmd
}

fn tempdir() -> TempDir {
    tempfile::tempdir().expect("tempdir")
}

// --- Usage ---

#[test]
fn test_no_args_shows_usage_and_exits_two() {
    let dir = tempdir();
    scw_gpu(&dir)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"))
        .stderr(predicate::str::contains("start"))
        .stderr(predicate::str::contains("download"));
}

#[test]
fn test_help_lists_commands() {
    let dir = tempdir();
    scw_gpu(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("upload"))
        .stdout(predicate::str::contains("stop"));
}

#[test]
fn test_unknown_command_fails() {
    let dir = tempdir();
    scw_gpu(&dir)
        .arg("reboot")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_upload_requires_path() {
    let dir = tempdir();
    scw_gpu(&dir)
        .arg("upload")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("<PATH>"));
}

#[test]
fn test_download_requires_path() {
    let dir = tempdir();
    scw_gpu(&dir)
        .arg("download")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("<PATH>"));
}

// --- Local-only paths ---

#[test]
#[serial]
fn test_stop_without_state_is_noop() {
    let dir = tempdir();
    scw_gpu(&dir)
        .arg("stop")
        .assert()
        .success()
        .stdout(predicate::str::contains("No instance found. Nothing to stop."));
    assert!(!dir.path().join("state.json").exists());
}

#[test]
#[serial]
fn test_no_color_env_accepts_any_value() {
    let dir = tempdir();
    for value in ["1", "yes", ""] {
        scw_gpu(&dir)
            .env("NO_COLOR", value)
            .args(["--no-color", "stop"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No instance found. Nothing to stop."));
    }
}

#[test]
#[serial]
fn test_upload_without_state_fails() {
    let dir = tempdir();
    scw_gpu(&dir)
        .args(["upload", "train.py"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No running instance found"));
}

#[test]
#[serial]
fn test_start_refuses_when_instance_recorded() {
    let dir = tempdir();
    std::fs::write(
        dir.path().join("state.json"),
        r#"{"id":"i-42","ip":"51.15.0.7"}"#,
    )
    .expect("write state");
    scw_gpu(&dir)
        .arg("start")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("i-42"))
        .stderr(predicate::str::contains("51.15.0.7"));
}

#[test]
#[serial]
fn test_corrupt_state_is_reported() {
    let dir = tempdir();
    std::fs::write(dir.path().join("state.json"), "not json").expect("write state");
    scw_gpu(&dir)
        .arg("stop")
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("Error:"));
}

#[test]
#[serial]
fn test_invalid_config_is_reported() {
    let dir = tempdir();
    std::fs::write(dir.path().join("config.yaml"), "notebook_port: 0\n").expect("write config");
    scw_gpu(&dir)
        .arg("stop")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("notebook_port"));
}
