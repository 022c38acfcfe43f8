//! Integration tests for the devstack CLI

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command isolated from any devstack.yaml on the machine
fn devstack(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("devstack"));
    cmd.current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .env("HOME", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    devstack(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("rebuild-start"))
        .stdout(predicate::str::contains("logs"));
}

#[test]
fn test_no_verb_prints_usage() {
    let dir = TempDir::new().unwrap();
    devstack(&dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_unknown_verb_prints_usage() {
    let dir = TempDir::new().unwrap();
    devstack(&dir)
        .arg("deploy")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"))
        .stderr(predicate::str::contains("deploy"))
        .stderr(predicate::str::contains("status"))
        .stderr(predicate::str::contains("restart"))
        .stderr(predicate::str::contains("rebuild-start"));
}

#[test]
fn test_logs_requires_service() {
    let dir = TempDir::new().unwrap();
    devstack(&dir)
        .arg("logs")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing service for logs"));
}

#[test]
fn test_logs_rejects_unknown_service() {
    let dir = TempDir::new().unwrap();
    devstack(&dir)
        .args(["logs", "xyz"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'xyz'"));
}

#[test]
fn test_errors_reported_when_logging_is_off() {
    let dir = TempDir::new().unwrap();
    devstack(&dir)
        .env("RUST_LOG", "off")
        .args(["logs", "xyz"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'xyz'"));

    devstack(&dir)
        .env("RUST_LOG", "off")
        .arg("logs")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing service for logs"));
}

#[test]
fn test_missing_runtime_fails_every_verb() {
    let dir = TempDir::new().unwrap();
    let empty_path = dir.path().join("bin");
    std::fs::create_dir(&empty_path).unwrap();

    for args in [
        vec!["start"],
        vec!["stop"],
        vec!["restart"],
        vec!["status"],
        vec!["logs", "all"],
        vec!["rebuild"],
        vec!["rebuild-start"],
    ] {
        devstack(&dir)
            .env("PATH", &empty_path)
            .args(&args)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Container runtime unavailable"));
    }
}

#[test]
fn test_invalid_project_name() {
    let dir = TempDir::new().unwrap();
    devstack(&dir)
        .args(["--project", "Bad Name", "status"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_missing_explicit_config() {
    let dir = TempDir::new().unwrap();
    devstack(&dir)
        .args(["--config", "nowhere.yaml", "status"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Config file not found"));
}
