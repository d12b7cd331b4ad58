//! Integration tests for the toolshed binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn setup_config(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().unwrap();
    for (name, content) in files {
        let path = temp.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    temp
}

fn toolshed(temp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("toolshed"));
    cmd.env_remove("BUILD_ENV")
        .env_remove("TOOLSHED_CONFIG_DIR")
        .env_remove("RUST_LOG")
        .arg("--config-dir")
        .arg(temp.path())
        .arg("--no-git")
        .arg("--no-color");
    cmd
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("toolshed"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("layered config"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("toolshed"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_requires_subcommand() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("toolshed"));
    cmd.assert().failure();
    Ok(())
}

#[test]
fn env_defaults_to_local() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_config(&[]);
    toolshed(&temp)
        .arg("env")
        .assert()
        .success()
        .stdout(predicate::str::contains("Environment: local"))
        .stdout(predicate::str::contains("default environment is `local`"));
    Ok(())
}

#[test]
fn env_reads_system_variable() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_config(&[]);
    toolshed(&temp)
        .env("DEPLOY_TARGET", "release/2.0")
        .args(["--env-var", "DEPLOY_TARGET", "env"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Environment: staging"))
        .stdout(predicate::str::contains("DEPLOY_TARGET"));
    Ok(())
}

#[test]
fn env_flag_beats_system_variable() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_config(&[]);
    toolshed(&temp)
        .env("BUILD_ENV", "production")
        .args(["--env", "staging", "env", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""environment": "staging""#));
    Ok(())
}

#[test]
fn locate_lists_files_in_load_order() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_config(&[
        ("db.yaml", "host: localhost"),
        ("db.production.yaml", "host: db.internal"),
        ("db.staging.yaml", "host: db.staging"),
    ]);
    toolshed(&temp)
        .args(["--env", "production", "locate", "db"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"db\.yaml\n.*db\.production\.yaml\n$")?)
        .stdout(predicate::str::contains("staging").not());
    Ok(())
}

#[test]
fn locate_missing_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_config(&[]);
    toolshed(&temp)
        .args(["locate", "db", "cache"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No config file found for 'db | cache'"));
    Ok(())
}

#[test]
fn show_merges_environment_override() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_config(&[
        ("services/api.yaml", "host: localhost\nport: 8080"),
        ("services/api.staging.json", r#"{"host": "api.staging"}"#),
    ]);
    toolshed(&temp)
        .args(["--env", "staging", "show", "services/api", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""host": "api.staging""#))
        .stdout(predicate::str::contains(r#""port": 8080"#));
    Ok(())
}

#[test]
fn show_reports_decode_errors() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_config(&[("broken.yaml", "key: [unclosed")]);
    toolshed(&temp)
        .args(["show", "broken"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to decode"));
    Ok(())
}
