//! Integration tests for the command-line interface.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn setup_config(config: &str) -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.yml");
    fs::write(&path, config).unwrap();
    (temp, path)
}

fn seed_cache(temp: &TempDir) {
    let ts = chrono::Utc::now().timestamp() as f64;
    let body = format!(
        r#"{{"ts": {ts}, "rows": [{{"Id": "Vendor.App1", "Name": "App One", "Version": "1.0.0", "Available": "1.2.0", "Source": "winget"}}]}}"#
    );
    fs::write(temp.path().join("last-upgrades.json"), body).unwrap();
}

fn upkeep(config: &PathBuf) -> Command {
    let mut cmd = Command::new(cargo_bin("upkeep"));
    cmd.arg("--config").arg(config).env("NO_COLOR", "1");
    cmd
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("upkeep"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("find and apply package updates"))
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("update"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("upkeep"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_requires_subcommand() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("upkeep"));
    cmd.assert().failure();
    Ok(())
}

#[test]
fn cache_show_on_empty_cache() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, config) = setup_config("");
    upkeep(&config)
        .args(["cache", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cache is empty"));
    Ok(())
}

#[test]
fn cache_show_json_lists_rows() -> Result<(), Box<dyn std::error::Error>> {
    let (temp, config) = setup_config("cache_ttl_minutes: 30\n");
    seed_cache(&temp);
    upkeep(&config)
        .args(["cache", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"fresh\": true"))
        .stdout(predicate::str::contains("Vendor.App1"));
    Ok(())
}

#[test]
fn cache_clear_removes_file() -> Result<(), Box<dyn std::error::Error>> {
    let (temp, config) = setup_config("");
    seed_cache(&temp);
    upkeep(&config)
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared the scan cache"));
    assert!(!temp.path().join("last-upgrades.json").exists());
    Ok(())
}

#[test]
fn scan_serves_fresh_cache() -> Result<(), Box<dyn std::error::Error>> {
    let (temp, config) = setup_config("");
    seed_cache(&temp);
    upkeep(&config)
        .args(["scan", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Id\": \"Vendor.App1\""))
        .stdout(predicate::str::contains("\"Available\": \"1.2.0\""));
    Ok(())
}

#[test]
fn config_path_can_come_from_environment() -> Result<(), Box<dyn std::error::Error>> {
    let (temp, config) = setup_config("");
    seed_cache(&temp);
    let mut cmd = Command::new(cargo_bin("upkeep"));
    cmd.env("UPKEEP_CONFIG", &config)
        .env("NO_COLOR", "1")
        .args(["cache", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Vendor.App1"));
    Ok(())
}

#[test]
fn scan_prints_table_from_cache() -> Result<(), Box<dyn std::error::Error>> {
    let (temp, config) = setup_config("");
    seed_cache(&temp);
    upkeep(&config)
        .arg("scan")
        .assert()
        .success()
        .stdout(predicate::str::contains("│ App One"))
        .stdout(predicate::str::contains("1 update(s) available"));
    Ok(())
}

#[test]
fn update_skips_invalid_identifier_in_dry_run() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, config) = setup_config("");
    upkeep(&config)
        .args(["update", "bad id", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped"))
        .stdout(predicate::str::contains("0 of 1 package(s) updated"))
        .stdout(predicate::str::contains("Dry run"));
    Ok(())
}

#[test]
fn update_writes_text_report() -> Result<(), Box<dyn std::error::Error>> {
    let (temp, config) = setup_config("");
    let report = temp.path().join("reports").join("run.txt");
    upkeep(&config)
        .args(["update", "1.2.3", "--dry-run", "--format", "text", "--report"])
        .arg(&report)
        .assert()
        .success();
    let text = fs::read_to_string(&report)?;
    assert!(text.contains("Skipped\n  - 1.2.3"));
    Ok(())
}

#[test]
fn missing_config_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    upkeep(&temp.path().join("nope.yml"))
        .args(["cache", "show"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration not found"));
    Ok(())
}

#[test]
fn invalid_settings_fail() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, config) = setup_config("scan_timeout_secs: 0\n");
    upkeep(&config)
        .args(["cache", "show"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("scan_timeout_secs"));
    Ok(())
}

#[test]
fn malformed_config_fails() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, config) = setup_config("cache_ttl_minutes: [not, a, number]\n");
    upkeep(&config)
        .args(["cache", "show"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to parse config"));
    Ok(())
}
