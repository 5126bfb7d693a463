//! Integration tests for umbrella-cli
//!
//! These tests run the binary end-to-end against a throwaway config and
//! session location. No API server is needed: commands that would reach
//! the network are only exercised up to their local checks.

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

/// Get a Command for the umbrella binary
fn umbrella() -> Command {
    Command::cargo_bin("umbrella").unwrap()
}

/// Command isolated in `dir`, with no session and no env overrides
fn umbrella_in(dir: &TempDir) -> Command {
    let mut cmd = umbrella();
    cmd.env("UMBRELLA_CONFIG", dir.path().join("config.json"))
        .env("UMBRELLA_SESSION_PATH", dir.path().join("session.json"))
        .env_remove("UMBRELLA_API_URL")
        .env_remove("UMBRELLA_PASSWORD");
    cmd
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
#[serial]
fn test_cli_help() {
    umbrella()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("umbrella"))
        .stdout(predicate::str::contains("COMMAND").or(predicate::str::contains("Commands")));
}

#[test]
#[serial]
fn test_cli_version() {
    umbrella()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("umbrella"));
}

#[test]
#[serial]
fn test_subcommand_help() {
    for command in ["auth", "planning", "agent", "site", "candidature", "user", "config"] {
        umbrella()
            .args([command, "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains(command));
    }
}

#[test]
#[serial]
fn test_planning_create_help_documents_line_format() {
    umbrella()
        .args(["planning", "create", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--morning"))
        .stdout(predicate::str::contains("--evening"))
        .stdout(predicate::str::contains("AGENT_ID"));
}

#[test]
#[serial]
fn test_agent_by_site_help() {
    umbrella()
        .args(["agent", "by-site", "--help"])
        .assert()
        .success();
}

#[test]
#[serial]
fn test_user_toggle_lock_help() {
    umbrella()
        .args(["user", "toggle-lock", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("User ID"));
}

// =============================================================================
// Config Command Tests
// =============================================================================

#[test]
#[serial]
fn test_config_defaults() {
    let dir = TempDir::new().unwrap();
    umbrella_in(&dir)
        .args(["config", "get", "timeout_secs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("30"));
}

#[test]
#[serial]
fn test_config_set_then_get() {
    let dir = TempDir::new().unwrap();
    umbrella_in(&dir)
        .args(["config", "set", "api_base_url", "https://rh.umbrella.example/api/"])
        .assert()
        .success();

    umbrella_in(&dir)
        .args(["config", "get", "api_base_url"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://rh.umbrella.example/api"))
        .stdout(predicate::str::contains("api/\n").not());

    assert!(dir.path().join("config.json").exists());
}

#[test]
#[serial]
fn test_config_env_override() {
    let dir = TempDir::new().unwrap();
    umbrella_in(&dir)
        .env("UMBRELLA_API_URL", "http://127.0.0.1:9999/api")
        .args(["config", "get", "api_base_url"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://127.0.0.1:9999/api"));
}

#[test]
#[serial]
fn test_config_rejects_bad_values() {
    let dir = TempDir::new().unwrap();
    umbrella_in(&dir)
        .args(["config", "set", "timeout_secs", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout_secs"));

    umbrella_in(&dir)
        .args(["config", "set", "api_base_url", "ftp://example.com"])
        .assert()
        .failure();

    umbrella_in(&dir)
        .args(["config", "get", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
#[serial]
fn test_config_show_json() {
    let dir = TempDir::new().unwrap();
    umbrella_in(&dir)
        .args(["--format", "json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"key\": \"api_base_url\""))
        .stdout(predicate::str::contains("\"key\": \"session_token\""));
}

// =============================================================================
// Session Tests
// =============================================================================

#[test]
#[serial]
fn test_commands_require_login() {
    let dir = TempDir::new().unwrap();
    for args in [
        vec!["planning", "list"],
        vec!["agent", "list"],
        vec!["site", "list"],
        vec!["auth", "whoami"],
    ] {
        umbrella_in(&dir)
            .args(&args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Session expirée"));
    }
}

#[test]
#[serial]
fn test_logout_without_session() {
    let dir = TempDir::new().unwrap();
    umbrella_in(&dir)
        .args(["auth", "logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Aucune session active"));
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
#[serial]
fn test_invalid_command() {
    umbrella().arg("invalid-command").assert().failure();
}

#[test]
#[serial]
fn test_invalid_format() {
    umbrella()
        .args(["--format", "xml", "config", "show"])
        .assert()
        .failure();
}

#[test]
#[serial]
fn test_planning_create_requires_site_and_date() {
    umbrella()
        .args(["planning", "create", "--morning", "12"])
        .assert()
        .failure();
}
