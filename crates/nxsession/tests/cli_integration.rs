//! CLI integration tests
//!
//! Tests the nxsession CLI using assert_cmd. Every test points `HOME` at a
//! scratch directory so no real session directory is touched.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn nxsession(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("nxsession")
        .expect("Failed to locate nxsession binary - ensure it's built before running tests");
    cmd.env("HOME", home.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    let home = TempDir::new().unwrap();
    nxsession(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("nxsession"))
        .stdout(predicate::str::contains("--host"));
}

#[test]
fn test_cli_version() {
    let home = TempDir::new().unwrap();
    nxsession(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nxsession"));
}

#[test]
fn test_usage_errors_exit_one() {
    let home = TempDir::new().unwrap();
    for args in [
        &[][..],
        &["notadisplay"][..],
        &["5", "-t"][..],
        &["5", "-h"][..],
        &["5", "-C", "-h", "example.org"][..],
    ] {
        nxsession(&home).args(args).assert().code(1);
    }
}

#[test]
fn test_local_suspend_without_session() {
    let home = TempDir::new().unwrap();
    nxsession(&home)
        .args(["5", "-s"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already suspended"));
}

#[test]
fn test_remote_suspend_without_session() {
    let home = TempDir::new().unwrap();
    nxsession(&home)
        .args([":5", "-C", "-s", "-f"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already suspended"));
}

#[test]
fn test_remote_terminate_without_session() {
    let home = TempDir::new().unwrap();
    nxsession(&home)
        .args(["5", "-C", "-t"])
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with(
            "Error: No session to terminate on display 5",
        ));
}

#[test]
fn test_missing_explicit_config() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("missing.toml");
    nxsession(&home)
        .arg("--config")
        .arg(&missing)
        .args(["5", "-s"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_list_empty() {
    let home = TempDir::new().unwrap();
    nxsession(&home)
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions"));

    nxsession(&home)
        .args(["--list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[]"));
}

#[test]
fn test_list_reports_stale_session() {
    let home = TempDir::new().unwrap();
    let session = home.path().join(".nx").join("C-7");
    std::fs::create_dir_all(&session).unwrap();
    std::fs::write(session.join("pid"), "4194300\n").unwrap();

    nxsession(&home)
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains(":7"))
        .stdout(predicate::str::contains("terminated"));
}

#[test]
fn test_list_uses_configured_session_root() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("sessions");
    std::fs::create_dir_all(root.join("S-3")).unwrap();
    let config = home.path().join("nx.toml");
    std::fs::write(
        &config,
        format!("session_root = {:?}\n", root.to_string_lossy()),
    )
    .unwrap();

    nxsession(&home)
        .arg("--config")
        .arg(&config)
        .args(["--list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"local\""))
        .stdout(predicate::str::contains("\"absent\""));
}

#[test]
fn test_init_config_writes_defaults_once() {
    let home = TempDir::new().unwrap();
    let config = home.path().join(".nx").join("config.toml");

    nxsession(&home).arg("--init-config").assert().success();
    let written = std::fs::read_to_string(&config).unwrap();
    assert!(written.contains("nxagent"));
    assert!(written.contains("agent_start_timeout = 30000"));

    nxsession(&home).arg("--init-config").assert().code(1);
    nxsession(&home).args(["--init-config", "-f"]).assert().success();

    nxsession(&home)
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions"));
}
