//! Integration tests for the `ptit` CLI binary.
//!
//! Parsing, help, completions and error exits run without a backend.
//! The end-to-end cases point the binary at a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `ptit` binary with env isolation.
///
/// Clears all `PTIT_*` env vars and points the config file at a
/// nonexistent path so tests never touch the user's real configuration.
fn ptit_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("ptit");
    cmd.env("HOME", "/tmp/ptit-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/ptit-cli-test-nonexistent")
        .env("PTIT_CONFIG", "/tmp/ptit-cli-test-nonexistent/config.toml")
        .env_remove("PTIT_PROFILE")
        .env_remove("PTIT_API_URL")
        .env_remove("PTIT_TOKEN")
        .env_remove("PTIT_OUTPUT")
        .env_remove("PTIT_INSECURE")
        .env_remove("PTIT_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// A command already pointed at the mock server.
fn ptit_against(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = ptit_cmd();
    cmd.args(["--api-url", &format!("{}/api", server.uri()), "--token", "t0k"]);
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

async fn mount_devices(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .and(header("authorization", "Bearer t0k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 7, "name": "Temp sensor", "type": "sensor", "location": "A2", "status": "active" },
            { "id": 8, "name": "Gateway", "type": "gateway", "location": "B1", "status": "inactive" },
        ])))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = ptit_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    ptit_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("PTIT IoT Platform")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("users"))
            .and(predicate::str::contains("notifications")),
    );
}

#[test]
fn test_version_flag() {
    ptit_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ptit"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    ptit_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    ptit_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ptit"));
}

// ── Error handling ──────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = ptit_cmd().arg("gadgets").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_list_without_config_is_usage_error() {
    let output = ptit_cmd().args(["devices", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("config"), "Expected a config hint:\n{text}");
}

#[test]
fn test_missing_token_is_auth_error() {
    let output = ptit_cmd()
        .args(["--api-url", "http://127.0.0.1:9/api", "devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_malformed_filter_is_rejected_by_parser() {
    let output = ptit_cmd()
        .args(["devices", "list", "--filter", "no-equals-sign"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_config_show_without_file() {
    ptit_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_list_shows_page_footer() {
    let server = MockServer::start().await;
    mount_devices(&server).await;

    let mut cmd = ptit_against(&server);
    cmd.args(["devices", "list"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Temp sensor") && stdout.contains("Gateway"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Showing 1\u{2013}2 of 2"), "{stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_list_search_and_json() {
    let server = MockServer::start().await;
    mount_devices(&server).await;

    let mut cmd = ptit_against(&server);
    cmd.args(["-o", "json", "devices", "list", "--search", "GATE"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Gateway");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_filter_key_is_usage_error() {
    let server = MockServer::start().await;
    mount_devices(&server).await;

    let mut cmd = ptit_against(&server);
    cmd.args(["devices", "list", "--filter", "bogus=x"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_device_with_yes() {
    let server = MockServer::start().await;
    mount_devices(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/api/devices/7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = ptit_against(&server);
    cmd.args(["--yes", "devices", "delete", "7"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("device 7 deleted"), "{stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_without_yes_refuses_when_not_a_tty() {
    let server = MockServer::start().await;
    mount_devices(&server).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let mut cmd = ptit_against(&server);
    cmd.args(["devices", "delete", "7"]).write_stdin("");
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_missing_device_is_not_found() {
    let server = MockServer::start().await;
    mount_devices(&server).await;

    let mut cmd = ptit_against(&server);
    cmd.args(["devices", "get", "99"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(4));
    let text = combined_output(&output);
    assert!(text.contains("devices list"), "Expected a list hint:\n{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_token_maps_to_auth_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "expired" })))
        .mount(&server)
        .await;

    let mut cmd = ptit_against(&server);
    cmd.args(["devices", "list"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_report_counts_by_status() {
    let server = MockServer::start().await;
    mount_devices(&server).await;

    let mut cmd = ptit_against(&server);
    cmd.args(["-o", "plain", "report", "devices", "--by", "status"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("active\t1"), "{stdout}");
    assert!(stdout.contains("inactive\t1"), "{stdout}");
}
