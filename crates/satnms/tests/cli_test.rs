//! Integration tests for the `satnms` CLI binary.
//!
//! Argument parsing, offline commands, and a few NMS and modem round trips
//! against wiremock.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `satnms` binary with env isolation.
///
/// Clears all `SATNMS_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn satnms_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("satnms");
    cmd.env("HOME", "/tmp/satnms-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/satnms-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("SATNMS_PROFILE")
        .env_remove("SATNMS_NMS")
        .env_remove("SATNMS_USERNAME")
        .env_remove("SATNMS_PASSWORD")
        .env_remove("SATNMS_OUTPUT")
        .env_remove("SATNMS_INSECURE")
        .env_remove("SATNMS_TIMEOUT")
        .env_remove("SATNMS_POLL_INTERVAL_MS")
        .env_remove("SATNMS_SNAPSHOT_DIR");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "error_code": 0, "data": data }))
}

/// A wiremock NMS that accepts sessions without credentials.
async fn nms() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/realtime/tick"))
        .respond_with(ok(json!({ "tick": 1 })))
        .mount(&server)
        .await;
    server
}

/// Run the binary off the async runtime so wiremock keeps serving.
async fn run(args: Vec<String>) -> std::process::Output {
    tokio::task::spawn_blocking(move || satnms_cmd().args(args).output().unwrap())
        .await
        .unwrap()
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = satnms_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    satnms_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("object")
            .and(predicate::str::contains("wait"))
            .and(predicate::str::contains("snapshot"))
            .and(predicate::str::contains("device")),
    );
}

#[test]
fn test_version_flag() {
    satnms_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("satnms"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    satnms_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    satnms_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    satnms_cmd()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = satnms_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_object_get_without_config() {
    let output = satnms_cmd()
        .args(["object", "get", "station:0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("No NMS configured"), "got:\n{text}");
}

#[test]
fn test_unknown_profile() {
    let output = satnms_cmd()
        .args(["--profile", "lab", "object", "get", "station:0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Profile 'lab' not found"));
}

#[test]
fn test_reboot_requires_confirmation_when_not_interactive() {
    let output = satnms_cmd()
        .args(["device", "reboot", "--address", "127.0.0.1:9", "--model", "UHP-200"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("requires confirmation"));
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_enums_list_families() {
    satnms_cmd()
        .args(["enums", "list", "-o", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("object_state").and(predicate::str::contains("modulation")),
        );
}

#[test]
fn test_enums_list_members() {
    satnms_cmd()
        .args(["enums", "list", "object_state", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("0\tUp\n1\tDown\n"));
}

#[test]
fn test_enums_translate_both_ways() {
    satnms_cmd()
        .args(["enums", "translate", "object_state", "1", "-o", "plain"])
        .assert()
        .success()
        .stdout("Down\n");
    satnms_cmd()
        .args(["enums", "translate", "modulation", "8psk", "--to", "code", "-o", "plain"])
        .assert()
        .success()
        .stdout("2\n");
}

#[test]
fn test_enums_translate_unknown_value() {
    let output = satnms_cmd()
        .args(["enums", "translate", "object_state", "Sleeping"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Sleeping"));
}

#[test]
fn test_faults_decode_and_encode() {
    satnms_cmd()
        .args(["faults", "decode", "10", "-o", "plain"])
        .assert()
        .success()
        .stdout("RX1\nTX\n");
    satnms_cmd()
        .args(["faults", "decode", "0x80", "-o", "json-compact"])
        .assert()
        .success()
        .stdout("{\"bitmask\":128,\"faults\":[\"DOWN\"]}\n");
    satnms_cmd()
        .args(["faults", "encode", "rx1,tx", "-o", "plain"])
        .assert()
        .success()
        .stdout("10\n");
}

#[test]
fn test_snapshot_list_reads_local_store() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["baseline.cfg", "after-star.cfg", "notes.txt"] {
        std::fs::write(dir.path().join(name), b"cfg").unwrap();
    }

    satnms_cmd()
        .args(["--nms", "http://127.0.0.1:9", "snapshot", "list", "-o", "plain"])
        .arg("--snapshot-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout("after-star\nbaseline\n");
}

#[test]
fn test_config_path() {
    satnms_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("config.toml\n"));
}

// ── NMS round trips ─────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_object_get_prints_parameters() {
    let server = nms().await;
    Mock::given(method("GET"))
        .and(path("/api/object/get/station:0"))
        .respond_with(ok(json!({ "name": "rem1", "state": "Up", "faults": 0 })))
        .mount(&server)
        .await;

    let output = run(args(&[
        "--nms",
        &server.uri(),
        "object",
        "get",
        "station:0",
        "-o",
        "plain",
    ]))
    .await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "name=rem1\nstate=Up\nfaults=0\n"
    );

    let output = run(args(&[
        "--nms",
        &server.uri(),
        "object",
        "get",
        "station:0",
        "--field",
        "state",
        "-o",
        "plain",
    ]))
    .await;
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Up\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_object_create_uses_given_index() {
    let server = nms().await;
    Mock::given(method("POST"))
        .and(path("/api/object/insert/network:0"))
        .and(body_json(json!({
            "new_item": "teleport",
            "index": 3,
            "params": { "name": "tp", "tx_lo": 13050000 }
        })))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let output = run(args(&[
        "--nms",
        &server.uri(),
        "object",
        "create",
        "teleport",
        "--parent",
        "network:0",
        "--index",
        "3",
        "-P",
        "name=tp",
        "-P",
        "tx_lo=13050000",
        "-o",
        "plain",
    ]))
    .await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "teleport:3\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rejected_update_exits_with_rejection_code() {
    let server = nms().await;
    Mock::given(method("POST"))
        .and(path("/api/object/write/shaper:0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error_code": 11,
            "error_desc": "low exceeds high"
        })))
        .mount(&server)
        .await;

    let output = run(args(&[
        "--nms",
        &server.uri(),
        "object",
        "update",
        "shaper:0",
        "-P",
        "low=9",
    ]))
    .await;
    assert_eq!(output.status.code(), Some(6));
    assert!(combined_output(&output).contains("low exceeds high"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_wait_up_reached_and_timed_out() {
    let server = nms().await;
    Mock::given(method("GET"))
        .and(path("/api/object/get/station:0"))
        .respond_with(ok(json!({ "state": "Up" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/object/get/station:1"))
        .respond_with(ok(json!({ "state": "Down" })))
        .mount(&server)
        .await;

    let output = run(args(&[
        "--nms",
        &server.uri(),
        "--poll-interval-ms",
        "50",
        "wait",
        "up",
        "station:0",
        "-o",
        "plain",
    ]))
    .await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "station:0\n");

    let output = run(args(&[
        "--nms",
        &server.uri(),
        "--poll-interval-ms",
        "50",
        "wait",
        "up",
        "station:1",
        "--for",
        "300ms",
    ]))
    .await;
    assert_eq!(output.status.code(), Some(8));
    assert!(combined_output(&output).contains("did not reach Up"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_local_snapshot_create_writes_file() {
    let server = nms().await;
    Mock::given(method("GET"))
        .and(path("/api/config/export"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"network=0\n".to_vec()))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let mut list = args(&["--nms", &server.uri(), "snapshot", "create", "base", "--local"]);
    list.push("--snapshot-dir".into());
    list.push(dir.path().display().to_string());
    let output = run(list).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(read(&dir.path().join("base.cfg")), "network=0\n");
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

// ── Modem round trip ────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_device_state_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><p>State: operation</p><p>Faults: 0</p></html>"),
        )
        .mount(&server)
        .await;

    let output = run(args(&[
        "device",
        "state",
        "--address",
        &server.uri(),
        "--model",
        "UHP-200",
        "-o",
        "plain",
    ]))
    .await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "operation\n");
}
