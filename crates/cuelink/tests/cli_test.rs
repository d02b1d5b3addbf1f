//! Integration tests for the `cuelink` CLI binary.
//!
//! Argument parsing, help output, completions and config handling run
//! without a device; request-level tests point the binary at wiremock.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `cuelink` binary with env isolation.
///
/// Clears all `CUELINK_*` env vars and points the config file into
/// `home` so tests never touch the user's real configuration.
fn cuelink_cmd(home: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("cuelink");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env("CUELINK_CONFIG", home.path().join("config.toml"))
        .env_remove("CUELINK_PROFILE")
        .env_remove("CUELINK_HOST")
        .env_remove("CUELINK_PORT")
        .env_remove("CUELINK_OUTPUT")
        .env_remove("CUELINK_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Command aimed at a mock device.
fn device_cmd(home: &TempDir, server: &MockServer) -> assert_cmd::Command {
    let port = server.address().port().to_string();
    let mut cmd = cuelink_cmd(home);
    cmd.args(["--host", "127.0.0.1", "--port", &port]);
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn home() -> TempDir {
    tempfile::tempdir().unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = cuelink_cmd(&home()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    cuelink_cmd(&home()).arg("--help").assert().success().stdout(
        predicate::str::contains("media player")
            .and(predicate::str::contains("get"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("clear-queue")),
    );
}

#[test]
fn test_version_flag() {
    cuelink_cmd(&home())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cuelink"));
}

#[test]
fn test_completions() {
    for shell in ["bash", "fish"] {
        cuelink_cmd(&home())
            .args(["completions", shell])
            .assert()
            .success()
            .stdout(predicate::str::is_empty().not());
    }
    cuelink_cmd(&home())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = cuelink_cmd(&home()).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_device_command_without_config() {
    cuelink_cmd(&home())
        .args(["get", "DeviceState"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No player configured"));
}

#[test]
fn test_unknown_profile() {
    cuelink_cmd(&home())
        .args(["--profile", "foyer", "play"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("foyer"));
}

#[test]
fn test_invalid_output_format() {
    let output = cuelink_cmd(&home())
        .args(["--output", "invalid", "stores"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(text.contains("possible values"), "{text}");
}

#[test]
fn test_unreachable_device_exit_code() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port().to_string();
    drop(listener);

    cuelink_cmd(&home())
        .args(["--host", "127.0.0.1", "--port", &port, "play"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("Could not connect"));
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_stores_plain() {
    cuelink_cmd(&home())
        .args(["-o", "plain", "stores"])
        .assert()
        .success()
        .stdout(
            "DeviceInfo\nDeviceState\nIoState\nMediaFile\nPlaylist\nSettings\nTestPattern\n",
        );
}

#[test]
fn test_stores_table() {
    cuelink_cmd(&home())
        .args(["-o", "table", "stores"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/api/settings/patterns"));
}

#[test]
fn test_config_path_follows_env() {
    let home = home();
    let expected = home.path().join("config.toml");
    cuelink_cmd(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.display().to_string()));
}

#[test]
fn test_config_show_no_config() {
    cuelink_cmd(&home()).args(["config", "show"]).assert().success();
}

#[test]
fn test_config_init_and_use() {
    let home = home();
    cuelink_cmd(&home)
        .args(["--host", "10.0.0.9", "config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("profile 'default' written"));
    cuelink_cmd(&home)
        .args(["--host", "foyer.local", "--port", "8080", "config", "init", "--name", "foyer"])
        .assert()
        .success();

    let text = std::fs::read_to_string(home.path().join("config.toml")).unwrap();
    assert!(text.contains(r#"host = "10.0.0.9""#), "{text}");
    assert!(text.contains("[profiles.foyer]"), "{text}");

    cuelink_cmd(&home)
        .args(["-o", "plain", "config", "profiles"])
        .assert()
        .success()
        .stdout("default\nfoyer\n");

    cuelink_cmd(&home).args(["config", "use", "foyer"]).assert().success();
    cuelink_cmd(&home)
        .args(["-o", "yaml", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default_profile: foyer"));

    cuelink_cmd(&home)
        .args(["config", "use", "attic"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("default, foyer"));
}

#[test]
fn test_config_init_requires_host_when_not_interactive() {
    cuelink_cmd(&home())
        .args(["config", "init"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--host"));
}

// ── Device commands (mock REST) ─────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_get_field_plain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/device/state"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"playState": "playing", "isReady": true})),
        )
        .expect(1)
        .mount(&server)
        .await;

    device_cmd(&home(), &server)
        .args(["-o", "plain", "get", "DeviceState", "playState"])
        .assert()
        .success()
        .stdout("playing\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_whole_store_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/media"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"_id": "m1", "name": "intro.mp4"}])),
        )
        .mount(&server)
        .await;

    let output = device_cmd(&home(), &server)
        .args(["-o", "json-compact", "get", "MediaFile"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["_id"], "m1");
    assert_eq!(value[0]["name"], "intro.mp4");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_unknown_store() {
    let server = MockServer::start().await;
    device_cmd(&home(), &server)
        .args(["get", "Queue"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Unknown store 'Queue'").and(predicate::str::contains("DeviceInfo")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_settings_set_merges_current() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"masterVolume": 80, "loopQueue": true})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/settings"))
        .and(body_string_contains(r#""masterVolume":55"#))
        .and(body_string_contains(r#""loopQueue":true"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"masterVolume": 55})))
        .expect(1)
        .mount(&server)
        .await;

    device_cmd(&home(), &server)
        .args(["-o", "json-compact", "settings", "set", "masterVolume", "55"])
        .assert()
        .success()
        .stdout(r#"{"masterVolume":55}"#.to_owned() + "\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reboot_needs_confirmation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/settings/reboot"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    device_cmd(&home(), &server)
        .args(["settings", "reboot"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));

    device_cmd(&home(), &server)
        .args(["--yes", "settings", "reboot"])
        .assert()
        .success()
        .stdout("rebooting\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_queue_commands() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/queue/append-playlist"))
        .and(body_json(json!({"_id": "p1"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/queue/all"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/device/info/identify"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let home = home();
    device_cmd(&home, &server)
        .args(["load", "p1", "--append"])
        .assert()
        .success()
        .stdout("playlist p1 queued (append)\n");
    device_cmd(&home, &server)
        .args(["-q", "clear-queue"])
        .assert()
        .success()
        .stdout("");
    device_cmd(&home, &server).arg("identify").assert().success();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_into_folder() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/media"))
        .and(body_string_contains(r#"filename="clip.mov""#))
        .and(body_string_contains("f42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"_id": "m9", "name": "clip.mov"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let home = home();
    let file = home.path().join("clip.mov");
    std::fs::write(&file, b"not really a movie").unwrap();

    device_cmd(&home, &server)
        .args(["-o", "plain", "upload", "--folder", "f42"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("m9"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_missing_file() {
    let server = MockServer::start().await;
    device_cmd(&home(), &server)
        .args(["upload", "/nonexistent/clip.mov"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("clip.mov"));
}
