//! End-to-end tests for the `aquadash` binary against an in-process
//! dashboard server that broadcasts a fixed snapshot every 100ms and
//! records what the client sends.
#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use assert_cmd::cargo::cargo_bin_cmd;
use futures_util::{SinkExt, StreamExt};
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::runtime::Runtime;
use tokio_tungstenite::tungstenite::Message;

// ── Fake server ─────────────────────────────────────────────────────

struct FakeServer {
    endpoint: String,
    received: Arc<Mutex<Vec<Value>>>,
    _runtime: Runtime,
}

impl FakeServer {
    fn start(devices: Value) -> Self {
        let runtime = Runtime::new().unwrap();
        let listener = runtime
            .block_on(TcpListener::bind("127.0.0.1:0"))
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let snapshot = json!({ "type": "all_devices", "data": devices }).to_string();

        let sink = Arc::clone(&received);
        runtime.spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let sink = Arc::clone(&sink);
                let snapshot = snapshot.clone();
                tokio::spawn(async move {
                    let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                        return;
                    };
                    let (mut tx, mut rx) = ws.split();
                    let mut tick = tokio::time::interval(Duration::from_millis(100));
                    loop {
                        tokio::select! {
                            _ = tick.tick() => {
                                if tx.send(Message::text(snapshot.clone())).await.is_err() {
                                    break;
                                }
                            }
                            frame = rx.next() => match frame {
                                Some(Ok(Message::Text(text))) => {
                                    let value = serde_json::from_str(text.as_str()).unwrap();
                                    sink.lock().unwrap().push(value);
                                }
                                Some(Ok(_)) => {}
                                _ => break,
                            },
                        }
                    }
                });
            }
        });

        Self {
            endpoint: format!("ws://{addr}/ws"),
            received,
            _runtime: runtime,
        }
    }

    /// Wait briefly for `n` client messages, then return them all.
    fn received(&self, n: usize) -> Vec<Value> {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let got = self.received.lock().unwrap().clone();
            if got.len() >= n || Instant::now() > deadline {
                return got;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }
}

fn tanks() -> Value {
    json!([
        { "id": "d1", "name": "North", "location": "Roof", "mode": "manual",
          "pumpStatus": false, "waterLevel": 35.0 },
        { "id": "d2", "name": "South", "mode": "automatic",
          "pumpStatus": true, "waterLevel": 80.0, "alert": "High water" }
    ])
}

fn aquadash(server: &FakeServer, dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("aquadash");
    cmd.env("AQUADASH_CONFIG", dir.path().join("config.toml"))
        .env_remove("AQUADASH_PROFILE")
        .env_remove("AQUADASH_OUTPUT")
        .env("AQUADASH_ENDPOINT", &server.endpoint)
        .env("AQUADASH_SESSION_ID", "test-session")
        .env("AQUADASH_TIMEOUT", "5")
        .env("NO_COLOR", "1");
    cmd
}

// ── Read commands ───────────────────────────────────────────────────

#[test]
fn test_list_plain_prints_ids_in_server_order() {
    let server = FakeServer::start(tanks());
    let dir = TempDir::new().unwrap();
    aquadash(&server, &dir)
        .args(["-o", "plain", "list"])
        .assert()
        .success()
        .stdout("d1\nd2\n");
}

#[test]
fn test_list_filters_by_mode() {
    let server = FakeServer::start(tanks());
    let dir = TempDir::new().unwrap();
    aquadash(&server, &dir)
        .args(["-o", "plain", "list", "--mode", "automatic"])
        .assert()
        .success()
        .stdout("d2\n");
}

#[test]
fn test_list_table_shows_placeholder_location() {
    let server = FakeServer::start(tanks());
    let dir = TempDir::new().unwrap();
    aquadash(&server, &dir)
        .arg("list")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Roof")
                .and(predicate::str::contains("—"))
                .and(predicate::str::contains("High water")),
        );
}

#[test]
fn test_show_unknown_device_is_not_found() {
    let server = FakeServer::start(tanks());
    let dir = TempDir::new().unwrap();
    aquadash(&server, &dir)
        .args(["show", "d9"])
        .assert()
        .code(4);
}

#[test]
fn test_watch_stops_after_count() {
    let server = FakeServer::start(tanks());
    let dir = TempDir::new().unwrap();
    let output = aquadash(&server, &dir)
        .args(["-o", "json-compact", "watch", "-n", "2", "--alerting"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "{stdout}");
    for line in lines {
        let devices: Value = serde_json::from_str(line).unwrap();
        assert_eq!(devices[0]["id"], "d2");
        assert_eq!(devices.as_array().unwrap().len(), 1);
    }
}

// ── Commands ────────────────────────────────────────────────────────

#[test]
fn test_pump_on_sends_set_pump_status() {
    let server = FakeServer::start(tanks());
    let dir = TempDir::new().unwrap();
    aquadash(&server, &dir)
        .args(["pump", "d1", "on"])
        .assert()
        .success();

    assert_eq!(
        server.received(1),
        vec![json!({
            "type": "command",
            "device_id": "d1",
            "command": "setPumpStatus",
            "params": true
        })]
    );
}

#[test]
fn test_pump_in_automatic_mode_is_sent_with_warning() {
    let server = FakeServer::start(tanks());
    let dir = TempDir::new().unwrap();
    aquadash(&server, &dir)
        .args(["pump", "d2", "off"])
        .assert()
        .success()
        .stderr(predicate::str::contains("automatic mode"));

    let sent = server.received(1);
    assert_eq!(sent[0]["command"], "setPumpStatus");
    assert_eq!(sent[0]["device_id"], "d2");
    assert_eq!(sent[0]["params"], false);
}

#[test]
fn test_mode_toggle_flips_current_mode() {
    let server = FakeServer::start(tanks());
    let dir = TempDir::new().unwrap();
    aquadash(&server, &dir)
        .args(["mode", "d2", "toggle"])
        .assert()
        .success();

    let sent = server.received(1);
    assert_eq!(sent[0]["command"], "setMode");
    assert_eq!(sent[0]["params"], "manual");
}

#[test]
fn test_add_sends_trimmed_device() {
    let server = FakeServer::start(tanks());
    let dir = TempDir::new().unwrap();
    aquadash(&server, &dir)
        .args(["add", "--id", " d3 ", "--name", "East ", "--location", "  "])
        .assert()
        .success();

    assert_eq!(
        server.received(1),
        vec![json!({
            "type": "add_device",
            "device": { "id": "d3", "name": "East", "location": "" }
        })]
    );
}

#[test]
fn test_remove_needs_yes_when_not_interactive() {
    let server = FakeServer::start(tanks());
    let dir = TempDir::new().unwrap();
    aquadash(&server, &dir)
        .args(["remove", "d1"])
        .assert()
        .code(2);
    assert!(server.received(1).is_empty());
}

#[test]
fn test_remove_with_yes_sends_remove_device() {
    let server = FakeServer::start(tanks());
    let dir = TempDir::new().unwrap();
    aquadash(&server, &dir)
        .args(["--yes", "remove", "d1"])
        .assert()
        .success();

    assert_eq!(
        server.received(1),
        vec![json!({ "type": "remove_device", "device_id": "d1" })]
    );
}

#[test]
fn test_send_passes_params_verbatim() {
    let server = FakeServer::start(tanks());
    let dir = TempDir::new().unwrap();
    aquadash(&server, &dir)
        .args(["send", "d1", "setThreshold", "--params", r#"{"low":20,"high":90}"#])
        .assert()
        .success();

    let sent = server.received(1);
    assert_eq!(sent[0]["command"], "setThreshold");
    assert_eq!(sent[0]["params"], json!({ "low": 20, "high": 90 }));
}
