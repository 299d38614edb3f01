#![allow(clippy::unwrap_used, clippy::expect_used)]
// End-to-end tests: Engine against an in-process dashboard server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use url::Url;

use aquadash_core::{
    ConnectionState, Delivery, Device, DeviceDraft, DeviceMode, Dispatcher, Engine, EngineConfig,
    RenderSink,
};

const WAIT: Duration = Duration::from_secs(5);

// ── Helpers ─────────────────────────────────────────────────────────

type ServerSocket = WebSocketStream<TcpStream>;

async fn listen() -> (Url, mpsc::UnboundedReceiver<(String, ServerSocket)>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let path = Arc::new(Mutex::new(String::new()));
            let seen = Arc::clone(&path);
            let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                *seen.lock().unwrap() = req.uri().to_string();
                Ok(resp)
            };
            if let Ok(ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await {
                let uri = path.lock().unwrap().clone();
                if tx.send((uri, ws)).is_err() {
                    break;
                }
            }
        }
    });

    let url = Url::parse(&format!("ws://{addr}/ws")).unwrap();
    (url, rx)
}

fn config(endpoint: Url) -> EngineConfig {
    EngineConfig::new(endpoint, "sess-42".into())
        .unwrap()
        .with_reconnect_delay(Duration::from_millis(200))
        .with_connect_timeout(Duration::from_secs(2))
}

async fn accept(server: &mut mpsc::UnboundedReceiver<(String, ServerSocket)>) -> (String, ServerSocket) {
    timeout(WAIT, server.recv())
        .await
        .expect("timed out waiting for client")
        .expect("listener stopped")
}

async fn next_json(ws: &mut ServerSocket) -> Value {
    loop {
        let frame = timeout(WAIT, ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("client hung up")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn push(ws: &mut ServerSocket, payload: &Value) {
    ws.send(Message::text(payload.to_string())).await.unwrap();
}

/// Poll until `cond` holds; sink callbacks run on other tasks.
async fn eventually(mut cond: impl FnMut() -> bool) {
    timeout(WAIT, async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition never became true");
}

fn snapshot(devices: &[Value]) -> Value {
    json!({ "type": "all_devices", "data": devices })
}

/// Records renders and connection states; keeps the dispatcher it was given.
struct Recorder {
    dispatcher: Dispatcher,
    renders: Mutex<Vec<Vec<String>>>,
    states: Mutex<Vec<ConnectionState>>,
}

impl RenderSink for Recorder {
    fn render(&self, devices: &[Arc<Device>]) {
        let ids = devices.iter().map(|d| d.id.clone()).collect();
        self.renders.lock().unwrap().push(ids);
    }

    fn connection_changed(&self, state: ConnectionState) {
        self.states.lock().unwrap().push(state);
    }
}

/// Sink wrapper so the test can keep a handle to the recorder.
struct Shared(Arc<Recorder>);

impl RenderSink for Shared {
    fn render(&self, devices: &[Arc<Device>]) {
        self.0.render(devices);
    }

    fn connection_changed(&self, state: ConnectionState) {
        self.0.connection_changed(state);
    }
}

fn recording_engine(endpoint: Url) -> (Engine, Arc<Mutex<Option<Arc<Recorder>>>>) {
    let slot: Arc<Mutex<Option<Arc<Recorder>>>> = Arc::default();
    let out = Arc::clone(&slot);
    let engine = Engine::with_render_sink(config(endpoint), move |dispatcher| {
        let recorder = Arc::new(Recorder {
            dispatcher,
            renders: Mutex::new(Vec::new()),
            states: Mutex::new(Vec::new()),
        });
        *out.lock().unwrap() = Some(Arc::clone(&recorder));
        Shared(recorder)
    });
    (engine, slot)
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_session_id_is_sent_in_query() {
    let (url, mut server) = listen().await;
    let engine = Engine::new(config(url));
    engine.start().await.unwrap();

    let (uri, _ws) = accept(&mut server).await;
    assert_eq!(uri, "/ws?session_id=sess-42");

    engine.shutdown().await;
}

#[tokio::test]
async fn test_snapshot_reaches_store_and_sink() {
    let (url, mut server) = listen().await;
    let (engine, slot) = recording_engine(url);
    engine.start().await.unwrap();

    let (_, mut ws) = accept(&mut server).await;
    engine.wait_until_open(WAIT).await.unwrap();

    push(
        &mut ws,
        &snapshot(&[
            json!({"id":"d1","name":"North","location":"Roof","mode":"automatic","pumpStatus":true,"waterLevel":81.5}),
            json!({"id":"d2","name":"South","location":""}),
        ]),
    )
    .await;

    let devices = engine.wait_for_snapshot(1, WAIT).await.unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].mode, DeviceMode::Automatic);
    assert!(devices[0].pump_status);
    assert_eq!(devices[1].location, None);

    let recorder = slot.lock().unwrap().clone().unwrap();
    eventually(|| !recorder.renders.lock().unwrap().is_empty()).await;
    assert_eq!(*recorder.renders.lock().unwrap(), [vec!["d1".to_owned(), "d2".to_owned()]]);
    eventually(|| recorder.states.lock().unwrap().contains(&ConnectionState::Open)).await;

    engine.shutdown().await;
}

#[tokio::test]
async fn test_sink_dispatcher_sends_commands() {
    let (url, mut server) = listen().await;
    let (engine, slot) = recording_engine(url);
    engine.start().await.unwrap();

    let (_, mut ws) = accept(&mut server).await;
    engine.wait_until_open(WAIT).await.unwrap();
    push(&mut ws, &snapshot(&[json!({"id":"d1","name":"North","mode":"manual"})])).await;
    engine.wait_for_snapshot(1, WAIT).await.unwrap();

    let recorder = slot.lock().unwrap().clone().unwrap();
    assert!(recorder.dispatcher.toggle_mode("d1").unwrap().is_sent());
    assert_eq!(recorder.dispatcher.set_pump("d1", false), Delivery::Sent);

    assert_eq!(
        next_json(&mut ws).await,
        json!({"type":"command","device_id":"d1","command":"setMode","params":"automatic"})
    );
    assert_eq!(
        next_json(&mut ws).await,
        json!({"type":"command","device_id":"d1","command":"setPumpStatus","params":false})
    );

    engine.shutdown().await;
}

#[tokio::test]
async fn test_add_device_round_trip() {
    let (url, mut server) = listen().await;
    let engine = Engine::new(config(url));
    engine.start().await.unwrap();

    let (_, mut ws) = accept(&mut server).await;
    engine.wait_until_open(WAIT).await.unwrap();

    let store = engine.store();
    store.open_form();
    store.update_draft(DeviceDraft::new("  tank-7 ", " East ", ""));
    assert_eq!(engine.dispatcher().submit_form(), Ok(Delivery::Sent));
    assert!(!store.is_drafting());

    let sent = next_json(&mut ws).await;
    assert_eq!(
        sent,
        json!({"type":"add_device","device":{"id":"tank-7","name":"East","location":""}})
    );

    // The device only appears once the server echoes it back.
    assert!(store.device_by_id("tank-7").is_none());
    push(&mut ws, &snapshot(&[json!({"id":"tank-7","name":"East","location":""})])).await;
    engine.wait_for_snapshot(1, WAIT).await.unwrap();
    assert!(store.device_by_id("tank-7").is_some());

    engine.shutdown().await;
}

#[tokio::test]
async fn test_undecodable_payload_keeps_connection_open() {
    let (url, mut server) = listen().await;
    let engine = Engine::new(config(url));
    engine.start().await.unwrap();

    let (_, mut ws) = accept(&mut server).await;
    engine.wait_until_open(WAIT).await.unwrap();

    push(&mut ws, &snapshot(&[json!({"id":"d1","name":"North"})])).await;
    engine.wait_for_snapshot(1, WAIT).await.unwrap();

    ws.send(Message::text("{{{ not json")).await.unwrap();
    push(&mut ws, &json!({"type":"all_devices","data":[{"id":"d9"}]})).await;
    // A valid frame afterwards proves the bad ones were consumed.
    push(&mut ws, &json!({"type":"heartbeat"})).await;
    push(&mut ws, &snapshot(&[json!({"id":"d1","name":"North"})])).await;
    engine.wait_for_snapshot(2, WAIT).await.unwrap();

    assert_eq!(engine.decode_failures(), 2);
    assert_eq!(engine.connection_state(), ConnectionState::Open);
    assert_eq!(engine.store().device_count(), 1);
    assert_eq!(engine.connect_attempts(), 1);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_pending_delete_cleared_by_snapshot() {
    let (url, mut server) = listen().await;
    let engine = Engine::new(config(url));
    engine.start().await.unwrap();

    let (_, mut ws) = accept(&mut server).await;
    engine.wait_until_open(WAIT).await.unwrap();
    push(&mut ws, &snapshot(&[json!({"id":"d1","name":"A"}), json!({"id":"d2","name":"B"})])).await;
    engine.wait_for_snapshot(1, WAIT).await.unwrap();

    engine.store().request_delete("d1");
    push(&mut ws, &snapshot(&[json!({"id":"d2","name":"B"})])).await;
    engine.wait_for_snapshot(2, WAIT).await.unwrap();

    assert_eq!(engine.store().pending_delete(), None);
    assert_eq!(engine.dispatcher().submit_remove(), None);

    // Nothing was sent for the stale target.
    let extra = timeout(Duration::from_millis(200), ws.next()).await;
    assert!(extra.is_err(), "unexpected frame: {extra:?}");

    engine.shutdown().await;
}

#[tokio::test]
async fn test_reconnect_does_not_replay_and_resyncs() {
    let (url, mut server) = listen().await;
    let (engine, slot) = recording_engine(url);
    engine.start().await.unwrap();

    let (_, mut first) = accept(&mut server).await;
    engine.wait_until_open(WAIT).await.unwrap();
    first.close(None).await.unwrap();

    let mut rx = engine.subscribe_connection_state();
    timeout(WAIT, rx.wait_for(|s| *s == ConnectionState::Closed))
        .await
        .unwrap()
        .unwrap();

    // Dropped while closed, never replayed.
    assert_eq!(engine.dispatcher().set_pump("d1", true), Delivery::Dropped);

    let (_, mut second) = accept(&mut server).await;
    engine.wait_until_open(WAIT).await.unwrap();
    assert_eq!(engine.connect_attempts(), 2);

    push(&mut second, &snapshot(&[json!({"id":"d3","name":"C"})])).await;
    engine.wait_for_snapshot(1, WAIT).await.unwrap();
    let extra = timeout(Duration::from_millis(200), second.next()).await;
    assert!(extra.is_err(), "unexpected frame after reconnect: {extra:?}");

    let recorder = slot.lock().unwrap().clone().unwrap();
    eventually(|| recorder.states.lock().unwrap().last() == Some(&ConnectionState::Open)).await;
    assert!(recorder.states.lock().unwrap().contains(&ConnectionState::Closed));

    engine.shutdown().await;
}

#[tokio::test]
async fn test_registered_handler_receives_custom_messages() {
    let (url, mut server) = listen().await;
    let engine = Engine::new(config(url));
    let (tx, mut rx) = mpsc::unbounded_channel();
    engine.register_handler(
        "alert",
        Arc::new(move |payload: &Value| {
            let _ = tx.send(payload["message"].as_str().unwrap_or_default().to_owned());
        }),
    );
    engine.start().await.unwrap();

    let (_, mut ws) = accept(&mut server).await;
    engine.wait_until_open(WAIT).await.unwrap();
    push(&mut ws, &json!({"type":"alert","message":"Level low"})).await;

    let got = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(got, "Level low");

    engine.shutdown().await;
}
