// ── Engine ──
//
// One engine per dashboard session. Owns the store, the connection and
// the dispatcher; nothing is global, so several engines can coexist.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use aquadash_api::{Connection, ConnectionState, FrameHandler};

use crate::config::EngineConfig;
use crate::dispatch::Dispatcher;
use crate::error::CoreError;
use crate::model::Device;
use crate::render::{NullSink, RenderSink};
use crate::router::{MessageHandler, MessageRouter};
use crate::store::DeviceStore;

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<EngineInner>`. Built idle; call
/// [`start()`](Self::start) to spawn the connection loop.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: EngineConfig,
    store: Arc<DeviceStore>,
    router: Arc<MessageRouter>,
    connection: Connection,
    dispatcher: Dispatcher,
    sink: Arc<dyn RenderSink>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Engine {
    /// Create an engine with no presenter attached.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_render_sink(config, |_| NullSink)
    }

    /// Create an engine whose presenter is built from the dispatcher.
    ///
    /// The sink receives every snapshot and every connection state change;
    /// the dispatcher is how it issues commands back.
    pub fn with_render_sink<S, F>(config: EngineConfig, build: F) -> Self
    where
        S: RenderSink + 'static,
        F: FnOnce(Dispatcher) -> S,
    {
        let store = Arc::new(DeviceStore::new());
        let router = Arc::new(MessageRouter::new(Arc::clone(&store)));
        let connection = Connection::new(config.session_url(), config.connection_options());
        let dispatcher = Dispatcher::new(Arc::clone(&store), Arc::new(connection.clone()));

        let sink: Arc<dyn RenderSink> = Arc::new(build(dispatcher.clone()));
        store.attach_render_sink(Arc::clone(&sink));

        Self {
            inner: Arc::new(EngineInner {
                config,
                store,
                router,
                connection,
                dispatcher,
                sink,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DeviceStore> {
        &self.inner.store
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the connection loop and the state forwarder.
    ///
    /// Returns immediately; the engine then runs until
    /// [`shutdown()`](Self::shutdown). Starting twice is a no-op.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Internal("engine has been shut down".into()));
        }

        let mut handles = self.inner.task_handles.lock().await;
        if !handles.is_empty() {
            debug!("engine already started");
            return Ok(());
        }

        info!(endpoint = %self.inner.config.endpoint, "starting engine");

        handles.push(spawn_state_forwarder(
            self.inner.connection.subscribe_state(),
            Arc::clone(&self.inner.sink),
            self.inner.cancel.clone(),
        ));

        let handler: Arc<dyn FrameHandler> = self.inner.router.clone();
        handles.push(self.inner.connection.spawn(handler, self.inner.cancel.clone()));

        Ok(())
    }

    /// Stop the connection loop and wait for background tasks to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        info!("engine stopped");
    }

    // ── Connection observation ───────────────────────────────────────

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.connection.state()
    }

    pub fn subscribe_connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection.subscribe_state()
    }

    pub fn connect_attempts(&self) -> u64 {
        self.inner.connection.connect_attempts()
    }

    pub fn decode_failures(&self) -> u64 {
        self.inner.router.decode_failures()
    }

    /// Register a handler for a non-snapshot message type.
    pub fn register_handler(&self, kind: impl Into<String>, handler: MessageHandler) {
        self.inner.router.register(kind, handler);
    }

    // ── Waiting helpers (one-shot callers) ───────────────────────────

    /// Wait until the connection is `Open`.
    pub async fn wait_until_open(&self, timeout: Duration) -> Result<(), CoreError> {
        let mut rx = self.subscribe_connection_state();
        match tokio::time::timeout(timeout, rx.wait_for(|s| *s == ConnectionState::Open)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(CoreError::Internal("connection dropped".into())),
            Err(_) => Err(CoreError::Timeout {
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    /// Wait until at least `count` snapshots have been applied in total,
    /// then return the current device set.
    pub async fn wait_for_snapshot(
        &self,
        count: u64,
        timeout: Duration,
    ) -> Result<Arc<Vec<Arc<Device>>>, CoreError> {
        let mut rx = self.inner.store.subscribe_snapshot_count();
        match tokio::time::timeout(timeout, rx.wait_for(|n| *n >= count)).await {
            Ok(Ok(_)) => Ok(self.inner.store.devices_snapshot()),
            Ok(Err(_)) => Err(CoreError::Internal("store dropped".into())),
            Err(_) => Err(CoreError::Timeout {
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    /// Wait for the snapshot after the current one.
    pub async fn next_snapshot(&self, timeout: Duration) -> Result<Arc<Vec<Arc<Device>>>, CoreError> {
        let next = self.inner.store.snapshot_count() + 1;
        self.wait_for_snapshot(next, timeout).await
    }
}

/// Forward every connection state change to the sink.
fn spawn_state_forwarder(
    mut rx: watch::Receiver<ConnectionState>,
    sink: Arc<dyn RenderSink>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let initial = *rx.borrow_and_update();
        sink.connection_changed(initial);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = *rx.borrow_and_update();
                    sink.connection_changed(state);
                }
            }
        }
    })
}
