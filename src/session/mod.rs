//! Session controller: lazy listener startup, checkpoints, resume, detach.
//!
//! A [`Runstop`] owns one dump history, one observer set, and one
//! continuation gate. The listener starts on the first checkpoint. After
//! [`Runstop::detach`] every later checkpoint returns immediately and the
//! session never listens again.

pub mod gate;
pub mod registry;
pub mod store;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::RunstopConfig;
use crate::format::{InspectFormatter, ValueFormatter};
use crate::http;
use crate::models::dump::Dump;
use crate::models::event::ObserverEvent;
use crate::snapshot::Snapshot;
use crate::Result;

use self::gate::ContinuationGate;
use self::registry::{BroadcastRegistry, ObserverId};
use self::store::DumpStore;

/// Upper bound on waiting for open connections after the listener is told to stop.
const LISTENER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Running listener task and the token that stops it.
struct ListenerHandle {
    cancel: CancellationToken,
    task: JoinHandle<Result<()>>,
}

impl ListenerHandle {
    async fn shutdown(self) {
        self.cancel.cancel();
        let abort = self.task.abort_handle();
        match tokio::time::timeout(LISTENER_SHUTDOWN_TIMEOUT, self.task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(err))) => warn!(%err, "observer listener ended with an error"),
            Ok(Err(err)) => warn!(%err, "observer listener task failed"),
            Err(_) => {
                warn!("observer listener did not drain in time; aborting");
                abort.abort();
            }
        }
    }
}

/// Mutable session state. Never held across an `.await`.
#[derive(Default)]
struct SessionState {
    listener: Option<ListenerHandle>,
    port: Option<u16>,
    store: DumpStore,
    observers: BroadcastRegistry,
    gate: ContinuationGate,
    detached: bool,
}

struct Inner {
    config: RunstopConfig,
    formatter: Arc<dyn ValueFormatter>,
    state: Mutex<SessionState>,
    start_lock: tokio::sync::Mutex<()>,
}

/// Cloneable handle to one inspection session.
///
/// Once the first checkpoint starts the listener, the server task holds a
/// clone of this handle. Dropping every caller-held clone therefore does not
/// stop the listener: it keeps serving until [`Runstop::detach`] runs (from
/// code or from `POST /stop`) or the runtime shuts down.
#[derive(Clone)]
pub struct Runstop {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Runstop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Runstop")
            .field("port", &state.port)
            .field("dumps", &state.store.len())
            .field("observers", &state.observers.len())
            .field("detached", &state.detached)
            .finish_non_exhaustive()
    }
}

impl Runstop {
    /// Create a session using the default [`InspectFormatter`].
    #[must_use]
    pub fn new(config: RunstopConfig) -> Self {
        let formatter = InspectFormatter::from(&config.format);
        Self::with_formatter(config, formatter)
    }

    /// Create a session with a custom value formatter.
    #[must_use]
    pub fn with_formatter(config: RunstopConfig, formatter: impl ValueFormatter + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                formatter: Arc::new(formatter),
                state: Mutex::new(SessionState::default()),
                start_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &RunstopConfig {
        &self.inner.config
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `snapshot` as a dump and wait until an observer resumes.
    ///
    /// Starts the observer listener on first use. Once the session has
    /// detached this returns immediately without recording anything.
    /// Checkpoints must not overlap: await one before issuing the next.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Port` if no port can be bound for the listener,
    /// or `AppError::Io` for other bind failures.
    ///
    /// # Panics
    ///
    /// Panics if called while another checkpoint on this session is still
    /// waiting.
    pub async fn checkpoint(&self, snapshot: &Snapshot) -> Result<()> {
        if self.is_detached() {
            trace!("session detached; checkpoint passes through");
            return Ok(());
        }

        self.ensure_listening().await?;

        let content = self.inner.formatter.format(snapshot);
        let release = {
            let mut state = self.state();
            if state.detached {
                return Ok(());
            }
            let dump = state.store.append(content, Utc::now());
            let index = dump.index;
            let observers = state.observers.broadcast(&ObserverEvent::Dump(dump));
            debug!(index, observers, "dump recorded; waiting for resume");
            state.gate.arm()
        };

        // A dropped sender means the gate was discarded; nothing is left to wait for.
        let _ = release.await;
        Ok(())
    }

    /// Release the pending checkpoint, if there is one.
    ///
    /// Returns `true` when a checkpoint was released. With nothing pending
    /// the signal is dropped, not queued.
    pub fn resume(&self) -> bool {
        let released = self.state().gate.signal();
        debug!(released, "resume requested");
        released
    }

    /// Detach the session permanently.
    ///
    /// Releases any pending checkpoint, sends `stopped` to every observer
    /// and closes their streams, then after the configured grace delay
    /// stops the listener and clears the dump history. Later checkpoints
    /// return immediately. Calling this again is a no-op.
    pub async fn detach(&self) {
        let listener = {
            let mut state = self.state();
            if state.detached {
                return;
            }
            state.detached = true;
            let released = state.gate.force_release();
            let notified = state.observers.broadcast(&ObserverEvent::Stopped);
            state.observers.close_all();
            info!(released, observers = notified, "session detached");
            state.listener.take()
        };

        if let Some(listener) = listener {
            tokio::time::sleep(self.inner.config.detach_grace()).await;
            listener.shutdown().await;
        }

        {
            let mut state = self.state();
            state.store.clear();
            state.port = None;
        }

        info!("observer listener stopped");
        if self.inner.config.announce {
            eprintln!("\n→ runstop: stopped\n");
        }
    }

    /// Register a new observer.
    ///
    /// The returned subscription first yields the full dump history, then
    /// a `ready` event, then live events. After detach it yields a single
    /// `stopped` event and ends.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state();

        if state.detached {
            let _ = tx.send(ObserverEvent::Stopped.frame());
            return Subscription {
                id: None,
                rx,
                session: self.clone(),
            };
        }

        for dump in state.store.all() {
            let _ = tx.send(ObserverEvent::Dump(dump.clone()).frame());
        }
        let _ = tx.send(ObserverEvent::Ready.frame());
        let replayed = state.store.len();
        let id = state.observers.register(tx);
        debug!(observer = id, replayed, "observer joined");

        Subscription {
            id: Some(id),
            rx,
            session: self.clone(),
        }
    }

    /// Port of the running listener.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.state().port
    }

    /// Observer page URL of the running listener.
    #[must_use]
    pub fn url(&self) -> Option<String> {
        self.port().map(|port| observer_url(&self.inner.config, port))
    }

    /// Copy of the dump history, oldest first.
    #[must_use]
    pub fn dumps(&self) -> Vec<Dump> {
        self.state().store.all().to_vec()
    }

    /// Number of connected observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.state().observers.len()
    }

    /// Whether a checkpoint is waiting for resume.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state().gate.is_awaiting()
    }

    /// Whether the session has detached.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.state().detached
    }

    async fn ensure_listening(&self) -> Result<()> {
        let _starting = self.inner.start_lock.lock().await;
        {
            let state = self.state();
            if state.detached || state.listener.is_some() {
                return Ok(());
            }
        }

        let config = &self.inner.config;
        let (listener, port) = http::port::bind_first_free(config.host, config.start_port).await?;
        let cancel = CancellationToken::new();
        let task = http::spawn_server(listener, self.clone(), cancel.clone());

        let mut state = self.state();
        if state.detached {
            cancel.cancel();
            return Ok(());
        }
        state.listener = Some(ListenerHandle { cancel, task });
        state.port = Some(port);
        drop(state);

        let url = observer_url(config, port);
        info!(%url, "observer listener started");
        if config.announce {
            eprintln!("\n→ runstop: {url}\n");
        }
        Ok(())
    }

    fn leave(&self, id: ObserverId) {
        self.state().observers.unregister(id);
    }
}

fn observer_url(config: &RunstopConfig, port: u16) -> String {
    if config.host.is_loopback() {
        format!("http://localhost:{port}")
    } else {
        format!("http://{}", SocketAddr::new(config.host, port))
    }
}

/// One observer's view of the session event stream.
///
/// Dropping the subscription unregisters the observer.
pub struct Subscription {
    id: Option<ObserverId>,
    rx: mpsc::UnboundedReceiver<Bytes>,
    session: Runstop,
}

impl Subscription {
    /// Next encoded event frame, or `None` once the stream has closed.
    pub async fn next_frame(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.session.leave(id);
        }
    }
}

static GLOBAL: OnceLock<Runstop> = OnceLock::new();

/// Process-wide session configured from the environment.
///
/// Falls back to defaults when the environment configuration is invalid.
#[must_use]
pub fn global() -> &'static Runstop {
    GLOBAL.get_or_init(|| {
        let config = RunstopConfig::from_env().unwrap_or_else(|err| {
            warn!(%err, "invalid runstop environment configuration; using defaults");
            RunstopConfig::default()
        });
        Runstop::new(config)
    })
}

/// Checkpoint on the process-wide session.
///
/// # Errors
///
/// Returns `AppError::Port` or `AppError::Io` if the listener cannot start.
///
/// # Panics
///
/// Panics if another checkpoint on the process-wide session is still
/// waiting.
pub async fn checkpoint(snapshot: &Snapshot) -> Result<()> {
    global().checkpoint(snapshot).await
}
