//! Connection state machine and reconciliation loop.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use event_emitter_rs::EventEmitter;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::context::SyncContext;
use crate::error::SyncError;

use super::events::{ChannelEvent, RealtimeEvent};

/// Connection status, observable through [`ReconciliationChannel::watch_status`].
/// Illegal transitions are unrepresentable: the loop is the only writer and
/// only ever steps along the machine's edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChannelStatus::Disconnected => "disconnected",
            ChannelStatus::Connecting => "connecting",
            ChannelStatus::Connected => "connected",
            ChannelStatus::Reconnecting => "reconnecting",
        };
        f.write_str(s)
    }
}

/// Transport half of the channel: dials and authenticates a connection with
/// the session's bearer credential.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    async fn connect(&self, token: &str) -> Result<Box<dyn ChannelConnection>, SyncError>;
}

/// A live server connection. `next_event` resolving to `None` is a
/// transport drop.
#[async_trait]
pub trait ChannelConnection: Send {
    async fn next_event(&mut self) -> Option<ChannelEvent>;
}

/// The reconciliation channel. Owns the retry policy and the listener
/// registry; translates recognized events into cache invalidations through
/// the [`SyncContext`].
pub struct ReconciliationChannel {
    ctx: SyncContext,
    transport: Arc<dyn ChannelTransport>,
    max_attempts: u32,
    backoff: Duration,
    status_tx: watch::Sender<ChannelStatus>,
    closed_tx: watch::Sender<bool>,
    running: AtomicBool,
    listeners: Mutex<EventEmitter>,
}

/// Clears the running flag however the loop exits.
struct RunGuard<'a> {
    running: &'a AtomicBool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl ReconciliationChannel {
    /// Create a channel over the given transport. Reference retry policy:
    /// 5 attempts, fixed 1-second backoff.
    pub fn new(ctx: SyncContext, transport: Arc<dyn ChannelTransport>) -> Self {
        let (status_tx, _) = watch::channel(ChannelStatus::Disconnected);
        let (closed_tx, _) = watch::channel(false);
        Self {
            ctx,
            transport,
            max_attempts: 5,
            backoff: Duration::from_secs(1),
            status_tx,
            closed_tx,
            running: AtomicBool::new(false),
            listeners: Mutex::new(EventEmitter::new()),
        }
    }

    /// Set the retry budget for one connection lifetime.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the delay between reconnect attempts.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Current connection status.
    pub fn status(&self) -> ChannelStatus {
        *self.status_tx.borrow()
    }

    /// A receiver that observes every status transition.
    pub fn watch_status(&self) -> watch::Receiver<ChannelStatus> {
        self.status_tx.subscribe()
    }

    /// Register a listener for a named event. The callback receives the
    /// event payload as a JSON string. Returns the listener id for
    /// [`ReconciliationChannel::off`].
    pub fn on<F>(&self, event: &str, callback: F) -> String
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .on(event, callback)
    }

    /// Deregister a listener by id.
    pub fn off(&self, listener_id: &str) {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove_listener(listener_id);
    }

    /// Request teardown. A pending reconnect timer is cancelled; the run
    /// loop drops the connection and lands in `Disconnected`. No-op when
    /// the channel is not running.
    pub fn close(&self) {
        let _ = self.closed_tx.send(true);
    }

    /// Drive the channel until the retry budget is exhausted or
    /// [`ReconciliationChannel::close`] is called. Requires a session
    /// credential; a revoked credential (authentication failure on
    /// handshake) tears the channel down immediately. A second concurrent
    /// `run` is refused.
    ///
    /// After this returns the status is `Disconnected` and the channel may
    /// be run again with a fresh credential.
    pub async fn run(&self, token: &str) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("reconciliation channel already running");
            return;
        }
        let _guard = RunGuard {
            running: &self.running,
        };
        self.closed_tx.send_replace(false);
        let mut closed_rx = self.closed_tx.subscribe();

        let mut attempts = 0u32;
        self.set_status(ChannelStatus::Connecting);

        loop {
            if *closed_rx.borrow() {
                break;
            }

            match self.transport.connect(token).await {
                Ok(mut conn) => {
                    attempts = 0;
                    self.set_status(ChannelStatus::Connected);

                    let dropped = self.pump(conn.as_mut(), &mut closed_rx).await;
                    if !dropped {
                        // Explicit close: connection dropped here, no retry.
                        break;
                    }
                    debug!("channel transport dropped");
                }
                Err(err) if err.is_authentication() => {
                    warn!(%err, "channel credential rejected");
                    break;
                }
                Err(err) => {
                    debug!(%err, "channel handshake failed");
                }
            }

            attempts += 1;
            if attempts > self.max_attempts {
                warn!(attempts = self.max_attempts, "channel retry budget exhausted");
                break;
            }

            self.set_status(ChannelStatus::Reconnecting);
            tokio::select! {
                _ = async { let _ = closed_rx.wait_for(|closed| *closed).await; } => break,
                _ = tokio::time::sleep(self.backoff) => {}
            }
        }

        self.set_status(ChannelStatus::Disconnected);
    }

    /// Deliver events until the transport drops (returns `true`) or close
    /// is requested (returns `false`).
    async fn pump(
        &self,
        conn: &mut dyn ChannelConnection,
        closed_rx: &mut watch::Receiver<bool>,
    ) -> bool {
        loop {
            tokio::select! {
                _ = async { let _ = closed_rx.wait_for(|closed| *closed).await; } => return false,
                event = conn.next_event() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => return true,
                },
            }
        }
    }

    async fn handle_event(&self, event: ChannelEvent) {
        trace!(name = %event.name, "channel event received");
        self.emit(&event);

        match RealtimeEvent::parse(&event) {
            Some(parsed) => self.ctx.invalidate(&parsed.tags()).await,
            None => trace!(name = %event.name, "unrecognized channel event ignored"),
        }
    }

    fn emit(&self, event: &ChannelEvent) {
        let payload = event.payload.to_string();
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .emit(&event.name, payload);
    }

    fn set_status(&self, status: ChannelStatus) {
        if *self.status_tx.borrow() != status {
            debug!(%status, "channel status");
            self.status_tx.send_replace(status);
        }
    }
}
