//! Connection state machine and bounded-time connect.
//!
//! The supervisor owns the session's [`ConnectionState`]. Transitions are
//! driven exclusively by `ConnectionStatusChanged` notifications from the
//! transport — the supervisor never assumes a transition happened without
//! the corresponding event. The two exceptions are the fallbacks the
//! session contract defines: the connect-timeout fallback and the bounded
//! disconnect-grace fallback, both of which transition to `Disconnected`
//! locally and are published like any other transition.
//!
//! Every applied transition is published exactly once, in arrival order:
//! the state word, the state watch, and the subscriber broadcast are all
//! updated under a single lock scope, so no coalescing or reordering can
//! occur between them.

use crate::events::SessionEvent;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;
use tagstream_core::{DeviceUri, Error, Result};
use tagstream_transport::events::ConnectionStatus;
use tagstream_transport::traits::Transport;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use serde::{Deserialize, Serialize};

/// Connection state of a reader session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection. Initial state, and the terminal state of every
    /// failed or abandoned connect attempt.
    Disconnected,

    /// Connect request issued, waiting for the transport to establish
    /// the link.
    Connecting,

    /// Link established and reader responding.
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
        };
        write!(f, "{}", s)
    }
}

impl From<ConnectionStatus> for ConnectionState {
    fn from(status: ConnectionStatus) -> Self {
        match status {
            ConnectionStatus::Disconnected => Self::Disconnected,
            ConnectionStatus::Connecting => Self::Connecting,
            ConnectionStatus::Connected => Self::Connected,
        }
    }
}

struct SupervisorState {
    state: ConnectionState,
    last_detail: Option<String>,
}

/// Owns the connection state machine and its fan-out.
pub struct ConnectionSupervisor {
    inner: Mutex<SupervisorState>,
    state_tx: watch::Sender<ConnectionState>,
    events: broadcast::Sender<SessionEvent>,
    connect_gate: tokio::sync::Mutex<()>,
}

impl ConnectionSupervisor {
    /// Create a supervisor in the `Disconnected` state.
    pub(crate) fn new(events: broadcast::Sender<SessionEvent>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Mutex::new(SupervisorState {
                state: ConnectionState::Disconnected,
                last_detail: None,
            }),
            state_tx,
            events,
            connect_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.inner.lock().expect("supervisor lock poisoned").state
    }

    /// Subscribe to state changes for waiting.
    pub fn watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Apply a status notification from the transport.
    ///
    /// Forwards the transition to subscribers unconditionally — even a
    /// repeated status is published, since notifications are never
    /// coalesced.
    pub(crate) fn apply_status(&self, status: ConnectionStatus, detail: Option<String>) {
        let state = ConnectionState::from(status);
        let mut inner = self.inner.lock().expect("supervisor lock poisoned");
        debug!(from = %inner.state, to = %state, ?detail, "Connection transition");
        inner.state = state;
        inner.last_detail = detail.clone();
        let _ = self.events.send(SessionEvent::ConnectionChanged { state, detail });
        self.state_tx.send_replace(state);
    }

    /// Apply a local fallback transition to `Disconnected`.
    ///
    /// Only fires when the state still matches `expected`; a notification
    /// that won the race takes precedence.
    fn fallback_disconnect(&self, expected: ConnectionState, detail: &str) -> bool {
        let mut inner = self.inner.lock().expect("supervisor lock poisoned");
        if inner.state != expected {
            return false;
        }
        warn!(from = %inner.state, detail, "Applying fallback disconnect");
        inner.state = ConnectionState::Disconnected;
        inner.last_detail = Some(detail.to_string());
        let _ = self.events.send(SessionEvent::ConnectionChanged {
            state: ConnectionState::Disconnected,
            detail: Some(detail.to_string()),
        });
        self.state_tx.send_replace(ConnectionState::Disconnected);
        true
    }

    /// Connect to the device at `uri`, waiting at most `timeout`.
    ///
    /// Issues the non-blocking connect request and blocks the caller until
    /// a `Connected` notification arrives (success) or the timeout elapses
    /// (`Error::Timeout`). On timeout the attempt is NOT cancelled: state
    /// falls back to `Disconnected`, but a late `Connected` notification
    /// is still observed and reflected — force a disconnect if that is
    /// unwanted. A transport failure during the wait surfaces as
    /// `Error::TransportFailure` with the reported detail.
    ///
    /// # Errors
    ///
    /// `Error::Busy` when already connected or another connect is in
    /// progress; `Error::Timeout`; `Error::TransportFailure`.
    pub(crate) async fn connect<T: Transport>(
        &self,
        transport: &T,
        uri: &DeviceUri,
        timeout: Duration,
    ) -> Result<()> {
        let _gate = self.connect_gate.lock().await;

        if self.state() == ConnectionState::Connected {
            return Err(Error::busy("already connected"));
        }

        info!(%uri, ?timeout, "Connecting to reader");
        let mut state_rx = self.state_tx.subscribe();
        state_rx.mark_unchanged();
        transport.request_connect(uri)?;

        let wait = async {
            loop {
                if state_rx.changed().await.is_err() {
                    return Err(Error::transport("session shut down"));
                }
                match *state_rx.borrow_and_update() {
                    ConnectionState::Connected => return Ok(()),
                    ConnectionState::Disconnected => {
                        let detail = self
                            .inner
                            .lock()
                            .expect("supervisor lock poisoned")
                            .last_detail
                            .clone()
                            .unwrap_or_else(|| "connection failed".to_string());
                        return Err(Error::transport(detail));
                    }
                    ConnectionState::Connecting => {}
                }
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(Ok(())) => {
                info!(%uri, "Connected");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(%uri, error = %e, "Connect failed");
                Err(e)
            }
            Err(_) => {
                // A Connected notification may have landed right at the
                // boundary; check before falling back.
                self.fallback_disconnect(ConnectionState::Connecting, "connect timeout");
                if self.state() == ConnectionState::Connected {
                    info!(%uri, "Connected at timeout boundary");
                    return Ok(());
                }
                warn!(%uri, "Connect timeout");
                Err(Error::timeout(timeout.as_millis() as u64))
            }
        }
    }

    /// Disconnect from the device.
    ///
    /// Idempotent: calling while already disconnected is a no-op.
    /// Waits up to `grace` for the transport's `Disconnected`
    /// notification, then applies the fallback transition locally.
    pub(crate) async fn disconnect<T: Transport>(&self, transport: &T, grace: Duration) {
        if self.state() == ConnectionState::Disconnected {
            return;
        }

        info!("Disconnecting from reader");
        let mut state_rx = self.state_tx.subscribe();
        state_rx.mark_unchanged();
        transport.request_disconnect();

        let wait = async {
            loop {
                if *state_rx.borrow_and_update() == ConnectionState::Disconnected {
                    return;
                }
                if state_rx.changed().await.is_err() {
                    return;
                }
            }
        };

        if tokio::time::timeout(grace, wait).await.is_err() {
            let current = self.state();
            if current != ConnectionState::Disconnected {
                self.fallback_disconnect(current, "disconnect grace elapsed");
            }
        }
    }

    /// Wait until the state is `Disconnected`.
    ///
    /// Used to release callers blocked on a command when the connection
    /// goes away underneath them.
    pub(crate) async fn disconnected(&self) {
        let mut state_rx = self.state_tx.subscribe();
        loop {
            if *state_rx.borrow_and_update() == ConnectionState::Disconnected {
                return;
            }
            if state_rx.changed().await.is_err() {
                return;
            }
        }
    }
}
