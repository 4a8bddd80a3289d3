//! Continuous inventory stream lifecycle.
//!
//! The reader runs the stream autonomously and stops it on its own after
//! a fixed duration; the controller reacts to the stop notification by
//! re-issuing the start command, unless a caller-initiated stop is
//! pending. There is deliberately no local timer mirroring the device's
//! auto-stop — only the explicit notification drives the restart.
//!
//! Restart commands are issued from a spawned task, never from the
//! notification path itself, which must not block.

use crate::events::SessionEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tagstream_core::{Error, Result};
use tagstream_transport::command::{Command, CommandChannel};
use tagstream_transport::traits::Transport;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

/// State of the continuous inventory stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamState {
    /// No stream active.
    Idle,

    /// Stream running on the device.
    Running,

    /// The device stopped the stream on its own; a restart is pending or
    /// has failed and awaits the next attempt.
    StoppedByDevice,

    /// A caller requested a stop; waiting for the device's confirmation.
    Stopping,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::StoppedByDevice => "StoppedByDevice",
            Self::Stopping => "Stopping",
        };
        write!(f, "{}", s)
    }
}

/// Orchestrates the continuous inventory stream.
pub struct StreamController<T: Transport> {
    state: Mutex<StreamState>,
    state_tx: watch::Sender<StreamState>,
    channel: Arc<CommandChannel<T>>,
    events: broadcast::Sender<SessionEvent>,
    stop_grace: Duration,
}

impl<T: Transport> StreamController<T> {
    pub(crate) fn new(
        channel: Arc<CommandChannel<T>>,
        events: broadcast::Sender<SessionEvent>,
        stop_grace: Duration,
    ) -> Self {
        let (state_tx, _) = watch::channel(StreamState::Idle);
        Self {
            state: Mutex::new(StreamState::Idle),
            state_tx,
            channel,
            events,
            stop_grace,
        }
    }

    /// Current stream state.
    pub fn state(&self) -> StreamState {
        *self.state.lock().expect("stream lock poisoned")
    }

    fn lock(&self) -> MutexGuard<'_, StreamState> {
        self.state.lock().expect("stream lock poisoned")
    }

    fn set_state(&self, guard: &mut MutexGuard<'_, StreamState>, state: StreamState) {
        debug!(from = %**guard, to = %state, "Stream transition");
        **guard = state;
        self.state_tx.send_replace(state);
    }

    /// Start the stream.
    ///
    /// Legal from `Idle` and from `StoppedByDevice` (manual retry after a
    /// failed auto-restart).
    ///
    /// # Errors
    ///
    /// `Error::Disconnected` when not connected; `Error::Busy` while the
    /// stream is running or a stop is pending; command errors from the
    /// device.
    pub(crate) async fn start(&self, connected: bool) -> Result<()> {
        if !connected {
            return Err(Error::Disconnected);
        }
        match self.state() {
            StreamState::Idle | StreamState::StoppedByDevice => {}
            StreamState::Running => return Err(Error::busy("stream already running")),
            StreamState::Stopping => return Err(Error::busy("stream stop pending")),
        }

        self.channel
            .send(Command::StartInventoryStream)
            .await?
            .into_ack()?;

        let mut guard = self.lock();
        self.set_state(&mut guard, StreamState::Running);
        info!("Inventory stream started");
        Ok(())
    }

    /// Stop the stream and wait for the device's confirmation.
    ///
    /// Transitions to `Stopping`, issues the stop command, and settles at
    /// `Idle` once the device confirms or the grace period elapses.
    /// Stopping an idle stream is a no-op.
    ///
    /// # Errors
    ///
    /// `Error::Busy` when a stop is already pending; command errors from
    /// the device (the state is forced to `Idle` in that case).
    pub(crate) async fn stop(&self) -> Result<()> {
        {
            let mut guard = self.lock();
            match *guard {
                StreamState::Idle => return Ok(()),
                StreamState::Stopping => return Err(Error::busy("stream stop pending")),
                StreamState::Running | StreamState::StoppedByDevice => {
                    self.set_state(&mut guard, StreamState::Stopping);
                }
            }
        }

        let sent = self
            .channel
            .send(Command::StopInventoryStream)
            .await
            .and_then(ack);
        if let Err(e) = sent {
            warn!(error = %e, "Stop command failed, forcing stream idle");
            let mut guard = self.lock();
            self.set_state(&mut guard, StreamState::Idle);
            return Err(e);
        }

        // Wait for the device's StreamStopped confirmation, bounded.
        let mut state_rx = self.state_tx.subscribe();
        let wait = async {
            loop {
                if *state_rx.borrow_and_update() == StreamState::Idle {
                    return;
                }
                if state_rx.changed().await.is_err() {
                    return;
                }
            }
        };
        if tokio::time::timeout(self.stop_grace, wait).await.is_err() {
            let mut guard = self.lock();
            if *guard == StreamState::Stopping {
                warn!("Stop confirmation grace elapsed, forcing stream idle");
                self.set_state(&mut guard, StreamState::Idle);
            }
        }

        info!("Inventory stream stopped");
        Ok(())
    }

    /// Handle a device-initiated stream stop notification.
    ///
    /// With a caller stop pending this is the confirmation and the stream
    /// settles at `Idle`. While `Running` it transitions to
    /// `StoppedByDevice` and exactly one restart command is issued from a
    /// spawned task; a restart failure is reported to subscribers and the
    /// controller stays in `StoppedByDevice` awaiting the next manual or
    /// automatic attempt.
    pub(crate) fn on_device_stopped(self: &Arc<Self>) {
        let restart = {
            let mut guard = self.lock();
            match *guard {
                StreamState::Stopping => {
                    self.set_state(&mut guard, StreamState::Idle);
                    false
                }
                StreamState::Running => {
                    self.set_state(&mut guard, StreamState::StoppedByDevice);
                    true
                }
                // Late or duplicate stop notification
                StreamState::Idle | StreamState::StoppedByDevice => false,
            }
        };

        if !restart {
            return;
        }

        let controller = Arc::clone(self);
        tokio::spawn(async move {
            debug!("Restarting inventory stream after device stop");
            let result = controller
                .channel
                .send(Command::StartInventoryStream)
                .await
                .and_then(ack);
            match result {
                Ok(()) => {
                    let mut guard = controller.lock();
                    // A stop requested meanwhile owns the state from here
                    if *guard == StreamState::StoppedByDevice {
                        controller.set_state(&mut guard, StreamState::Running);
                    }
                }
                Err(e) => {
                    let error = Error::restart_failed(e.to_string());
                    warn!(%error, "Failed to restart inventory stream");
                    let _ = controller.events.send(SessionEvent::StreamRestartFailed {
                        detail: error.to_string(),
                    });
                }
            }
        });
    }

    /// Force the stream to `Idle` without waiting for the device.
    ///
    /// Used when the connection goes away while the stream is active.
    pub(crate) fn force_idle(&self) {
        let mut guard = self.lock();
        if *guard != StreamState::Idle {
            info!(from = %*guard, "Forcing stream idle");
            self.set_state(&mut guard, StreamState::Idle);
        }
    }
}

fn ack(response: tagstream_transport::command::CommandResponse) -> Result<()> {
    response.into_ack()
}
