//! Reader session facade.
//!
//! [`ReaderSession`] wires the supervisor, tag store, and stream
//! controller together and runs the event-dispatch task that consumes the
//! transport's notification feed. Commands are issued sequentially from
//! caller context through the command channel; notification handling
//! never blocks the feed — work that needs to issue commands (such as a
//! stream restart) is handed off to a spawned task.

use crate::config::SessionConfig;
use crate::events::SessionEvent;
use crate::store::{TagRecord, TagStore};
use crate::stream::{StreamController, StreamState};
use crate::supervisor::{ConnectionState, ConnectionSupervisor};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tagstream_core::{DeviceUri, Error, Result};
use tagstream_transport::command::{Command, CommandChannel};
use tagstream_transport::events::{Advertisement, ConnectionStatus, LogLevel, ReaderEvent};
use tagstream_transport::traits::Transport;
use tagstream_transport::types::{
    InventoryParams, InventoryReadConfig, ModuleSetup, ReaderInfo, SetupPatch,
};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Session manager for one reader.
///
/// Owns the connection lifecycle, the tag store, and the inventory stream
/// controller. All device-bound commands flow through the internal
/// command channel, one at a time.
///
/// # Examples
///
/// ```
/// use tagstream_client::{ReaderSession, SessionConfig, ConnectionState};
/// use tagstream_transport::mock::MockTransport;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> tagstream_core::Result<()> {
/// let (transport, handle, events) = MockTransport::new();
/// let session = ReaderSession::new(transport, events, SessionConfig::default());
/// assert_eq!(session.connection_state(), ConnectionState::Disconnected);
///
/// let target = "ser://com4".parse()?;
/// let connect = session.connect(&target);
/// let confirm = handle.complete_connect();
/// let (connected, _) = tokio::join!(connect, confirm);
/// connected?;
/// assert_eq!(session.connection_state(), ConnectionState::Connected);
/// # Ok(())
/// # }
/// ```
pub struct ReaderSession<T: Transport> {
    transport: Arc<T>,
    pub(crate) channel: Arc<CommandChannel<T>>,
    supervisor: Arc<ConnectionSupervisor>,
    stream: Arc<StreamController<T>>,
    store: Arc<TagStore>,
    events: broadcast::Sender<SessionEvent>,
    config: SessionConfig,
    discovery_tx: Arc<Mutex<Option<mpsc::Sender<Advertisement>>>>,
    dispatch: JoinHandle<()>,
}

impl<T: Transport> ReaderSession<T> {
    /// Create a session over a transport and its notification feed.
    ///
    /// Spawns the event-dispatch task; it runs until the transport side
    /// of the feed is dropped or the session is dropped.
    pub fn new(
        transport: T,
        notifications: mpsc::Receiver<ReaderEvent>,
        config: SessionConfig,
    ) -> Self {
        let transport = Arc::new(transport);
        let channel = Arc::new(CommandChannel::new(Arc::clone(&transport)));
        let (events, _) = broadcast::channel(config.subscriber_capacity);
        let supervisor = Arc::new(ConnectionSupervisor::new(events.clone()));
        let stream = Arc::new(StreamController::new(
            Arc::clone(&channel),
            events.clone(),
            config.stop_grace,
        ));
        let store = Arc::new(TagStore::new());
        let discovery_tx = Arc::new(Mutex::new(None));

        let dispatch = tokio::spawn(dispatch_events(
            notifications,
            Arc::clone(&supervisor),
            Arc::clone(&stream),
            Arc::clone(&store),
            events.clone(),
            Arc::clone(&discovery_tx),
        ));

        Self {
            transport,
            channel,
            supervisor,
            stream,
            store,
            events,
            config,
            discovery_tx,
            dispatch,
        }
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.supervisor.state()
    }

    /// Current stream state.
    pub fn stream_state(&self) -> StreamState {
        self.stream.state()
    }

    /// Subscribe to session events.
    ///
    /// Every state transition, tag-update notification, and asynchronous
    /// failure is delivered exactly once per occurrence, in processing
    /// order.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// The session's tag store.
    pub fn tags(&self) -> Arc<TagStore> {
        Arc::clone(&self.store)
    }

    /// Connect using the configured timeout.
    ///
    /// # Errors
    ///
    /// See [`connect_with_timeout`](Self::connect_with_timeout).
    pub async fn connect(&self, uri: &DeviceUri) -> Result<()> {
        self.connect_with_timeout(uri, self.config.connect_timeout)
            .await
    }

    /// Connect, waiting at most `timeout` for the reader to come up.
    ///
    /// The attempt is not cancelled on timeout; a late `Connected`
    /// notification is still reflected in state and should be answered
    /// with [`disconnect`](Self::disconnect) if unwanted.
    ///
    /// # Errors
    ///
    /// `Error::Timeout` when no `Connected` notification arrives in time
    /// (state is left at `Disconnected`); `Error::TransportFailure` when
    /// the transport reports a connection failure; `Error::Busy` when
    /// already connected or a connect is in progress.
    pub async fn connect_with_timeout(&self, uri: &DeviceUri, timeout: Duration) -> Result<()> {
        self.supervisor
            .connect(self.transport.as_ref(), uri, timeout)
            .await
    }

    /// Disconnect from the reader. Idempotent.
    ///
    /// Forces a running stream to idle without waiting for device
    /// confirmation and releases any caller blocked in
    /// [`run_inventory`](Self::run_inventory) with `Error::Disconnected`.
    pub async fn disconnect(&self) {
        self.supervisor
            .disconnect(self.transport.as_ref(), self.config.disconnect_grace)
            .await;
    }

    /// Start the continuous inventory stream.
    ///
    /// Results accumulate in the tag store as they arrive; subscribers
    /// get a [`SessionEvent::TagsUpdated`] per ingested round. When the
    /// device stops the stream on its own it is restarted automatically.
    ///
    /// # Errors
    ///
    /// `Error::Disconnected` when not connected; `Error::Busy` while
    /// running or stopping.
    pub async fn start_stream(&self) -> Result<()> {
        self.stream
            .start(self.connection_state() == ConnectionState::Connected)
            .await
    }

    /// Stop the continuous inventory stream.
    ///
    /// # Errors
    ///
    /// `Error::Busy` when a stop is already pending; command errors from
    /// the device.
    pub async fn stop_stream(&self) -> Result<()> {
        self.stream.stop().await
    }

    /// Run one blocking inventory round and return the resulting store
    /// snapshot.
    ///
    /// Blocks until the device completes the round, which may take
    /// several seconds depending on settings and antennas. Disconnecting
    /// while blocked releases the caller with `Error::Disconnected`.
    ///
    /// # Errors
    ///
    /// `Error::Busy` while the stream is active; `Error::Disconnected`
    /// when not connected or disconnected mid-round; parameter and
    /// command errors.
    pub async fn run_inventory(&self, params: InventoryParams) -> Result<Vec<TagRecord>> {
        params.validate()?;
        self.require_connected()?;
        if self.stream.state() != StreamState::Idle {
            return Err(Error::busy("inventory stream active"));
        }

        let round = async {
            self.channel
                .send(Command::Inventory(params))
                .await?
                .into_summary()?;
            self.channel.send(Command::FetchTags).await?.into_tags()
        };

        let observations = tokio::select! {
            result = round => result?,
            () = self.supervisor.disconnected() => return Err(Error::Disconnected),
        };

        debug!(count = observations.len(), "Inventory round fetched");
        for observation in observations {
            self.store.ingest(observation);
        }
        Ok(self.store.snapshot())
    }

    /// Clear device-side tag memory and the local tag store.
    ///
    /// # Errors
    ///
    /// `Error::Busy` while the stream is active — the store may only be
    /// cleared with no ingestion in flight.
    pub async fn clear_tags(&self) -> Result<()> {
        self.require_connected()?;
        if self.stream.state() != StreamState::Idle {
            return Err(Error::busy("inventory stream active"));
        }
        self.channel.send(Command::ClearTags).await?.into_ack()?;
        self.store.clear();
        Ok(())
    }

    /// Clear the store, run one inventory round, and return the tag with
    /// the best signal, if any was seen.
    pub async fn find_nearest_tag(&self) -> Result<Option<TagRecord>> {
        self.clear_tags().await?;
        self.run_inventory(InventoryParams::default()).await?;
        Ok(self.store.best_tag())
    }

    /// Query reader information.
    pub async fn reader_info(&self) -> Result<ReaderInfo> {
        self.require_connected()?;
        self.channel
            .send(Command::GetReaderInfo)
            .await?
            .into_reader_info()
    }

    /// Query the inventory-related module settings.
    pub async fn module_setup(&self) -> Result<ModuleSetup> {
        self.require_connected()?;
        self.channel.send(Command::GetSetup).await?.into_setup()
    }

    /// Apply a settings patch, returning the updated settings.
    ///
    /// # Errors
    ///
    /// `Error::InvalidParameter` for out-of-range values; the patch is
    /// validated before any command is sent.
    pub async fn apply_setup(&self, patch: SetupPatch) -> Result<ModuleSetup> {
        patch.validate()?;
        self.require_connected()?;
        if patch.is_empty() {
            return self.module_setup().await;
        }
        self.channel
            .send(Command::SetSetup(patch))
            .await?
            .into_setup()
    }

    /// Query the inventory read configuration.
    pub async fn inventory_read(&self) -> Result<InventoryReadConfig> {
        self.require_connected()?;
        self.channel
            .send(Command::GetInventoryRead)
            .await?
            .into_inventory_read()
    }

    /// Replace the inventory read configuration.
    ///
    /// Inventory read slows rounds down considerably; enable it only when
    /// the auxiliary data is needed.
    pub async fn set_inventory_read(&self, config: InventoryReadConfig) -> Result<()> {
        config.validate()?;
        self.require_connected()?;
        self.channel
            .send(Command::SetInventoryRead(config))
            .await?
            .into_ack()
    }

    /// Route `DiscoveryAdvertisement` notifications from this session's
    /// feed into a registry's advertisement channel.
    ///
    /// Only needed for transports that multiplex advertisements onto the
    /// session feed; a standalone discovery listener feeds its registry
    /// directly.
    pub fn attach_discovery_feed(&self, feed: mpsc::Sender<Advertisement>) {
        *self
            .discovery_tx
            .lock()
            .expect("discovery feed lock poisoned") = Some(feed);
    }

    pub(crate) fn require_connected(&self) -> Result<()> {
        if self.connection_state() == ConnectionState::Connected {
            Ok(())
        } else {
            Err(Error::Disconnected)
        }
    }
}

impl<T: Transport> Drop for ReaderSession<T> {
    fn drop(&mut self) {
        self.dispatch.abort();
    }
}

/// Event-dispatch loop: consumes the transport's notification feed.
///
/// Tag ingestion happens inline before any restart logic runs, so the
/// final round of a stream-before-stop is never dropped. Handlers that
/// issue commands (stream restart) hand off to a spawned task instead of
/// blocking this loop.
async fn dispatch_events<T: Transport>(
    mut notifications: mpsc::Receiver<ReaderEvent>,
    supervisor: Arc<ConnectionSupervisor>,
    stream: Arc<StreamController<T>>,
    store: Arc<TagStore>,
    events: broadcast::Sender<SessionEvent>,
    discovery_tx: Arc<Mutex<Option<mpsc::Sender<Advertisement>>>>,
) {
    while let Some(event) = notifications.recv().await {
        match event {
            ReaderEvent::ConnectionStatusChanged { status, detail } => {
                supervisor.apply_status(status, detail);
                if status == ConnectionStatus::Disconnected {
                    stream.force_idle();
                }
            }
            ReaderEvent::InventoryResult { observations } => {
                let mut added = 0;
                let mut updated = 0;
                for observation in observations {
                    if store.ingest(observation) {
                        added += 1;
                    } else {
                        updated += 1;
                    }
                }
                let _ = events.send(SessionEvent::TagsUpdated { added, updated });
            }
            ReaderEvent::StreamStopped => {
                stream.on_device_stopped();
            }
            ReaderEvent::GpioEdge { source, direction } => {
                let _ = events.send(SessionEvent::GpioEdge { source, direction });
            }
            ReaderEvent::DiscoveryAdvertisement(advertisement) => {
                let feed = discovery_tx
                    .lock()
                    .expect("discovery feed lock poisoned")
                    .clone();
                match feed {
                    Some(feed) => {
                        if feed.send(advertisement).await.is_err() {
                            warn!("Discovery registry feed closed, dropping advertisement");
                        }
                    }
                    None => {
                        trace!(uri = %advertisement.uri, "No discovery feed attached");
                    }
                }
            }
            ReaderEvent::LogMessage { level, message } => match level {
                LogLevel::Trace => trace!(target: "tagstream::device", "{}", message),
                LogLevel::Debug => debug!(target: "tagstream::device", "{}", message),
                LogLevel::Info => info!(target: "tagstream::device", "{}", message),
                LogLevel::Warn => warn!(target: "tagstream::device", "{}", message),
                LogLevel::Error => error!(target: "tagstream::device", "{}", message),
            },
            _ => {}
        }
    }
    debug!("Notification feed closed, dispatch task exiting");
}
