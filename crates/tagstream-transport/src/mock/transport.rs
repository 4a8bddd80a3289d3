//! Mock reader transport for testing and development.
//!
//! This module provides a simulated reader transport that can be
//! controlled programmatically: the handle scripts command responses and
//! emits notifications, while the transport side behaves like a small
//! reader emulator with GPIO, antenna, and settings state.

use crate::command::{Command, CommandKind, CommandResponse};
use crate::events::{
    Advertisement, ConnectionStatus, EdgeDirection, LogLevel, ReaderEvent, TagObservation,
};
use crate::traits::Transport;
use crate::types::{
    AntennaMapping, EdgeTrigger, GpioAction, GpioEntry, GpioKind, GpioStatus,
    InventoryReadConfig, InventorySummary, ModuleSetup, ReaderInfo,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tagstream_core::constants::EVENT_CHANNEL_CAPACITY;
use tagstream_core::{DeviceUri, Error, Result};
use tokio::sync::mpsc;

/// Scripted behavior for one command execution.
#[derive(Debug)]
enum MockReply {
    /// Answer with this response.
    Respond(CommandResponse),

    /// Fail with a command error.
    Fail(String),

    /// Never complete. Used to exercise cancellation paths.
    Hang,
}

/// Shared state between transport and handle.
#[derive(Debug)]
struct MockState {
    connect_uri: Option<DeviceUri>,
    commands: Vec<Command>,
    scripts: HashMap<CommandKind, VecDeque<MockReply>>,
    reader_info: ReaderInfo,
    setup: ModuleSetup,
    inventory_read: InventoryReadConfig,
    gpio: Vec<GpioEntry>,
    gpio_states: Vec<bool>,
    antennas: Vec<AntennaMapping>,
    antenna_mask: u32,
}

impl MockState {
    fn new() -> Self {
        // Default layout mirrors a 4-button / 4-LED accessory reader:
        // four enabled inputs followed by four outputs.
        let mut gpio = Vec::with_capacity(8);
        for _ in 0..4 {
            gpio.push(GpioEntry {
                available: true,
                enabled: true,
                kind: GpioKind::Input,
                edge: EdgeTrigger::Rising,
                action: GpioAction::Notify,
            });
        }
        for _ in 0..4 {
            gpio.push(GpioEntry {
                available: true,
                enabled: true,
                kind: GpioKind::Output,
                edge: EdgeTrigger::Both,
                action: GpioAction::None,
            });
        }

        let antennas = (0u8..4)
            .map(|id| AntennaMapping::new(id, format!("AUX{}", id + 1)))
            .collect();

        Self {
            connect_uri: None,
            commands: Vec::new(),
            scripts: HashMap::new(),
            reader_info: ReaderInfo::new("Mock Reader", "N00000000")
                .with_firmware_version("1.0.0")
                .with_gpio_count(8)
                .with_max_antennas(4),
            setup: ModuleSetup::default(),
            inventory_read: InventoryReadConfig::disabled(),
            gpio,
            gpio_states: vec![false; 8],
            antennas,
            antenna_mask: 0x1,
        }
    }
}

/// Shared core of the mock transport.
#[derive(Debug)]
struct Shared {
    state: Mutex<MockState>,
    event_tx: mpsc::Sender<ReaderEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state lock poisoned")
    }
}

/// Mock reader transport.
///
/// Pairs with a [`MockTransportHandle`] that scripts its behavior.
///
/// # Examples
///
/// ```
/// use tagstream_transport::mock::MockTransport;
/// use tagstream_transport::traits::Transport;
/// use tagstream_transport::events::{ConnectionStatus, ReaderEvent};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> tagstream_core::Result<()> {
/// let (transport, handle, mut events) = MockTransport::new();
///
/// let uri = "tcp://10.0.0.5".parse()?;
/// transport.request_connect(&uri)?;
/// handle.complete_connect().await?;
///
/// // Connecting, then Connected
/// let first = events.recv().await.unwrap();
/// assert!(matches!(
///     first,
///     ReaderEvent::ConnectionStatusChanged { status: ConnectionStatus::Connecting, .. }
/// ));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MockTransport {
    shared: Arc<Shared>,
}

impl MockTransport {
    /// Create a mock transport.
    ///
    /// Returns the transport, the controlling handle, and the notification
    /// receiver a session consumes.
    pub fn new() -> (Self, MockTransportHandle, mpsc::Receiver<ReaderEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let shared = Arc::new(Shared {
            state: Mutex::new(MockState::new()),
            event_tx,
        });

        let transport = Self {
            shared: Arc::clone(&shared),
        };
        let handle = MockTransportHandle { shared };

        (transport, handle, event_rx)
    }

    fn emit(&self, event: ReaderEvent) -> Result<()> {
        self.shared
            .event_tx
            .try_send(event)
            .map_err(|_| Error::transport("notification channel closed"))
    }

    fn default_response(&self, command: Command) -> Result<CommandResponse> {
        let mut state = self.shared.lock();
        match command {
            Command::StartInventoryStream
            | Command::StopInventoryStream
            | Command::ClearTags => Ok(CommandResponse::Ack),
            Command::Inventory(_) => Ok(CommandResponse::InventorySummary(InventorySummary {
                tags_found: 0,
                tags_in_memory: 0,
                rounds_executed: 1,
            })),
            Command::FetchTags => Ok(CommandResponse::Tags(Vec::new())),
            Command::GetReaderInfo => Ok(CommandResponse::ReaderInfo(state.reader_info.clone())),
            Command::GetSetup => Ok(CommandResponse::Setup(state.setup)),
            Command::SetSetup(patch) => {
                state.setup = patch.apply_to(state.setup);
                Ok(CommandResponse::Setup(state.setup))
            }
            Command::GetInventoryRead => Ok(CommandResponse::InventoryRead(state.inventory_read)),
            Command::SetInventoryRead(config) => {
                state.inventory_read = config;
                Ok(CommandResponse::Ack)
            }
            Command::GetGpioConfig => Ok(CommandResponse::GpioConfig(state.gpio.clone())),
            Command::GetGpioStatus { index } => state
                .gpio_states
                .get(index as usize)
                .map(|&s| CommandResponse::GpioStatus(GpioStatus { state: s }))
                .ok_or_else(|| Error::command_failed(format!("No GPIO at index {}", index))),
            Command::SetGpioStatus { index, state: level } => {
                let slot = state
                    .gpio_states
                    .get_mut(index as usize)
                    .ok_or_else(|| Error::command_failed(format!("No GPIO at index {}", index)))?;
                *slot = level;
                Ok(CommandResponse::Ack)
            }
            Command::SetGpioStatusMask { mask, state: level } => {
                for index in 0..state.gpio_states.len().min(16) {
                    if mask & (1u16 << index) != 0 {
                        state.gpio_states[index] = level;
                    }
                }
                Ok(CommandResponse::Ack)
            }
            Command::GetAntennaList => Ok(CommandResponse::AntennaList(state.antennas.clone())),
            Command::GetAntennaMask => Ok(CommandResponse::AntennaMask(state.antenna_mask)),
            Command::SetAntennaMask { mask } => {
                if mask == 0 {
                    return Err(Error::command_failed("Antenna mask cannot be empty"));
                }
                state.antenna_mask = mask;
                Ok(CommandResponse::Ack)
            }
        }
    }
}

impl Transport for MockTransport {
    fn request_connect(&self, uri: &DeviceUri) -> Result<()> {
        self.shared.lock().connect_uri = Some(uri.clone());
        self.emit(ReaderEvent::ConnectionStatusChanged {
            status: ConnectionStatus::Connecting,
            detail: None,
        })
    }

    fn request_disconnect(&self) {
        self.shared.lock().connect_uri = None;
        let _ = self.emit(ReaderEvent::ConnectionStatusChanged {
            status: ConnectionStatus::Disconnected,
            detail: None,
        });
    }

    async fn send(&self, command: Command) -> Result<CommandResponse> {
        let reply = {
            let mut state = self.shared.lock();
            state.commands.push(command.clone());
            state
                .scripts
                .get_mut(&command.kind())
                .and_then(VecDeque::pop_front)
        };

        match reply {
            Some(MockReply::Respond(response)) => Ok(response),
            Some(MockReply::Fail(message)) => Err(Error::command_failed(message)),
            Some(MockReply::Hang) => std::future::pending().await,
            None => self.default_response(command),
        }
    }
}

/// Handle for controlling a [`MockTransport`].
///
/// The handle plays the device side: it completes or fails connection
/// attempts, emits inventory results and stream stops, and scripts
/// responses for specific command kinds. Commands with no script get a
/// sensible default answer from the transport's internal emulator state.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    shared: Arc<Shared>,
}

impl MockTransportHandle {
    async fn emit(&self, event: ReaderEvent) -> Result<()> {
        self.shared
            .event_tx
            .send(event)
            .await
            .map_err(|_| Error::transport("notification channel closed"))
    }

    /// Report the pending connection attempt as established.
    pub async fn complete_connect(&self) -> Result<()> {
        self.emit(ReaderEvent::ConnectionStatusChanged {
            status: ConnectionStatus::Connected,
            detail: None,
        })
        .await
    }

    /// Report the pending connection attempt as failed.
    pub async fn fail_connect(&self, detail: impl Into<String>) -> Result<()> {
        self.emit(ReaderEvent::ConnectionStatusChanged {
            status: ConnectionStatus::Disconnected,
            detail: Some(detail.into()),
        })
        .await
    }

    /// Emit an arbitrary connection status notification.
    pub async fn notify_status(
        &self,
        status: ConnectionStatus,
        detail: Option<String>,
    ) -> Result<()> {
        self.emit(ReaderEvent::ConnectionStatusChanged { status, detail })
            .await
    }

    /// Emit an inventory result carrying the given observations.
    pub async fn emit_tags(&self, observations: Vec<TagObservation>) -> Result<()> {
        self.emit(ReaderEvent::InventoryResult { observations })
            .await
    }

    /// Emit a device-initiated stream stop notification.
    pub async fn notify_stream_stopped(&self) -> Result<()> {
        self.emit(ReaderEvent::StreamStopped).await
    }

    /// Emit a GPIO edge notification.
    pub async fn emit_gpio_edge(&self, source: u8, direction: EdgeDirection) -> Result<()> {
        self.emit(ReaderEvent::GpioEdge { source, direction }).await
    }

    /// Emit a discovery advertisement on the session feed.
    ///
    /// Only meaningful for transports that multiplex advertisements onto
    /// the notification feed; standalone discovery uses
    /// [`MockDiscovery`](crate::mock::MockDiscovery).
    pub async fn emit_advertisement(&self, advertisement: Advertisement) -> Result<()> {
        self.emit(ReaderEvent::DiscoveryAdvertisement(advertisement))
            .await
    }

    /// Emit a device log message.
    pub async fn emit_log(&self, level: LogLevel, message: impl Into<String>) -> Result<()> {
        self.emit(ReaderEvent::LogMessage {
            level,
            message: message.into(),
        })
        .await
    }

    /// Script the next execution of `kind` to answer with `response`.
    ///
    /// Scripts for the same kind queue up and are consumed in order.
    pub fn script_response(&self, kind: CommandKind, response: CommandResponse) {
        self.shared
            .lock()
            .scripts
            .entry(kind)
            .or_default()
            .push_back(MockReply::Respond(response));
    }

    /// Script the next execution of `kind` to fail.
    pub fn fail_command(&self, kind: CommandKind, message: impl Into<String>) {
        self.shared
            .lock()
            .scripts
            .entry(kind)
            .or_default()
            .push_back(MockReply::Fail(message.into()));
    }

    /// Script the next execution of `kind` to never complete.
    pub fn hang_command(&self, kind: CommandKind) {
        self.shared
            .lock()
            .scripts
            .entry(kind)
            .or_default()
            .push_back(MockReply::Hang);
    }

    /// Replace the reader info reported by `GetReaderInfo`.
    pub fn set_reader_info(&self, info: ReaderInfo) {
        self.shared.lock().reader_info = info;
    }

    /// Replace the antenna table and current enable mask.
    pub fn set_antennas(&self, antennas: Vec<AntennaMapping>, mask: u32) {
        let mut state = self.shared.lock();
        state.antennas = antennas;
        state.antenna_mask = mask;
    }

    /// All commands executed so far, in order.
    pub fn sent_commands(&self) -> Vec<Command> {
        self.shared.lock().commands.clone()
    }

    /// Number of executed commands of the given kind.
    pub fn command_count(&self, kind: CommandKind) -> usize {
        self.shared
            .lock()
            .commands
            .iter()
            .filter(|c| c.kind() == kind)
            .count()
    }

    /// The address of the last connect request, if any.
    pub fn connect_uri(&self) -> Option<DeviceUri> {
        self.shared.lock().connect_uri.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SetupPatch;

    #[tokio::test]
    async fn test_connect_request_emits_connecting() {
        let (transport, handle, mut events) = MockTransport::new();

        let uri: DeviceUri = "ser://com4".parse().unwrap();
        transport.request_connect(&uri).unwrap();
        assert_eq!(handle.connect_uri(), Some(uri));

        let event = events.recv().await.unwrap();
        assert!(matches!(
            event,
            ReaderEvent::ConnectionStatusChanged {
                status: ConnectionStatus::Connecting,
                detail: None,
            }
        ));
    }

    #[tokio::test]
    async fn test_scripted_response_consumed_in_order() {
        let (transport, handle, _events) = MockTransport::new();

        handle.script_response(
            CommandKind::FetchTags,
            CommandResponse::Tags(vec![TagObservation::new(vec![0x01], -40)]),
        );
        handle.fail_command(CommandKind::FetchTags, "device busy");

        let tags = transport
            .send(Command::FetchTags)
            .await
            .unwrap()
            .into_tags()
            .unwrap();
        assert_eq!(tags.len(), 1);

        let result = transport.send(Command::FetchTags).await;
        assert!(matches!(result, Err(Error::CommandFailed { .. })));

        // Script queue exhausted, default answer again
        let tags = transport
            .send(Command::FetchTags)
            .await
            .unwrap()
            .into_tags()
            .unwrap();
        assert!(tags.is_empty());
    }

    #[tokio::test]
    async fn test_default_setup_round_trip() {
        let (transport, _handle, _events) = MockTransport::new();

        let patch = SetupPatch {
            inventory_q: Some(6),
            inventory_rounds: Some(2),
            ..SetupPatch::default()
        };
        let updated = transport
            .send(Command::SetSetup(patch))
            .await
            .unwrap()
            .into_setup()
            .unwrap();
        assert_eq!(updated.inventory_q, 6);

        let read_back = transport
            .send(Command::GetSetup)
            .await
            .unwrap()
            .into_setup()
            .unwrap();
        assert_eq!(read_back, updated);
    }

    #[tokio::test]
    async fn test_default_gpio_emulation() {
        let (transport, _handle, _events) = MockTransport::new();

        let config = transport
            .send(Command::GetGpioConfig)
            .await
            .unwrap()
            .into_gpio_config()
            .unwrap();
        assert_eq!(config.len(), 8);
        assert_eq!(config[0].kind, GpioKind::Input);
        assert_eq!(config[7].kind, GpioKind::Output);

        transport
            .send(Command::SetGpioStatus {
                index: 4,
                state: true,
            })
            .await
            .unwrap()
            .into_ack()
            .unwrap();

        let status = transport
            .send(Command::GetGpioStatus { index: 4 })
            .await
            .unwrap()
            .into_gpio_status()
            .unwrap();
        assert!(status.state);

        // Mask write covers pins 4-7
        transport
            .send(Command::SetGpioStatusMask {
                mask: 0xF0,
                state: false,
            })
            .await
            .unwrap()
            .into_ack()
            .unwrap();
        let status = transport
            .send(Command::GetGpioStatus { index: 4 })
            .await
            .unwrap()
            .into_gpio_status()
            .unwrap();
        assert!(!status.state);
    }

    #[tokio::test]
    async fn test_gpio_index_out_of_range() {
        let (transport, _handle, _events) = MockTransport::new();

        let result = transport.send(Command::GetGpioStatus { index: 12 }).await;
        assert!(matches!(result, Err(Error::CommandFailed { .. })));
    }

    #[tokio::test]
    async fn test_empty_antenna_mask_rejected() {
        let (transport, _handle, _events) = MockTransport::new();

        let result = transport.send(Command::SetAntennaMask { mask: 0 }).await;
        assert!(matches!(result, Err(Error::CommandFailed { .. })));

        transport
            .send(Command::SetAntennaMask { mask: 0b0011 })
            .await
            .unwrap()
            .into_ack()
            .unwrap();
        let mask = transport
            .send(Command::GetAntennaMask)
            .await
            .unwrap()
            .into_antenna_mask()
            .unwrap();
        assert_eq!(mask, 0b0011);
    }

    #[tokio::test]
    async fn test_command_log() {
        let (transport, handle, _events) = MockTransport::new();

        transport.send(Command::ClearTags).await.unwrap();
        transport.send(Command::StartInventoryStream).await.unwrap();

        assert_eq!(
            handle.sent_commands(),
            vec![Command::ClearTags, Command::StartInventoryStream]
        );
        assert_eq!(handle.command_count(CommandKind::ClearTags), 1);
        assert_eq!(handle.command_count(CommandKind::StopInventoryStream), 0);
    }
}
