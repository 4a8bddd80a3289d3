//! Typed command model and the serializing command channel.
//!
//! All device-bound operations are expressed as [`Command`] values and
//! executed through a [`CommandChannel`], the mutual-exclusion gate that
//! guarantees at most one command is in flight at any time. No component
//! may bypass the channel and talk to the transport directly.

use crate::events::TagObservation;
use crate::traits::Transport;
use crate::types::{
    AntennaMapping, GpioEntry, GpioStatus, InventoryParams, InventoryReadConfig, InventorySummary,
    ModuleSetup, ReaderInfo, SetupPatch,
};
use tagstream_core::{Error, Result};
use tokio::sync::Mutex;
use tracing::trace;

/// A device-bound command.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Command {
    /// Start the continuous inventory stream.
    StartInventoryStream,

    /// Stop the continuous inventory stream.
    StopInventoryStream,

    /// Run one blocking inventory round.
    Inventory(InventoryParams),

    /// Fetch tags collected in device memory.
    FetchTags,

    /// Clear device-side tag memory.
    ClearTags,

    /// Query reader information.
    GetReaderInfo,

    /// Query inventory-related module settings.
    GetSetup,

    /// Update inventory-related module settings.
    SetSetup(SetupPatch),

    /// Query the inventory read configuration.
    GetInventoryRead,

    /// Update the inventory read configuration.
    SetInventoryRead(InventoryReadConfig),

    /// Query the GPIO configuration table.
    GetGpioConfig,

    /// Query the state of one GPIO pin.
    GetGpioStatus { index: u8 },

    /// Set the state of one GPIO pin.
    SetGpioStatus { index: u8, state: bool },

    /// Set the state of every pin selected by `mask` at once.
    SetGpioStatusMask { mask: u16, state: bool },

    /// Query the logical antenna list.
    GetAntennaList,

    /// Query the enabled-antenna bitmask.
    GetAntennaMask,

    /// Replace the enabled-antenna bitmask.
    SetAntennaMask { mask: u32 },
}

impl Command {
    /// The kind of this command, used for response scripting and metrics.
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::StartInventoryStream => CommandKind::StartInventoryStream,
            Self::StopInventoryStream => CommandKind::StopInventoryStream,
            Self::Inventory(_) => CommandKind::Inventory,
            Self::FetchTags => CommandKind::FetchTags,
            Self::ClearTags => CommandKind::ClearTags,
            Self::GetReaderInfo => CommandKind::GetReaderInfo,
            Self::GetSetup => CommandKind::GetSetup,
            Self::SetSetup(_) => CommandKind::SetSetup,
            Self::GetInventoryRead => CommandKind::GetInventoryRead,
            Self::SetInventoryRead(_) => CommandKind::SetInventoryRead,
            Self::GetGpioConfig => CommandKind::GetGpioConfig,
            Self::GetGpioStatus { .. } => CommandKind::GetGpioStatus,
            Self::SetGpioStatus { .. } => CommandKind::SetGpioStatus,
            Self::SetGpioStatusMask { .. } => CommandKind::SetGpioStatusMask,
            Self::GetAntennaList => CommandKind::GetAntennaList,
            Self::GetAntennaMask => CommandKind::GetAntennaMask,
            Self::SetAntennaMask { .. } => CommandKind::SetAntennaMask,
        }
    }
}

/// Discriminant of a [`Command`], independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CommandKind {
    StartInventoryStream,
    StopInventoryStream,
    Inventory,
    FetchTags,
    ClearTags,
    GetReaderInfo,
    GetSetup,
    SetSetup,
    GetInventoryRead,
    SetInventoryRead,
    GetGpioConfig,
    GetGpioStatus,
    SetGpioStatus,
    SetGpioStatusMask,
    GetAntennaList,
    GetAntennaMask,
    SetAntennaMask,
}

/// Response to a device-bound command.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum CommandResponse {
    /// Command accepted, no payload.
    Ack,

    /// Tag observations fetched from device memory.
    Tags(Vec<TagObservation>),

    /// Summary of a completed inventory round.
    InventorySummary(InventorySummary),

    /// Reader information.
    ReaderInfo(ReaderInfo),

    /// Current module setup.
    Setup(ModuleSetup),

    /// Current inventory read configuration.
    InventoryRead(InventoryReadConfig),

    /// GPIO configuration table.
    GpioConfig(Vec<GpioEntry>),

    /// State of one GPIO pin.
    GpioStatus(GpioStatus),

    /// Logical antenna list.
    AntennaList(Vec<AntennaMapping>),

    /// Enabled-antenna bitmask.
    AntennaMask(u32),
}

impl CommandResponse {
    /// Expect an `Ack` response.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnexpectedResponse` for any other kind.
    pub fn into_ack(self) -> Result<()> {
        match self {
            Self::Ack => Ok(()),
            _ => Err(Error::UnexpectedResponse { expected: "Ack" }),
        }
    }

    /// Expect a `Tags` response.
    pub fn into_tags(self) -> Result<Vec<TagObservation>> {
        match self {
            Self::Tags(tags) => Ok(tags),
            _ => Err(Error::UnexpectedResponse { expected: "Tags" }),
        }
    }

    /// Expect an `InventorySummary` response.
    pub fn into_summary(self) -> Result<InventorySummary> {
        match self {
            Self::InventorySummary(summary) => Ok(summary),
            _ => Err(Error::UnexpectedResponse {
                expected: "InventorySummary",
            }),
        }
    }

    /// Expect a `ReaderInfo` response.
    pub fn into_reader_info(self) -> Result<ReaderInfo> {
        match self {
            Self::ReaderInfo(info) => Ok(info),
            _ => Err(Error::UnexpectedResponse {
                expected: "ReaderInfo",
            }),
        }
    }

    /// Expect a `Setup` response.
    pub fn into_setup(self) -> Result<ModuleSetup> {
        match self {
            Self::Setup(setup) => Ok(setup),
            _ => Err(Error::UnexpectedResponse { expected: "Setup" }),
        }
    }

    /// Expect an `InventoryRead` response.
    pub fn into_inventory_read(self) -> Result<InventoryReadConfig> {
        match self {
            Self::InventoryRead(config) => Ok(config),
            _ => Err(Error::UnexpectedResponse {
                expected: "InventoryRead",
            }),
        }
    }

    /// Expect a `GpioConfig` response.
    pub fn into_gpio_config(self) -> Result<Vec<GpioEntry>> {
        match self {
            Self::GpioConfig(entries) => Ok(entries),
            _ => Err(Error::UnexpectedResponse {
                expected: "GpioConfig",
            }),
        }
    }

    /// Expect a `GpioStatus` response.
    pub fn into_gpio_status(self) -> Result<GpioStatus> {
        match self {
            Self::GpioStatus(status) => Ok(status),
            _ => Err(Error::UnexpectedResponse {
                expected: "GpioStatus",
            }),
        }
    }

    /// Expect an `AntennaList` response.
    pub fn into_antenna_list(self) -> Result<Vec<AntennaMapping>> {
        match self {
            Self::AntennaList(list) => Ok(list),
            _ => Err(Error::UnexpectedResponse {
                expected: "AntennaList",
            }),
        }
    }

    /// Expect an `AntennaMask` response.
    pub fn into_antenna_mask(self) -> Result<u32> {
        match self {
            Self::AntennaMask(mask) => Ok(mask),
            _ => Err(Error::UnexpectedResponse {
                expected: "AntennaMask",
            }),
        }
    }
}

/// Serializing gate over a [`Transport`].
///
/// The channel is the mutual-exclusion primitive for all device-bound
/// commands: it holds an async lock across each exchange so at most one
/// command is in flight, and every component issues commands through it.
/// It is a gate, not a pool.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tagstream_transport::command::{Command, CommandChannel};
/// use tagstream_transport::mock::MockTransport;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> tagstream_core::Result<()> {
/// let (transport, _handle, _events) = MockTransport::new();
/// let channel = CommandChannel::new(Arc::new(transport));
///
/// channel.send(Command::ClearTags).await?.into_ack()?;
/// # Ok(())
/// # }
/// ```
pub struct CommandChannel<T: Transport> {
    transport: std::sync::Arc<T>,
    gate: Mutex<()>,
}

impl<T: Transport> CommandChannel<T> {
    /// Create a channel over the given transport.
    pub fn new(transport: std::sync::Arc<T>) -> Self {
        Self {
            transport,
            gate: Mutex::new(()),
        }
    }

    /// Execute one command, waiting for any in-flight command first.
    ///
    /// # Errors
    ///
    /// Propagates the transport's error for this specific command; a
    /// failure never affects other callers waiting on the gate.
    pub async fn send(&self, command: Command) -> Result<CommandResponse> {
        let _guard = self.gate.lock().await;
        trace!(kind = ?command.kind(), "Sending command");
        self.transport.send(command).await
    }
}
