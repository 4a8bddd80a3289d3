//! Typed device notification feed.
//!
//! Notifications arrive on a concurrent path separate from the command
//! channel. Events of a given kind are delivered in device-reported order;
//! there is no ordering guarantee across kinds (a stream stop and a late
//! tag result may interleave).

use serde::{Deserialize, Serialize};
use std::fmt;
use tagstream_core::{DeviceUri, to_hex_string};

/// Transport-level connection status as reported by the device link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// No connection.
    Disconnected,

    /// Connect request issued, link not yet established.
    Connecting,

    /// Link established and reader responding.
    Connected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
        };
        write!(f, "{}", s)
    }
}

/// One reported sighting of a tag during an inventory round.
///
/// The identity key is the raw EPC byte sequence; payloads are opaque to
/// the client. `data` carries the bank content read during inventory when
/// inventory read is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagObservation {
    /// Raw tag identifier bytes (EPC or equivalent).
    pub epc: Vec<u8>,

    /// Signal strength of this sighting, in dBm.
    pub rssi: i16,

    /// Optional auxiliary bank data read during the round.
    pub data: Option<Vec<u8>>,
}

impl TagObservation {
    /// Create an observation without auxiliary data.
    pub fn new(epc: Vec<u8>, rssi: i16) -> Self {
        Self {
            epc,
            rssi,
            data: None,
        }
    }

    /// Attach auxiliary bank data.
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = Some(data);
        self
    }

    /// Get the EPC as an uppercase hex string.
    pub fn epc_hex(&self) -> String {
        to_hex_string(&self.epc)
    }
}

/// Direction of a GPIO edge transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeDirection {
    /// Low to high.
    Rising,

    /// High to low.
    Falling,
}

/// A discovery broadcast announcing a device's presence or absence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advertisement {
    /// Address of the advertising device.
    pub uri: DeviceUri,

    /// `true` for an appear advertisement, `false` for disappear.
    pub visible: bool,
}

/// Severity of a device-originated log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Asynchronous notification from the reader or its transport.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ReaderEvent {
    /// The transport's connection status changed.
    ///
    /// Transport-level failures surface as a `Disconnected` status with
    /// `detail` attached, never as a silent timeout.
    ConnectionStatusChanged {
        status: ConnectionStatus,
        detail: Option<String>,
    },

    /// One or more tags were reported by an inventory round.
    InventoryResult { observations: Vec<TagObservation> },

    /// The device stopped the inventory stream on its own.
    ///
    /// The reader stops a running stream autonomously after a fixed
    /// duration; the client reacts to this notification rather than
    /// running a local timer.
    StreamStopped,

    /// A GPIO pin changed state.
    GpioEdge { source: u8, direction: EdgeDirection },

    /// A device appeared on or disappeared from the network segment.
    DiscoveryAdvertisement(Advertisement),

    /// Internal log output from the reader or transport.
    LogMessage { level: LogLevel, message: String },
}
