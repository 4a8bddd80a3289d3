//! Device-facing configuration and information types.
//!
//! Plain data carried in commands and responses: inventory parameters,
//! module setup, inventory-read configuration, reader information, and the
//! GPIO/antenna configuration tables.

use serde::{Deserialize, Serialize};
use tagstream_core::constants::{MAX_INVENTORY_Q, MAX_INVENTORY_SESSION};
use tagstream_core::{Error, Result};

/// Parameters for a single blocking inventory round.
///
/// A value of zero means "use the module's stored/automatic setting",
/// matching the reader's native behavior.
///
/// # Examples
///
/// ```
/// use tagstream_transport::types::InventoryParams;
///
/// // Rounds, Q and session all automatic
/// let params = InventoryParams::default();
/// assert!(params.validate().is_ok());
///
/// let params = InventoryParams { rounds: 2, q: 6, session: 0 };
/// assert!(params.validate().is_ok());
///
/// let bad = InventoryParams { rounds: 0, q: 16, session: 0 };
/// assert!(bad.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryParams {
    /// Number of inventory rounds (0 = automatic).
    pub rounds: u8,

    /// Q value (0 = automatic, otherwise 1-15).
    pub q: u8,

    /// Session number (0-3).
    pub session: u8,
}

impl InventoryParams {
    /// Validate parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameter` if Q exceeds 15 or the session
    /// number exceeds 3.
    pub fn validate(&self) -> Result<()> {
        if self.q > MAX_INVENTORY_Q {
            return Err(Error::invalid_parameter(format!(
                "Q must be 0-{}, got {}",
                MAX_INVENTORY_Q, self.q
            )));
        }
        if self.session > MAX_INVENTORY_SESSION {
            return Err(Error::invalid_parameter(format!(
                "Session must be 0-{}, got {}",
                MAX_INVENTORY_SESSION, self.session
            )));
        }
        Ok(())
    }
}

/// Result summary of a blocking inventory round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySummary {
    /// Tags found in this round.
    pub tags_found: u32,

    /// Tags held in device memory, pending fetch.
    pub tags_in_memory: u32,

    /// Rounds actually executed.
    pub rounds_executed: u32,
}

/// Inventory-related module settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSetup {
    /// Q value (0 = automatic).
    pub inventory_q: u8,

    /// Session number (0-3).
    pub inventory_session: u8,

    /// Rounds per inventory command (0 = automatic).
    pub inventory_rounds: u8,
}

impl Default for ModuleSetup {
    fn default() -> Self {
        Self {
            inventory_q: 0,
            inventory_session: 0,
            inventory_rounds: 0,
        }
    }
}

/// Partial update of [`ModuleSetup`]; `None` fields are left unchanged.
///
/// # Examples
///
/// ```
/// use tagstream_transport::types::{ModuleSetup, SetupPatch};
///
/// let patch = SetupPatch {
///     inventory_q: Some(6),
///     inventory_rounds: Some(2),
///     ..SetupPatch::default()
/// };
///
/// let updated = patch.apply_to(ModuleSetup::default());
/// assert_eq!(updated.inventory_q, 6);
/// assert_eq!(updated.inventory_rounds, 2);
/// assert_eq!(updated.inventory_session, 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupPatch {
    /// New Q value, if changing.
    pub inventory_q: Option<u8>,

    /// New session number, if changing.
    pub inventory_session: Option<u8>,

    /// New round count, if changing.
    pub inventory_rounds: Option<u8>,
}

impl SetupPatch {
    /// Validate the ranges of all present fields.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameter` for out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if let Some(q) = self.inventory_q
            && q > MAX_INVENTORY_Q
        {
            return Err(Error::invalid_parameter(format!(
                "Q must be 0-{}, got {}",
                MAX_INVENTORY_Q, q
            )));
        }
        if let Some(session) = self.inventory_session
            && session > MAX_INVENTORY_SESSION
        {
            return Err(Error::invalid_parameter(format!(
                "Session must be 0-{}, got {}",
                MAX_INVENTORY_SESSION, session
            )));
        }
        Ok(())
    }

    /// Check whether the patch changes anything at all.
    pub fn is_empty(&self) -> bool {
        self.inventory_q.is_none()
            && self.inventory_session.is_none()
            && self.inventory_rounds.is_none()
    }

    /// Apply this patch to an existing setup, returning the result.
    pub fn apply_to(&self, mut setup: ModuleSetup) -> ModuleSetup {
        if let Some(q) = self.inventory_q {
            setup.inventory_q = q;
        }
        if let Some(session) = self.inventory_session {
            setup.inventory_session = session;
        }
        if let Some(rounds) = self.inventory_rounds {
            setup.inventory_rounds = rounds;
        }
        setup
    }
}

/// Tag memory bank addressed by inventory read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryBank {
    /// EPC bank.
    Epc,

    /// TID bank.
    Tid,

    /// User memory bank.
    User,
}

/// How inventory-read data is reported in the tag buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrMode {
    /// Report EPC plus the read data.
    EpcData,
}

/// Inventory read (IR) configuration.
///
/// When active, the reader reads the configured tag memory region during
/// each inventory round and reports it alongside the EPC. This slows
/// inventory down considerably and should be enabled only when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryReadConfig {
    /// Whether inventory read is enabled.
    pub active: bool,

    /// Reporting mode.
    pub mode: IrMode,

    /// Bank to read from.
    pub bank: MemoryBank,

    /// Start address in words.
    pub word_address: u32,

    /// Length to read in words.
    pub word_count: u8,
}

impl InventoryReadConfig {
    /// Configuration with inventory read disabled.
    pub fn disabled() -> Self {
        Self {
            active: false,
            mode: IrMode::EpcData,
            bank: MemoryBank::Tid,
            word_address: 0,
            word_count: 0,
        }
    }

    /// Validate the word count.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameter` when active with a zero word
    /// count or a count over 32 words.
    pub fn validate(&self) -> Result<()> {
        if self.active && !(1..=32).contains(&self.word_count) {
            return Err(Error::invalid_parameter(format!(
                "IR word count must be 1-32, got {}",
                self.word_count
            )));
        }
        Ok(())
    }
}

/// Information about a connected reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderInfo {
    /// Device name (e.g. "STIX", "Sampo S2").
    pub name: String,

    /// Serial number of the RFID module.
    pub serial: String,

    /// Serial number of the host device the module is mounted in, if any.
    pub alt_serial: Option<String>,

    /// Firmware version string.
    pub firmware_version: String,

    /// Number of GPIO pins on the device.
    pub gpio_count: u8,

    /// Maximum number of physical antennas.
    pub max_antennas: u8,
}

impl ReaderInfo {
    /// Create reader info with required fields.
    pub fn new(name: impl Into<String>, serial: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            serial: serial.into(),
            alt_serial: None,
            firmware_version: String::new(),
            gpio_count: 0,
            max_antennas: 0,
        }
    }

    /// Set the host device serial number.
    pub fn with_alt_serial(mut self, alt_serial: impl Into<String>) -> Self {
        self.alt_serial = Some(alt_serial.into());
        self
    }

    /// Set the firmware version.
    pub fn with_firmware_version(mut self, version: impl Into<String>) -> Self {
        self.firmware_version = version.into();
        self
    }

    /// Set the GPIO pin count.
    pub fn with_gpio_count(mut self, count: u8) -> Self {
        self.gpio_count = count;
        self
    }

    /// Set the maximum antenna count.
    pub fn with_max_antennas(mut self, count: u8) -> Self {
        self.max_antennas = count;
        self
    }
}

/// Role of a GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpioKind {
    /// Output pin (LED, relay).
    Output,

    /// Input pin (button, sensor).
    Input,
}

/// Edge kind that triggers a GPIO notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeTrigger {
    /// Rising edge only.
    Rising,

    /// Falling edge only.
    Falling,

    /// Both edges.
    Both,
}

/// Action the device performs when an input pin triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpioAction {
    /// No device-side action; edge is only reported.
    None,

    /// Send an edge notification to the host.
    Notify,

    /// Trigger an inventory round.
    Inventory,
}

/// Configuration of a single GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpioEntry {
    /// Whether the pin exists on this hardware.
    pub available: bool,

    /// Whether the pin is enabled.
    pub enabled: bool,

    /// Pin role.
    pub kind: GpioKind,

    /// Edge trigger configuration for input pins.
    pub edge: EdgeTrigger,

    /// Device-side action for input pins.
    pub action: GpioAction,
}

/// Momentary state of a GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpioStatus {
    /// Current logic level.
    pub state: bool,
}

/// Mapping of a logical antenna name to its antenna id.
///
/// The id doubles as the antenna's bit position in the enable mask:
/// antenna `id` corresponds to bit `1 << id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntennaMapping {
    /// Antenna id (bit position in the enable mask).
    pub id: u8,

    /// Logical antenna name (e.g. "AUX1").
    pub name: String,
}

impl AntennaMapping {
    /// Create a new mapping.
    pub fn new(id: u8, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// The bit this antenna occupies in the enable mask.
    pub fn mask_bit(&self) -> u32 {
        1u32 << self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_params_validation() {
        assert!(InventoryParams::default().validate().is_ok());
        assert!(
            InventoryParams {
                rounds: 2,
                q: 15,
                session: 3
            }
            .validate()
            .is_ok()
        );
        assert!(
            InventoryParams {
                rounds: 0,
                q: 16,
                session: 0
            }
            .validate()
            .is_err()
        );
        assert!(
            InventoryParams {
                rounds: 0,
                q: 0,
                session: 4
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_setup_patch_apply() {
        let setup = ModuleSetup {
            inventory_q: 4,
            inventory_session: 1,
            inventory_rounds: 0,
        };

        let patch = SetupPatch {
            inventory_q: Some(6),
            inventory_session: None,
            inventory_rounds: Some(2),
        };
        assert!(!patch.is_empty());

        let updated = patch.apply_to(setup);
        assert_eq!(updated.inventory_q, 6);
        assert_eq!(updated.inventory_session, 1);
        assert_eq!(updated.inventory_rounds, 2);
    }

    #[test]
    fn test_setup_patch_validation() {
        let patch = SetupPatch {
            inventory_q: Some(16),
            ..SetupPatch::default()
        };
        assert!(patch.validate().is_err());

        let patch = SetupPatch {
            inventory_session: Some(4),
            ..SetupPatch::default()
        };
        assert!(patch.validate().is_err());

        assert!(SetupPatch::default().validate().is_ok());
        assert!(SetupPatch::default().is_empty());
    }

    #[test]
    fn test_inventory_read_config_validation() {
        assert!(InventoryReadConfig::disabled().validate().is_ok());

        let cfg = InventoryReadConfig {
            active: true,
            mode: IrMode::EpcData,
            bank: MemoryBank::Tid,
            word_address: 0,
            word_count: 4,
        };
        assert!(cfg.validate().is_ok());

        let zero = InventoryReadConfig { word_count: 0, ..cfg };
        assert!(zero.validate().is_err());

        let too_long = InventoryReadConfig {
            word_count: 33,
            ..cfg
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_reader_info_builder() {
        let info = ReaderInfo::new("Sampo S2", "N123456")
            .with_alt_serial("H998877")
            .with_firmware_version("5.10-A")
            .with_gpio_count(8)
            .with_max_antennas(4);

        assert_eq!(info.name, "Sampo S2");
        assert_eq!(info.serial, "N123456");
        assert_eq!(info.alt_serial, Some("H998877".to_string()));
        assert_eq!(info.firmware_version, "5.10-A");
        assert_eq!(info.gpio_count, 8);
        assert_eq!(info.max_antennas, 4);
    }

    #[test]
    fn test_antenna_mapping_mask_bit() {
        assert_eq!(AntennaMapping::new(0, "AUX1").mask_bit(), 0x1);
        assert_eq!(AntennaMapping::new(3, "AUX4").mask_bit(), 0x8);
        assert_eq!(AntennaMapping::new(15, "AUX16").mask_bit(), 0x8000);
    }

    #[test]
    fn test_gpio_entry_serde_round_trip() {
        let entry = GpioEntry {
            available: true,
            enabled: true,
            kind: GpioKind::Input,
            edge: EdgeTrigger::Rising,
            action: GpioAction::Notify,
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: GpioEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
