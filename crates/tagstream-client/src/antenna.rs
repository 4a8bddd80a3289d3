//! Antenna configuration surface.
//!
//! The reader exposes logical antenna names mapped to bits of an enable
//! mask. Name lists are comma-delimited (`"AUX1,AUX16"`); unknown names
//! are rejected with `Error::UnknownAntenna` before any command is sent.

use crate::session::ReaderSession;
use tagstream_core::{Error, Result};
use tagstream_transport::command::Command;
use tagstream_transport::traits::Transport;
use tagstream_transport::types::AntennaMapping;

/// Split a comma-delimited antenna name list, trimming whitespace.
fn split_names(names: &str) -> impl Iterator<Item = &str> {
    names.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Resolve a name list to its combined mask bits.
fn mask_for(mappings: &[AntennaMapping], names: &str) -> Result<u32> {
    let mut mask = 0u32;
    for name in split_names(names) {
        let mapping = mappings
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| Error::unknown_antenna(name))?;
        mask |= mapping.mask_bit();
    }
    Ok(mask)
}

impl<T: Transport> ReaderSession<T> {
    /// Query the logical antenna list.
    pub async fn antenna_list(&self) -> Result<Vec<AntennaMapping>> {
        self.require_connected()?;
        self.channel
            .send(Command::GetAntennaList)
            .await?
            .into_antenna_list()
    }

    /// Names of the currently enabled physical antennas.
    pub async fn enabled_antennas(&self) -> Result<Vec<String>> {
        let mappings = self.antenna_list().await?;
        let mask = self
            .channel
            .send(Command::GetAntennaMask)
            .await?
            .into_antenna_mask()?;

        Ok(mappings
            .into_iter()
            .filter(|m| mask & m.mask_bit() != 0)
            .map(|m| m.name)
            .collect())
    }

    /// Whether every antenna in the comma-delimited list is enabled.
    ///
    /// # Errors
    ///
    /// `Error::UnknownAntenna` for a name the reader does not have.
    pub async fn is_antenna_enabled(&self, names: &str) -> Result<bool> {
        let mappings = self.antenna_list().await?;
        let wanted = mask_for(&mappings, names)?;
        let mask = self
            .channel
            .send(Command::GetAntennaMask)
            .await?
            .into_antenna_mask()?;
        Ok(mask & wanted == wanted)
    }

    /// Mask bits for a comma-delimited antenna name list.
    ///
    /// # Errors
    ///
    /// `Error::UnknownAntenna` for a name the reader does not have.
    pub async fn antenna_mask(&self, names: &str) -> Result<u32> {
        let mappings = self.antenna_list().await?;
        mask_for(&mappings, names)
    }

    /// Enable or disable the antennas named in a comma-delimited list,
    /// leaving every other antenna unchanged.
    ///
    /// # Errors
    ///
    /// `Error::UnknownAntenna` for a name the reader does not have;
    /// command errors from the device (e.g. rejecting an empty mask).
    pub async fn set_antennas_enabled(&self, names: &str, enabled: bool) -> Result<()> {
        let mappings = self.antenna_list().await?;
        let bits = mask_for(&mappings, names)?;
        let current = self
            .channel
            .send(Command::GetAntennaMask)
            .await?
            .into_antenna_mask()?;

        let mask = if enabled {
            current | bits
        } else {
            current & !bits
        };

        self.channel
            .send(Command::SetAntennaMask { mask })
            .await?
            .into_ack()
    }
}
