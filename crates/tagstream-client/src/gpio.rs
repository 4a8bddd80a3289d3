//! GPIO configuration and status surface.
//!
//! Pins are addressed by zero-based index into the configuration table.
//! Writes go through the command channel, so a masked write applies to
//! all selected pins atomically relative to any other command. Edge
//! transitions on input pins arrive as
//! [`SessionEvent::GpioEdge`](crate::SessionEvent::GpioEdge).

use crate::session::ReaderSession;
use tagstream_core::Result;
use tagstream_transport::command::Command;
use tagstream_transport::traits::Transport;
use tagstream_transport::types::{GpioEntry, GpioStatus};

impl<T: Transport> ReaderSession<T> {
    /// Query the GPIO configuration table.
    ///
    /// One entry per pin, in pin order.
    pub async fn gpio_config(&self) -> Result<Vec<GpioEntry>> {
        self.require_connected()?;
        self.channel
            .send(Command::GetGpioConfig)
            .await?
            .into_gpio_config()
    }

    /// Query the state of one pin.
    pub async fn gpio_status(&self, index: u8) -> Result<GpioStatus> {
        self.require_connected()?;
        self.channel
            .send(Command::GetGpioStatus { index })
            .await?
            .into_gpio_status()
    }

    /// Set the state of one pin.
    pub async fn set_gpio_status(&self, index: u8, state: bool) -> Result<()> {
        self.require_connected()?;
        self.channel
            .send(Command::SetGpioStatus { index, state })
            .await?
            .into_ack()
    }

    /// Set the state of every pin selected by `mask` in one command.
    ///
    /// Bit `n` of the mask selects pin `n`.
    pub async fn set_gpio_status_mask(&self, mask: u16, state: bool) -> Result<()> {
        self.require_connected()?;
        self.channel
            .send(Command::SetGpioStatusMask { mask, state })
            .await?
            .into_ack()
    }
}
