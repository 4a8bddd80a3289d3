//! Transport trait definition.
//!
//! This module defines the contract between the session manager and the
//! low-level wire implementation that talks to a physical reader. Framing,
//! checksums, and command encoding live behind this trait; the session
//! only sees typed commands, typed responses, and the asynchronous
//! notification feed.
//!
//! The trait uses native `async fn` methods (Rust 1.90 + Edition 2024
//! RPITIT), eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::command::{Command, CommandResponse};
use tagstream_core::{DeviceUri, Result};

/// Abstract reader transport.
///
/// Implementations own the byte-stream or message endpoint identified by a
/// [`DeviceUri`] and deliver device notifications through the
/// `mpsc::Receiver<ReaderEvent>` handed out at construction time.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods
/// return `impl Future`, an opaque type that cannot be used in trait
/// objects. Use generic type parameters at the seams instead:
///
/// ```no_run
/// use tagstream_transport::traits::Transport;
/// use tagstream_transport::command::Command;
/// use tagstream_core::Result;
///
/// async fn ping<T: Transport>(transport: &T) -> Result<()> {
///     transport.send(Command::GetReaderInfo).await?;
///     Ok(())
/// }
/// ```
///
/// # Contract
///
/// - `request_connect` and `request_disconnect` are non-blocking requests;
///   completion arrives as a `ConnectionStatusChanged` notification on the
///   event feed. The transport never changes state silently.
/// - `send` is synchronous request/response. Callers must serialize calls
///   through a [`CommandChannel`](crate::command::CommandChannel); the
///   transport itself may assume at most one command is in flight.
pub trait Transport: Send + Sync + 'static {
    /// Issue a non-blocking connect request for the given address.
    ///
    /// A `Connecting` status notification follows, then either `Connected`
    /// or `Disconnected` (with failure detail) depending on the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error only if the request itself cannot be issued (e.g.
    /// the notification feed is gone); connection failures are reported
    /// asynchronously.
    fn request_connect(&self, uri: &DeviceUri) -> Result<()>;

    /// Issue a non-blocking disconnect request.
    ///
    /// A `Disconnected` status notification follows. Requesting a
    /// disconnect while not connected is a no-op.
    fn request_disconnect(&self);

    /// Execute one command and wait for the device's response.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejects the command or the
    /// connection fails mid-exchange.
    fn send(
        &self,
        command: Command,
    ) -> impl std::future::Future<Output = Result<CommandResponse>> + Send;
}
