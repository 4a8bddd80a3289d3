//! Device-facing surface consumed by the tagstream session manager.
//!
//! The session core never speaks the reader's wire protocol. Instead it
//! consumes two abstract interfaces defined here:
//!
//! - a [`Transport`](traits::Transport): opens and closes the underlying
//!   endpoint (serial line, TCP socket, mDNS-resolved address) and executes
//!   one typed [`Command`](command::Command) at a time;
//! - a notification feed of [`ReaderEvent`](events::ReaderEvent)s delivered
//!   over a `tokio::sync::mpsc` channel: connection status changes,
//!   inventory results, stream stops, GPIO edges, discovery advertisements,
//!   and device log messages.
//!
//! All device-bound commands must flow through the
//! [`CommandChannel`](command::CommandChannel), the mutual-exclusion gate
//! that guarantees at most one command is in flight.
//!
//! # Mock implementations
//!
//! The [`mock`] module provides [`MockTransport`](mock::MockTransport) and
//! [`MockDiscovery`](mock::MockDiscovery) for development and testing
//! without physical hardware, following the `(device, handle)` pattern:
//! the handle scripts command responses and emits notifications.
//!
//! ```
//! use tagstream_transport::mock::MockTransport;
//! use tagstream_transport::traits::Transport;
//! use tagstream_transport::command::Command;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> tagstream_core::Result<()> {
//! let (transport, handle, _events) = MockTransport::new();
//!
//! transport.send(Command::ClearTags).await?;
//! assert_eq!(handle.sent_commands(), vec![Command::ClearTags]);
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod events;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use command::{Command, CommandChannel, CommandKind, CommandResponse};
pub use events::{
    Advertisement, ConnectionStatus, EdgeDirection, LogLevel, ReaderEvent, TagObservation,
};
pub use traits::Transport;
pub use types::{
    AntennaMapping, EdgeTrigger, GpioAction, GpioEntry, GpioKind, GpioStatus, InventoryParams,
    InventoryReadConfig, InventorySummary, IrMode, MemoryBank, ModuleSetup, ReaderInfo, SetupPatch,
};
