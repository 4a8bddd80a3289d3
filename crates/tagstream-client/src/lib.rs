//! Session manager for RFID reader devices.
//!
//! This crate is the client-side core that supervises a reader connection
//! and turns the device's asynchronous notification feed into consistent,
//! queryable state:
//!
//! - [`ReaderSession`] — the facade: bounded-time connect/disconnect,
//!   blocking and streaming inventory, GPIO/antenna/settings surfaces.
//! - [`ConnectionSupervisor`](supervisor::ConnectionSupervisor) — the
//!   connection state machine, driven exclusively by transport
//!   notifications, fanning every transition out to subscribers.
//! - [`TagStore`] — the concurrent tag accumulation store with
//!   added/updated drain maps.
//! - [`StreamController`](stream::StreamController) — the continuous
//!   inventory lifecycle, including automatic restart after the device's
//!   autonomous stream stop.
//! - [`DiscoveryRegistry`] — the set of devices currently visible on the
//!   network segment.
//!
//! # Example
//!
//! ```
//! use tagstream_client::{ReaderSession, SessionConfig};
//! use tagstream_transport::mock::MockTransport;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> tagstream_core::Result<()> {
//! let (transport, handle, events) = MockTransport::new();
//! let session = ReaderSession::new(transport, events, SessionConfig::default());
//!
//! let target = "tcp://10.0.0.5".parse()?;
//! let connect = session.connect(&target);
//! // The device side confirms asynchronously:
//! let confirm = handle.complete_connect();
//! let (connected, _) = tokio::join!(connect, confirm);
//! connected?;
//!
//! let tags = session.run_inventory(Default::default()).await?;
//! println!("found {} tag(s)", tags.len());
//! # Ok(())
//! # }
//! ```

pub mod antenna;
pub mod config;
pub mod discovery;
pub mod events;
pub mod gpio;
pub mod session;
pub mod store;
pub mod stream;
pub mod supervisor;

// Re-export commonly used types for convenience
pub use config::SessionConfig;
pub use discovery::{DiscoveredDevice, DiscoveryEvent, DiscoveryRegistry};
pub use events::SessionEvent;
pub use session::ReaderSession;
pub use store::{TagRecord, TagStore};
pub use stream::StreamState;
pub use supervisor::ConnectionState;
