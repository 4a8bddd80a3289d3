//! Session-level constants.
//!
//! Defaults and bounds used across the tagstream crates. Timing values
//! reflect the behavior of the reader family this client targets: the
//! device needs several seconds to establish a serial or network session,
//! and a running inventory stream is stopped autonomously by the device
//! (roughly every 20 seconds), which the client reacts to rather than
//! timing locally.
//!
//! # Usage
//!
//! ```
//! use tagstream_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(DEFAULT_CONNECT_TIMEOUT, Duration::from_secs(10));
//!
//! fn validate_q(q: u8) -> bool {
//!     q <= MAX_INVENTORY_Q
//! }
//! ```

use std::time::Duration;

/// Default wait for a `Connected` notification after a connect request.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default wait for the device to confirm a requested stream stop before
/// the controller forces the stream state to idle.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(2);

/// Default wait for the transport's `Disconnected` notification after a
/// disconnect request before the supervisor applies the fallback
/// transition locally.
pub const DEFAULT_DISCONNECT_GRACE: Duration = Duration::from_secs(1);

/// Maximum inventory Q value accepted by the reader (0 = automatic).
pub const MAX_INVENTORY_Q: u8 = 15;

/// Maximum inventory session number accepted by the reader.
pub const MAX_INVENTORY_SESSION: u8 = 3;

/// Capacity of the device notification channel feeding a session.
pub const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Capacity of the broadcast channel fanning session events out to
/// subscribers. A subscriber that lags behind by more than this many
/// events misses the overwritten ones.
pub const SUBSCRIBER_CHANNEL_CAPACITY: usize = 256;
