//! Session configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tagstream_core::constants::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_DISCONNECT_GRACE, DEFAULT_STOP_GRACE,
    SUBSCRIBER_CHANNEL_CAPACITY,
};

/// Configuration for a [`ReaderSession`](crate::ReaderSession).
///
/// # Example
///
/// ```
/// use tagstream_client::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig {
///     connect_timeout: Duration::from_secs(5),
///     ..SessionConfig::default()
/// };
/// assert_eq!(config.connect_timeout, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum wait for a `Connected` notification during `connect`.
    pub connect_timeout: Duration,

    /// Maximum wait for the device's stop confirmation during
    /// `stop_stream` before the stream state is forced to idle.
    pub stop_grace: Duration,

    /// Maximum wait for the transport's `Disconnected` notification
    /// during `disconnect` before the fallback transition is applied.
    pub disconnect_grace: Duration,

    /// Capacity of the broadcast channel fanning session events out to
    /// subscribers.
    pub subscriber_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            stop_grace: DEFAULT_STOP_GRACE,
            disconnect_grace: DEFAULT_DISCONNECT_GRACE,
            subscriber_capacity: SUBSCRIBER_CHANNEL_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.stop_grace, Duration::from_secs(2));
        assert!(config.subscriber_capacity > 0);
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = SessionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
