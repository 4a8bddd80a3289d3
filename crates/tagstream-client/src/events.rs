//! Events fanned out to session subscribers.
//!
//! Subscribers receive every event exactly once per occurrence, in the
//! order the session processed the underlying notifications. Failures on
//! the asynchronous notification path (such as a failed stream restart)
//! are reported here, never thrown into an unrelated caller's context.

use crate::supervisor::ConnectionState;
use tagstream_transport::events::EdgeDirection;

/// Event delivered to session subscribers.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SessionEvent {
    /// The connection state changed.
    ///
    /// `detail` carries the transport's failure description when the
    /// transition was caused by an error.
    ConnectionChanged {
        state: ConnectionState,
        detail: Option<String>,
    },

    /// An inventory round deposited observations into the tag store.
    ///
    /// Emitted after ingestion completes, so draining in response to this
    /// event always sees the round's data.
    TagsUpdated { added: usize, updated: usize },

    /// Automatic restart of the inventory stream failed.
    ///
    /// The stream remains stopped until the next device stop notification
    /// or a manual start.
    StreamRestartFailed { detail: String },

    /// A GPIO pin changed state.
    GpioEdge { source: u8, direction: EdgeDirection },
}
