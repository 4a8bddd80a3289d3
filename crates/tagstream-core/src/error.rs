//! Error types for reader session operations.
//!
//! This module defines the error taxonomy shared by every tagstream crate,
//! covering connection establishment, command execution, stream lifecycle,
//! and configuration validation failures.

use thiserror::Error;

/// Result type alias for tagstream operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while operating a reader session.
#[derive(Debug, Error)]
pub enum Error {
    /// No connection was established within the allowed wait.
    ///
    /// The underlying connection attempt is not cancelled; a late
    /// `Connected` notification is still observed and reflected in state.
    #[error("Connect timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The transport reported a connection-level failure.
    #[error("Transport failure: {detail}")]
    TransportFailure { detail: String },

    /// The device address could not be parsed or uses an unknown scheme.
    #[error("Invalid device address: {address}")]
    InvalidAddress { address: String },

    /// A conflicting operation is already in progress.
    #[error("Operation busy: {operation}")]
    Busy { operation: String },

    /// Operation attempted or interrupted without an active connection.
    #[error("Not connected")]
    Disconnected,

    /// A named antenna does not exist on this reader.
    #[error("Unknown antenna: {name}")]
    UnknownAntenna { name: String },

    /// Automatic restart of the inventory stream failed.
    #[error("Stream restart failed: {detail}")]
    RestartFailed { detail: String },

    /// A parameter was outside its valid range.
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// The device rejected or failed to execute a command.
    #[error("Command failed: {message}")]
    CommandFailed { message: String },

    /// The device answered a command with a response of the wrong kind.
    #[error("Unexpected response, expected {expected}")]
    UnexpectedResponse { expected: &'static str },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new connect timeout error.
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    /// Create a new transport failure error.
    pub fn transport(detail: impl Into<String>) -> Self {
        Self::TransportFailure {
            detail: detail.into(),
        }
    }

    /// Create a new invalid address error.
    pub fn invalid_address(address: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
        }
    }

    /// Create a new busy error naming the conflicting operation.
    pub fn busy(operation: impl Into<String>) -> Self {
        Self::Busy {
            operation: operation.into(),
        }
    }

    /// Create a new unknown antenna error.
    pub fn unknown_antenna(name: impl Into<String>) -> Self {
        Self::UnknownAntenna { name: name.into() }
    }

    /// Create a new restart failed error.
    pub fn restart_failed(detail: impl Into<String>) -> Self {
        Self::RestartFailed {
            detail: detail.into(),
        }
    }

    /// Create a new invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create a new command failed error.
    pub fn command_failed(message: impl Into<String>) -> Self {
        Self::CommandFailed {
            message: message.into(),
        }
    }
}
