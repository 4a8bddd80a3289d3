//! Core types for the tagstream RFID reader client.
//!
//! This crate defines the pieces shared by every other tagstream crate:
//! the error taxonomy, scheme-qualified device addressing, hex string
//! helpers, and protocol-level constants. It deliberately contains no I/O
//! and no async code so that higher layers can depend on it from any
//! context.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{DeviceUri, UriScheme, parse_hex_string, to_hex_string};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
