//! Mock implementations for testing and development.
//!
//! This module provides simulated counterparts of the external
//! collaborators the session manager consumes, controllable
//! programmatically without physical hardware.

mod discovery;
mod transport;

pub use discovery::{MockDiscovery, MockDiscoveryHandle};
pub use transport::{MockTransport, MockTransportHandle};
