//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and the host.
//! Each port is a trait implemented by adapters in the infrastructure layer.

mod host_bridge;
mod key_value;

pub use host_bridge::{HostBridge, HostError, TransportError};
pub use key_value::KeyValueStore;
