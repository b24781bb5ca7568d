//! Host bridge adapters.

mod local_host;
mod memory;
mod reqwest_client;

pub use local_host::LocalHostBridge;
pub use memory::{InMemoryHostBridge, InMemoryKeyValueStore};
pub use reqwest_client::{ReqwestExecutor, USER_AGENT};
