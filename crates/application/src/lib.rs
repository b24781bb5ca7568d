//! Rattle Application - Store, execution pipeline and ports
//!
//! This crate defines the application layer with:
//! - Port traits for the host process (files, HTTP, key/value settings)
//! - The persisted tree store and its snapshot broadcast
//! - The proxy configuration store
//! - Request execution and the use cases built on it
//! - Bearer tokens for requests linked to an auth configuration
//! - Session state for open tabs and the sidebar tree

pub mod auth;
pub mod error;
pub mod execute_request;
pub mod ports;
pub mod proxy_store;
pub mod store;
pub mod tabs;
pub mod tree_view;
pub mod use_cases;

#[cfg(test)]
mod test_support;

pub use auth::{AuthError, EXPIRY_MARGIN, TokenStore};
pub use error::{ApplicationError, ApplicationResult};
pub use execute_request::{ExecuteRequest, ExecuteRequestError, ExecuteResult, ExecuteResultExt};
pub use ports::{HostBridge, HostError, KeyValueStore, TransportError};
pub use proxy_store::ProxyStore;
pub use store::{
    DefaultGroup, FnObserver, LoadOutcome, StoreError, StoreObserver, StoreSnapshot,
    SubscriptionId, TreeStore, generate_id,
};
pub use tabs::TabSet;
pub use tree_view::{TreeRow, TreeView};
pub use use_cases::{SaveRequest, SaveRequestError, SendRequest, SendRequestError};
