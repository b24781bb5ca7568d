//! Rattle Infrastructure - Host adapters
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer:
//! - `LocalHostBridge`: local files plus reqwest
//! - `InMemoryHostBridge` and `InMemoryKeyValueStore` for headless use
//! - `FileKeyValueStore`: preferences in a JSON file

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod serialization;

pub use adapters::{
    InMemoryHostBridge, InMemoryKeyValueStore, LocalHostBridge, ReqwestExecutor, USER_AGENT,
};
pub use config::{AppConfig, ConfigError, DEFAULT_LOG_FILTER};
pub use persistence::{FileKeyValueStore, PREFERENCES_FILE_NAME, TokioFileSystem};
pub use serialization::{SerializationError, from_json, to_json_stable};
