//! Key/value store port

use async_trait::async_trait;

use super::HostError;

/// Small persisted settings keyed by name, kept apart from the document.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, HostError>;

    /// Stores `value` under `key`.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), HostError>;
}
