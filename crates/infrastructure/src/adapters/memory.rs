//! In-memory host adapters.
//!
//! Used by embedders that run without a disk or network, and by tests that
//! need to script what the host answers.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rattle_application::{HostBridge, HostError, KeyValueStore, TransportError};
use rattle_domain::{ExecutionDescriptor, Response};
use tracing::debug;

/// Host bridge that keeps files in a map and answers HTTP calls from a queue.
///
/// Calls with nothing queued fail with a connection error, like a host
/// without network access.
#[derive(Debug, Default)]
pub struct InMemoryHostBridge {
    data_dir: PathBuf,
    files: Mutex<HashMap<PathBuf, String>>,
    replies: Mutex<VecDeque<Result<Response, TransportError>>>,
    executed: Mutex<Vec<ExecutionDescriptor>>,
    read_only: AtomicBool,
}

impl InMemoryHostBridge {
    /// Creates an empty bridge reporting `data_dir` as its data directory.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Queues the outcome of the next HTTP call.
    pub fn push_reply(&self, reply: Result<Response, TransportError>) {
        self.replies.lock().push_back(reply);
    }

    /// Descriptors of every call made so far, oldest first.
    #[must_use]
    pub fn executed(&self) -> Vec<ExecutionDescriptor> {
        self.executed.lock().clone()
    }

    /// Stores a file.
    pub fn insert_file(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.lock().insert(path.into(), contents.into());
    }

    /// Returns a stored file.
    #[must_use]
    pub fn file(&self, path: &Path) -> Option<String> {
        self.files.lock().get(path).cloned()
    }

    /// Makes every later write fail.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }
}

#[async_trait]
impl HostBridge for InMemoryHostBridge {
    async fn read_file(&self, path: &Path) -> Result<String, HostError> {
        self.file(path)
            .ok_or_else(|| HostError::NotFound(path.to_path_buf()))
    }

    async fn write_file(&self, path: &Path, contents: &str) -> Result<(), HostError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(HostError::PermissionDenied(path.to_path_buf()));
        }
        self.insert_file(path, contents);
        Ok(())
    }

    async fn file_exists(&self, path: &Path) -> bool {
        self.files.lock().contains_key(path)
    }

    async fn execute_http(
        &self,
        descriptor: &ExecutionDescriptor,
    ) -> Result<Response, TransportError> {
        debug!(method = %descriptor.method, url = %descriptor.url, "in-memory call");
        self.executed.lock().push(descriptor.clone());
        self.replies.lock().pop_front().unwrap_or_else(|| {
            Err(TransportError::ConnectionFailed(
                "no network in memory host".to_string(),
            ))
        })
    }

    async fn app_data_dir(&self) -> Result<PathBuf, HostError> {
        Ok(self.data_dir.clone())
    }
}

/// Key/value store backed by a map.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, HostError> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), HostError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rattle_domain::{HttpMethod, ProxyConfig, Request};
    use serde_json::json;

    #[tokio::test]
    async fn test_files_round_trip() {
        let bridge = InMemoryHostBridge::new("/data");
        let path = Path::new("/data/doc.json");

        assert!(!bridge.file_exists(path).await);
        assert_eq!(
            bridge.read_file(path).await,
            Err(HostError::NotFound(path.to_path_buf()))
        );

        bridge.write_file(path, "{}").await.unwrap();
        assert!(bridge.file_exists(path).await);
        assert_eq!(bridge.read_file(path).await.unwrap(), "{}");
        assert_eq!(bridge.app_data_dir().await.unwrap(), PathBuf::from("/data"));
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() {
        let bridge = InMemoryHostBridge::new("/data");
        bridge.set_read_only(true);
        assert!(matches!(
            bridge.write_file(Path::new("/data/x"), "x").await,
            Err(HostError::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_replies_are_served_in_order() {
        let bridge = InMemoryHostBridge::new("/data");
        bridge.push_reply(Ok(Response::new(
            201,
            "Created",
            Default::default(),
            json!({"id": 1}),
            3,
        )));
        let request = Request::with_url("r", HttpMethod::Post, "http://example.test");
        let descriptor = ExecutionDescriptor::build(&request, &ProxyConfig::default());

        assert_eq!(bridge.execute_http(&descriptor).await.unwrap().status, 201);
        assert!(matches!(
            bridge.execute_http(&descriptor).await,
            Err(TransportError::ConnectionFailed(_))
        ));
        assert_eq!(bridge.executed().len(), 2);
    }

    #[tokio::test]
    async fn test_key_value_store() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
