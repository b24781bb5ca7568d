//! Host bridge for a desktop process: local files and real network calls.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rattle_application::{HostBridge, HostError, TransportError};
use rattle_domain::{ExecutionDescriptor, Response};
use tracing::debug;

use crate::adapters::ReqwestExecutor;
use crate::config::AppConfig;
use crate::persistence::TokioFileSystem;

/// Host bridge over the local file system and reqwest.
#[derive(Debug, Clone)]
pub struct LocalHostBridge {
    fs: TokioFileSystem,
    http: ReqwestExecutor,
    data_dir: PathBuf,
}

impl LocalHostBridge {
    /// Creates a bridge storing its files in `data_dir`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs: TokioFileSystem::new(),
            http: ReqwestExecutor::new(),
            data_dir: data_dir.into(),
        }
    }

    /// Creates a bridge for the configured data directory.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.data_dir.clone())
    }
}

#[async_trait]
impl HostBridge for LocalHostBridge {
    async fn read_file(&self, path: &Path) -> Result<String, HostError> {
        self.fs.read_to_string(path).await
    }

    async fn write_file(&self, path: &Path, contents: &str) -> Result<(), HostError> {
        debug!(path = %path.display(), bytes = contents.len(), "writing file");
        self.fs.write_atomic(path, contents.as_bytes()).await
    }

    async fn file_exists(&self, path: &Path) -> bool {
        self.fs.exists(path).await
    }

    async fn execute_http(
        &self,
        descriptor: &ExecutionDescriptor,
    ) -> Result<Response, TransportError> {
        self.http.execute(descriptor).await
    }

    async fn app_data_dir(&self) -> Result<PathBuf, HostError> {
        Ok(self.data_dir.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_files_live_under_data_dir() {
        let dir = TempDir::new().unwrap();
        let bridge = LocalHostBridge::from_config(&AppConfig::new(dir.path()));

        let data_dir = bridge.app_data_dir().await.unwrap();
        let path = data_dir.join("doc.json");
        assert!(!bridge.file_exists(&path).await);

        bridge.write_file(&path, "{\"requests\":[]}").await.unwrap();
        assert!(bridge.file_exists(&path).await);
        assert_eq!(bridge.read_file(&path).await.unwrap(), "{\"requests\":[]}");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let bridge = LocalHostBridge::new(dir.path());
        let path = dir.path().join("absent.json");

        assert_eq!(
            bridge.read_file(&path).await,
            Err(HostError::NotFound(path.clone()))
        );
    }
}
