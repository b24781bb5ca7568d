//! File-backed key/value settings.
//!
//! Every key lives in one small JSON object, `preferences.json`, next to
//! the request document.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rattle_application::{HostError, KeyValueStore};
use tokio::sync::Mutex;
use tracing::debug;

use super::TokioFileSystem;
use crate::serialization::{from_json, to_json_stable};

/// File name of the settings object inside the application data directory.
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// [`KeyValueStore`] persisted as a single JSON object file.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    fs: TokioFileSystem,
    // Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Creates a store backed by `preferences.json` in `data_dir`.
    #[must_use]
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::at(data_dir.join(PREFERENCES_FILE_NAME))
    }

    /// Creates a store backed by the given file.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fs: TokioFileSystem::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, HostError> {
        if !self.fs.exists(&self.path).await {
            return Ok(BTreeMap::new());
        }
        let json = self.fs.read_to_string(&self.path).await?;
        from_json(&json).map_err(|e| HostError::Io(format!("{}: {e}", self.path.display())))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, HostError> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), HostError> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value.to_string());

        let json = to_json_stable(&values).map_err(|e| HostError::Io(e.to_string()))?;
        self.fs.write_atomic(&self.path, json.as_bytes()).await?;
        debug!(key, path = %self.path.display(), "preference stored");
        Ok(())
    }
}
