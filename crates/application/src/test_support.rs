//! Fakes shared by the unit tests of this crate.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rattle_domain::{ExecutionDescriptor, Response};
use serde_json::json;
use tokio::sync::Semaphore;

use crate::ports::{HostBridge, HostError, KeyValueStore, TransportError};

pub const DATA_DIR: &str = "/data/rattle";

pub struct MockBridge {
    files: Mutex<HashMap<PathBuf, String>>,
    replies: Mutex<VecDeque<Result<Response, TransportError>>>,
    executed: Mutex<Vec<ExecutionDescriptor>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    no_data_dir: AtomicBool,
    hold_calls: AtomicBool,
    release: Semaphore,
}

impl Default for MockBridge {
    fn default() -> Self {
        Self {
            files: Mutex::default(),
            replies: Mutex::default(),
            executed: Mutex::default(),
            fail_reads: AtomicBool::default(),
            fail_writes: AtomicBool::default(),
            no_data_dir: AtomicBool::default(),
            hold_calls: AtomicBool::default(),
            release: Semaphore::new(0),
        }
    }
}

impl MockBridge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn document_path() -> PathBuf {
        Path::new(DATA_DIR).join(rattle_domain::DOCUMENT_FILE_NAME)
    }

    pub fn put_file(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.lock().insert(path.into(), contents.into());
    }

    pub fn file(&self, path: &Path) -> Option<String> {
        self.files.lock().get(path).cloned()
    }

    pub fn reply(&self, reply: Result<Response, TransportError>) {
        self.replies.lock().push_back(reply);
    }

    pub fn executed(&self) -> Vec<ExecutionDescriptor> {
        self.executed.lock().clone()
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn lose_data_dir(&self) {
        self.no_data_dir.store(true, Ordering::SeqCst);
    }

    pub fn hold_calls(&self) {
        self.hold_calls.store(true, Ordering::SeqCst);
    }

    pub fn release_one(&self) {
        self.release.add_permits(1);
    }
}

#[async_trait]
impl HostBridge for MockBridge {
    async fn read_file(&self, path: &Path) -> Result<String, HostError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(HostError::PermissionDenied(path.to_path_buf()));
        }
        self.file(path)
            .ok_or_else(|| HostError::NotFound(path.to_path_buf()))
    }

    async fn write_file(&self, path: &Path, contents: &str) -> Result<(), HostError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(HostError::Io("disk full".to_string()));
        }
        self.put_file(path, contents);
        Ok(())
    }

    async fn file_exists(&self, path: &Path) -> bool {
        self.files.lock().contains_key(path)
    }

    async fn execute_http(
        &self,
        descriptor: &ExecutionDescriptor,
    ) -> Result<Response, TransportError> {
        self.executed.lock().push(descriptor.clone());
        if self.hold_calls.load(Ordering::SeqCst) {
            if let Ok(permit) = self.release.acquire().await {
                permit.forget();
            }
        }
        let scripted = self.replies.lock().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(Response::new(200, "OK", Default::default(), json!("OK"), 5))
        })
    }

    async fn app_data_dir(&self) -> Result<PathBuf, HostError> {
        if self.no_data_dir.load(Ordering::SeqCst) {
            return Err(HostError::Unavailable("no data directory".to_string()));
        }
        Ok(PathBuf::from(DATA_DIR))
    }
}

#[derive(Default)]
pub struct MockKeyValue {
    values: Mutex<HashMap<String, String>>,
    fail: AtomicBool,
}

impl MockKeyValue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    pub fn put(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_string(), value.to_string());
    }

    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for MockKeyValue {
    async fn get(&self, key: &str) -> Result<Option<String>, HostError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(HostError::Unavailable("storage disabled".to_string()));
        }
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), HostError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(HostError::Unavailable("storage disabled".to_string()));
        }
        self.put(key, value);
        Ok(())
    }
}
