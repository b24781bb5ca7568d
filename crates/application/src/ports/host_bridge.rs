//! Host Bridge port
//!
//! Every file and network operation of the core is delegated to the host
//! through this trait, so the core can run against an in-memory fake.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rattle_domain::{ExecutionDescriptor, Response};

/// Errors reported by the host for file and directory operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// File not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// The host could not be reached or refused the call.
    #[error("Host unavailable: {0}")]
    Unavailable(String),
}

impl From<std::io::Error> for HostError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

/// Errors that prevent an HTTP call from producing any response.
///
/// A received response is never an error, whatever its status code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// DNS resolution failed.
    #[error("DNS lookup failed for {host}: {message}")]
    Dns {
        /// Host that could not be resolved
        host: String,
        /// Resolver message
        message: String,
    },

    /// The server refused the connection.
    #[error("Connection refused: {host}:{port}")]
    ConnectionRefused {
        /// Target host
        host: String,
        /// Target port
        port: u16,
    },

    /// The connection failed or was reset.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The call did not finish in time.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout that elapsed
        timeout_ms: u64,
    },

    /// The redirect limit was exceeded.
    #[error("Too many redirects (max {max})")]
    TooManyRedirects {
        /// Redirect limit
        max: usize,
    },

    /// The URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// TLS handshake or certificate failure.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

/// Capabilities the host process provides to the core.
#[async_trait]
pub trait HostBridge: Send + Sync {
    /// Reads a UTF-8 file.
    ///
    /// # Errors
    /// Returns an error if the file is missing or cannot be read.
    async fn read_file(&self, path: &Path) -> Result<String, HostError>;

    /// Writes a file, replacing any previous content.
    ///
    /// Implementations must not leave a truncated file behind on failure.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    async fn write_file(&self, path: &Path, contents: &str) -> Result<(), HostError>;

    /// Checks whether a file exists.
    async fn file_exists(&self, path: &Path) -> bool;

    /// Performs one HTTP call.
    ///
    /// # Errors
    /// Returns a `TransportError` only when no response was received.
    async fn execute_http(
        &self,
        descriptor: &ExecutionDescriptor,
    ) -> Result<Response, TransportError>;

    /// Directory holding the persisted document.
    ///
    /// # Errors
    /// Returns an error if the host cannot provide one.
    async fn app_data_dir(&self) -> Result<PathBuf, HostError>;
}
