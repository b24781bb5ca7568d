//! Real file system implementation.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rattle_application::HostError;
use rattle_domain::generate_id;
use tokio::fs;
use tracing::warn;

/// File access through `tokio::fs`.
#[derive(Debug, Clone, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    /// Creates a new `TokioFileSystem`.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Reads a file's contents as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid UTF-8.
    pub async fn read_to_string(&self, path: &Path) -> Result<String, HostError> {
        fs::read_to_string(path)
            .await
            .map_err(|e| map_io_error(path, e))
    }

    /// Replaces a file's contents without ever exposing a partial file.
    ///
    /// The contents go to a temporary sibling first, which is then renamed
    /// over the target. Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory, the temporary file or the rename
    /// fails. The target is left as it was in that case.
    pub async fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<(), HostError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| map_io_error(parent, e))?;
        }

        let temp = temp_sibling(path);
        fs::write(&temp, contents)
            .await
            .map_err(|e| map_io_error(&temp, e))?;

        if let Err(e) = fs::rename(&temp, path).await {
            if let Err(cleanup) = fs::remove_file(&temp).await {
                warn!(path = %temp.display(), error = %cleanup, "could not remove temporary file");
            }
            return Err(map_io_error(path, e));
        }
        Ok(())
    }

    /// Checks if a path exists.
    pub async fn exists(&self, path: &Path) -> bool {
        fs::metadata(path).await.is_ok()
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "file".into(), |n| n.to_string_lossy());
    path.with_file_name(format!(".{name}.{}.tmp", generate_id()))
}

fn map_io_error(path: &Path, error: std::io::Error) -> HostError {
    match error.kind() {
        ErrorKind::NotFound => HostError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => HostError::PermissionDenied(path.to_path_buf()),
        _ => HostError::Io(format!("{}: {error}", path.display())),
    }
}
