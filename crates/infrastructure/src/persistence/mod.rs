//! File-backed persistence adapters.

mod file_system;
mod key_value;

pub use file_system::TokioFileSystem;
pub use key_value::{FileKeyValueStore, PREFERENCES_FILE_NAME};
