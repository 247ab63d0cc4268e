//! Error types for config store operations

use std::fmt;
use std::path::PathBuf;

/// Result type alias for config store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing configuration
#[derive(Debug)]
pub enum StoreError {
    /// Reading or writing the config file failed
    Io { path: PathBuf, source: std::io::Error },

    /// Config could not be serialized
    Serialization(serde_json::Error),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io { path, source } => {
                write!(f, "config file {} not accessible: {}", path.display(), source)
            }
            StoreError::Serialization(err) => write!(f, "config serialization error: {}", err),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            StoreError::Serialization(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err)
    }
}
