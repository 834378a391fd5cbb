use std::path::PathBuf;

use boxstore_core::{KeyError, ParseError, TargetError};
use thiserror::Error;

pub type Result<T, E = DatasetError> = std::result::Result<T, E>;

/// Everything that can fail while opening a dataset or loading one sample.
///
/// Sample-level errors carry the record key they were raised for.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to open store at {}: {source}", .path.display())]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: redb::Error,
    },
    #[error("store error: {0}")]
    Storage(#[from] redb::Error),
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("record `{key}` not found")]
    KeyNotFound { key: String },
    #[error("failed to decode image `{key}`: {source}")]
    Decode {
        key: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to parse annotation `{key}`: {source}")]
    Parse {
        key: String,
        #[source]
        source: ParseError,
    },
    #[error("unusable annotation `{key}`: {source}")]
    Target {
        key: String,
        #[source]
        source: TargetError,
    },
    #[error("index {index} out of bounds for dataset of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("invalid index range {start}..={end}: {reason}")]
    InvalidRange {
        start: usize,
        end: usize,
        reason: &'static str,
    },
    #[error("invalid resize target {width}x{height}")]
    InvalidTransform { width: u32, height: u32 },
}

impl DatasetError {
    /// The target-conversion failure behind this error, if any.
    pub fn target_error(&self) -> Option<&TargetError> {
        match self {
            DatasetError::Target { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<redb::TransactionError> for DatasetError {
    fn from(err: redb::TransactionError) -> Self {
        DatasetError::Storage(err.into())
    }
}

impl From<redb::TableError> for DatasetError {
    fn from(err: redb::TableError) -> Self {
        DatasetError::Storage(err.into())
    }
}

impl From<redb::StorageError> for DatasetError {
    fn from(err: redb::StorageError) -> Self {
        DatasetError::Storage(err.into())
    }
}

impl From<redb::CommitError> for DatasetError {
    fn from(err: redb::CommitError) -> Self {
        DatasetError::Storage(err.into())
    }
}
