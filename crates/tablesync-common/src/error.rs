//! Error types for tablesync
//!
//! Only conditions that abort a run are errors. Per-batch and per-row failures
//! are recorded as outcomes in the run accounting and never surface here.

use thiserror::Error;

/// Result type alias for tablesync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Fatal error for a sync run
#[derive(Error, Debug)]
pub enum SyncError {
    /// The source file could not be opened
    #[error("Source not found: '{path}': {source}")]
    SourceNotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The source header (or a row, once dispatch has started) is unusable
    #[error("Invalid source format: {0}")]
    SourceFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    /// Create a source-not-found error for `path`
    pub fn source_not_found(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::SourceNotFound {
            path: path.into(),
            source,
        }
    }

    /// Create a source format error
    pub fn source_format(msg: impl Into<String>) -> Self {
        Self::SourceFormat(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error is caused by the input file rather than the environment
    pub fn is_source_error(&self) -> bool {
        matches!(self, Self::SourceNotFound { .. } | Self::SourceFormat(_))
    }
}
