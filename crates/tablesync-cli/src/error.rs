//! Error types for the tablesync CLI
//!
//! Every variant is user-facing and says what to check next.

use tablesync_common::SyncError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Fatal CLI error; the process exits with status 1
#[derive(Error, Debug)]
pub enum CliError {
    /// The source file is missing or its header is unusable
    #[error("{0}. Check the file path, the delimiter (--delimiter) and the header row.")]
    Source(String),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your environment variables, .env file or tablesync.toml.")]
    Config(String),

    /// The background sync task did not finish
    #[error("Sync task failed: {0}")]
    Task(String),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions.")]
    Io(#[from] std::io::Error),

    /// JSON output failed
    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a task error
    pub fn task(msg: impl Into<String>) -> Self {
        Self::Task(msg.into())
    }
}

impl From<SyncError> for CliError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Config(msg) => Self::Config(msg),
            SyncError::Io(e) => Self::Io(e),
            SyncError::Serialization(e) => Self::Json(e),
            source_err => Self::Source(source_err.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for CliError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::task(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_config_error_is_not_prefixed_twice() {
        let err: CliError = SyncError::config("SUPABASE_URL must be set").into();
        let msg = err.to_string();
        assert!(msg.starts_with("Configuration error: SUPABASE_URL must be set."));
        assert_eq!(msg.matches("Configuration error").count(), 1);
    }

    #[test]
    fn test_source_errors_suggest_a_fix() {
        let err: CliError = SyncError::source_format("key column 'id' not found in header").into();
        assert!(matches!(err, CliError::Source(_)));
        assert!(err.to_string().contains("header row"));
    }
}
