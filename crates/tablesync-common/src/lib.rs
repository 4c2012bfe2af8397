//! tablesync Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging setup, and error handling for the tablesync workspace.
//!
//! # Overview
//!
//! - **Error Handling**: the fatal error taxonomy of a sync run
//! - **Logging**: `tracing` subscriber configuration shared by every binary
//! - **Types**: field values and sync modes used by the engine and the CLI
//!
//! # Example
//!
//! ```
//! use tablesync_common::types::FieldValue;
//!
//! let value = FieldValue::Text("42".to_string());
//! assert_eq!(value.as_text(), Some("42"));
//! assert!(FieldValue::Null.is_null());
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SyncError};
pub use types::{FieldValue, SyncMode};
