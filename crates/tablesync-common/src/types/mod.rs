//! Common types used across tablesync

use serde::{Deserialize, Serialize};

/// A normalized field value
///
/// Null normalization only ever produces [`FieldValue::Null`] or
/// [`FieldValue::Text`]. The typed variants come from configured coercion
/// rules. Serializes to the matching JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// The string payload, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as it would appear in a key filter.
    ///
    /// Returns `None` for null.
    pub fn to_key_string(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Boolean(b) => Some(b.to_string()),
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::Text(s) => Some(s.clone()),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Null => write!(f, "NULL"),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// How a run writes rows to the remote table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SyncMode {
    /// Bulk insert of new records, `batch_size` rows per request
    Insert { batch_size: usize },
    /// Per-row update of existing records matched on `key_column`
    Update { key_column: String },
}

impl SyncMode {
    pub fn as_str(&self) -> &str {
        match self {
            SyncMode::Insert { .. } => "insert",
            SyncMode::Update { .. } => "update",
        }
    }

    /// The key column, for update runs
    pub fn key_column(&self) -> Option<&str> {
        match self {
            SyncMode::Insert { .. } => None,
            SyncMode::Update { key_column } => Some(key_column),
        }
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
