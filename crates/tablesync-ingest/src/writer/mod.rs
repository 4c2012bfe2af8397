//! Remote table writer
//!
//! A [`TableWriter`] performs exactly one remote call per invocation and
//! reports what happened as an [`Outcome`]. Writers never retry and never
//! return errors: every failure is classified into an outcome so the
//! pipeline can account for it and move on.

pub mod rest;

pub use rest::RestTableWriter;

use crate::record::{Batch, NormalizedRecord};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Classification of one remote call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The store applied the operation and returned `rows` rows
    Success { rows: usize },

    /// An update matched no row
    NotFound,

    /// The store answered with an error
    RemoteRejected {
        code: Option<String>,
        message: String,
        details: Option<String>,
    },

    /// The call did not complete
    TransportFailure { message: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Outcome::RemoteRejected { .. } | Outcome::TransportFailure { .. }
        )
    }

    pub(crate) fn rejected(
        code: Option<String>,
        message: impl Into<String>,
        details: Option<String>,
    ) -> Self {
        Outcome::RemoteRejected {
            code,
            message: message.into(),
            details,
        }
    }

    pub(crate) fn transport(message: impl Into<String>) -> Self {
        Outcome::TransportFailure {
            message: message.into(),
        }
    }

    /// One-line description for status messages
    pub fn describe(&self) -> String {
        match self {
            Outcome::Success { rows } => format!("{} row(s) written", rows),
            Outcome::NotFound => "no matching row".to_string(),
            Outcome::RemoteRejected {
                code,
                message,
                details,
            } => format!(
                "Code: {}, Message: {}, Details: {}",
                code.as_deref().unwrap_or("N/A"),
                message,
                details.as_deref().unwrap_or("N/A")
            ),
            Outcome::TransportFailure { message } => format!("Transport failure: {}", message),
        }
    }
}

/// Backend capable of inserting batches and updating rows by key
#[async_trait]
pub trait TableWriter: Send + Sync {
    /// Insert every record of `batch` into `table` in one request
    async fn insert_batch(&self, table: &str, batch: &Batch) -> Outcome;

    /// Update the row of `table` whose `key_field` equals `key_value`
    async fn update_by_key(
        &self,
        table: &str,
        key_field: &str,
        key_value: &str,
        payload: &NormalizedRecord,
    ) -> Outcome;
}

#[async_trait]
impl<T: TableWriter + ?Sized> TableWriter for Arc<T> {
    async fn insert_batch(&self, table: &str, batch: &Batch) -> Outcome {
        (**self).insert_batch(table, batch).await
    }

    async fn update_by_key(
        &self,
        table: &str,
        key_field: &str,
        key_value: &str,
        payload: &NormalizedRecord,
    ) -> Outcome {
        (**self)
            .update_by_key(table, key_field, key_value, payload)
            .await
    }
}
