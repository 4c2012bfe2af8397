//! Keyed dispatch for update runs
//!
//! Each record becomes at most one [`UpdateOperation`]. Rows that cannot be
//! addressed (no key) or that would send nothing (no other fields) are
//! skipped without a remote call and counted as failures by the caller.

use crate::record::NormalizedRecord;
use tablesync_common::FieldValue;
use thiserror::Error;

/// A single row update addressed by its primary key
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOperation {
    pub row: u64,
    pub key_value: String,
    /// The record without the key field
    pub payload: NormalizedRecord,
}

/// Why a record produced no update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("primary key value is empty")]
    MissingKey,

    #[error("no fields to update besides the primary key")]
    EmptyPayload,
}

/// Split `record` into key and payload
pub fn prepare_update(
    record: NormalizedRecord,
    key_column: &str,
) -> Result<UpdateOperation, SkipReason> {
    let row = record.row();
    let (key, payload) = record.split_off(key_column);

    let key_value = key
        .as_ref()
        .and_then(FieldValue::to_key_string)
        .filter(|value| !value.trim().is_empty())
        .ok_or(SkipReason::MissingKey)?;

    if payload.is_empty() {
        return Err(SkipReason::EmptyPayload);
    }

    Ok(UpdateOperation {
        row,
        key_value,
        payload,
    })
}
