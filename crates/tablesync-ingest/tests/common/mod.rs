//! Shared helpers for engine integration tests
//!
//! [`RecordingWriter`] stands in for the remote store: it records every call
//! and answers with scripted outcomes, or with a success sized to the request.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::io::Write;
use std::sync::Mutex;
use tablesync_ingest::{Batch, NormalizedRecord, Outcome, TableWriter};
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

/// One call received by the writer
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Insert {
        table: String,
        rows: Vec<u64>,
    },
    Update {
        table: String,
        key_field: String,
        key_value: String,
        payload: NormalizedRecord,
    },
}

#[derive(Default)]
pub struct RecordingWriter {
    calls: Mutex<Vec<Call>>,
    scripted: Mutex<VecDeque<Outcome>>,
    existing_keys: Option<HashSet<String>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next calls with `outcomes`, in order
    pub fn with_outcomes(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        Self {
            scripted: Mutex::new(outcomes.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Updates succeed only for these keys and report not-found otherwise
    pub fn with_existing_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            existing_keys: Some(keys.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Cancel `token` once `calls` calls have been answered
    pub fn cancelling_after(mut self, calls: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((calls, token));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn insert_sizes(&self) -> Vec<usize> {
        self.calls()
            .iter()
            .filter_map(|call| match call {
                Call::Insert { rows, .. } => Some(rows.len()),
                _ => None,
            })
            .collect()
    }

    fn answer(&self, call: Call, default: Outcome) -> Outcome {
        let answered = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call);
            calls.len()
        };
        if let Some((after, token)) = &self.cancel_after {
            if answered >= *after {
                token.cancel();
            }
        }
        self.scripted.lock().unwrap().pop_front().unwrap_or(default)
    }
}

#[async_trait]
impl TableWriter for RecordingWriter {
    async fn insert_batch(&self, table: &str, batch: &Batch) -> Outcome {
        let call = Call::Insert {
            table: table.to_string(),
            rows: batch.records().iter().map(NormalizedRecord::row).collect(),
        };
        self.answer(call, Outcome::Success { rows: batch.len() })
    }

    async fn update_by_key(
        &self,
        table: &str,
        key_field: &str,
        key_value: &str,
        payload: &NormalizedRecord,
    ) -> Outcome {
        let default = match &self.existing_keys {
            Some(keys) if !keys.contains(key_value) => Outcome::NotFound,
            _ => Outcome::Success { rows: 1 },
        };
        let call = Call::Update {
            table: table.to_string(),
            key_field: key_field.to_string(),
            key_value: key_value.to_string(),
            payload: payload.clone(),
        };
        self.answer(call, default)
    }
}

/// Write `content` to a temporary `.csv` file
pub fn source_file(content: &str) -> NamedTempFile {
    source_bytes(content.as_bytes(), ".csv")
}

pub fn source_bytes(content: &[u8], suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("tablesync-")
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content).expect("Failed to write temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

/// Five question rows keyed by `id`
pub const QUESTIONS_CSV: &str = "id,title,points\n\
1,Algebra,10\n\
2,Geometry,NULL\n\
3,Calculus,\n\
4,Statistics,5\n\
5,Logic,null\n";
