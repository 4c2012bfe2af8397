//! Run accounting and the final summary

use crate::writer::Outcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tablesync_common::SyncMode;
use uuid::Uuid;

/// Counters for one run
///
/// Every outcome moves exactly one counter: successes by the unit size,
/// not-found by one, failures by the unit size. `processed` counts records
/// consumed at dispatch time, skipped records included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunAccounting {
    pub processed: u64,
    pub succeeded: u64,
    pub not_found_or_skipped: u64,
    pub failed: u64,
}

impl RunAccounting {
    pub fn record_dispatched(&mut self, records: u64) {
        self.processed += records;
    }

    /// Account for the outcome of a unit of `units` records
    pub fn record_outcome(&mut self, outcome: &Outcome, units: u64) {
        match outcome {
            Outcome::Success { .. } => self.succeeded += units,
            Outcome::NotFound => self.not_found_or_skipped += 1,
            Outcome::RemoteRejected { .. } | Outcome::TransportFailure { .. } => {
                self.failed += units
            },
        }
    }

    /// A record dropped before any remote call
    pub fn record_skipped(&mut self) {
        self.failed += 1;
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Why a run stopped before reaching the end of the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Interruption {
    Cancelled,
    SourceError(String),
}

impl fmt::Display for Interruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interruption::Cancelled => write!(f, "cancelled"),
            Interruption::SourceError(msg) => write!(f, "source error: {}", msg),
        }
    }
}

/// Result of one run, emitted after the last unit even when units failed
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub table: String,
    pub source: String,
    #[serde(flatten)]
    pub mode: SyncMode,
    #[serde(flatten)]
    pub counts: RunAccounting,
    /// Data rows in the source when a counting pass ran
    pub total: Option<u64>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub interrupted: Option<Interruption>,
}

impl RunSummary {
    pub fn is_complete(&self) -> bool {
        self.interrupted.is_none()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = match self.mode {
            SyncMode::Insert { .. } => "Insert",
            SyncMode::Update { .. } => "Update",
        };
        writeln!(f, "--- {} Summary ---", title)?;
        writeln!(f, "Table: '{}'", self.table)?;
        writeln!(f, "Source: {}", self.source)?;
        writeln!(f, "Rows processed: {}", self.counts.processed)?;
        writeln!(f, "Rows succeeded: {}", self.counts.succeeded)?;
        if let SyncMode::Update { .. } = self.mode {
            writeln!(
                f,
                "Rows not found / skipped: {}",
                self.counts.not_found_or_skipped
            )?;
        }
        writeln!(f, "Rows failed: {}", self.counts.failed)?;
        if let Some(reason) = &self.interrupted {
            writeln!(f, "Interrupted: {}", reason)?;
        }
        writeln!(
            f,
            "Duration: {:.1}s",
            self.duration().num_milliseconds() as f64 / 1000.0
        )?;
        write!(f, "----------------------")
    }
}
