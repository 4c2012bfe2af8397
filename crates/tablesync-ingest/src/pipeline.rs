//! Sync engine
//!
//! One logical worker runs reader, normalizer, dispatch and writer in
//! sequence. Insert runs send one request per batch, update runs one request
//! per row; there is never more than one call in flight.
//!
//! Cancellation is observed before every source row is read, never during a
//! remote call. An in-flight call always completes and is accounted for.
//! Rows of an insert batch that was still filling are dropped unsent and do
//! not count as processed.

use crate::accounting::{Interruption, RunAccounting, RunSummary};
use crate::batcher::Batcher;
use crate::coercion::CoercionRules;
use crate::dispatch::prepare_update;
use crate::normalize::normalize_record;
use crate::progress::{ProgressReporter, ProgressSnapshot};
use crate::reader::{CsvSource, RecordReader};
use crate::record::{Batch, NormalizedRecord};
use crate::writer::{Outcome, TableWriter};
use chrono::Utc;
use std::path::PathBuf;
use tablesync_common::{Result, SyncError, SyncMode};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

/// Parameters of one run
#[derive(Debug, Clone, PartialEq)]
pub struct SyncJob {
    pub table: String,
    pub source: PathBuf,
    pub mode: SyncMode,
    pub delimiter: u8,
    /// Count the source rows up front so observers can show a total
    pub count_rows: bool,
}

impl SyncJob {
    pub fn insert(table: impl Into<String>, source: impl Into<PathBuf>, batch_size: usize) -> Self {
        Self::new(table, source, SyncMode::Insert { batch_size })
    }

    pub fn update(
        table: impl Into<String>,
        source: impl Into<PathBuf>,
        key_column: impl Into<String>,
    ) -> Self {
        Self::new(
            table,
            source,
            SyncMode::Update {
                key_column: key_column.into(),
            },
        )
    }

    fn new(table: impl Into<String>, source: impl Into<PathBuf>, mode: SyncMode) -> Self {
        Self {
            table: table.into(),
            source: source.into(),
            mode,
            delimiter: b',',
            count_rows: true,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_row_count(mut self, count_rows: bool) -> Self {
        self.count_rows = count_rows;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(SyncError::config("table name must not be empty"));
        }
        match &self.mode {
            SyncMode::Insert { batch_size } if *batch_size == 0 => {
                Err(SyncError::config("batch size must be at least 1"))
            },
            SyncMode::Update { key_column } if key_column.trim().is_empty() => {
                Err(SyncError::config("key column must not be empty"))
            },
            _ => Ok(()),
        }
    }
}

/// Runs sync jobs against a [`TableWriter`]
pub struct SyncEngine<W> {
    writer: W,
    coercion: CoercionRules,
    progress: ProgressReporter,
    cancel: CancellationToken,
}

impl<W: TableWriter> SyncEngine<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            coercion: CoercionRules::default(),
            progress: ProgressReporter::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_coercion(mut self, rules: CoercionRules) -> Self {
        self.coercion = rules;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Receiver for progress snapshots of every run of this engine
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.progress.subscribe()
    }

    /// Token that stops the current run at the next unit boundary
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run `job` to completion
    ///
    /// Errors are returned only for conditions detected before the first
    /// remote call: invalid parameters, a missing source, an unusable header
    /// or a missing key column. Everything after that ends in a summary.
    pub async fn run(&self, job: &SyncJob) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "sync_run",
            %run_id,
            table = %job.table,
            mode = %job.mode
        );
        self.run_inner(job, run_id).instrument(span).await
    }

    async fn run_inner(&self, job: &SyncJob, run_id: Uuid) -> Result<RunSummary> {
        let started_at = Utc::now();
        job.validate()?;
        self.progress.reset();

        let source = CsvSource::new(&job.source).with_delimiter(job.delimiter);
        let reader = source.open()?;
        if let Some(key_column) = job.mode.key_column() {
            reader.require_column(key_column)?;
        }

        let total = if job.count_rows {
            match count_rows(&source).await {
                Ok(total) => {
                    self.progress.set_total(total);
                    Some(total)
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Could not count source rows");
                    None
                },
            }
        } else {
            None
        };

        if !self.coercion.is_empty() {
            debug!(rules = self.coercion.len(), "Coercion rules active");
        }

        self.progress.status(format!(
            "Starting {} of '{}' into table '{}'{}",
            job.mode,
            source.name(),
            job.table,
            total.map(|t| format!(" ({} rows)", t)).unwrap_or_default()
        ));

        let mut counts = RunAccounting::default();
        let interrupted = match &job.mode {
            SyncMode::Insert { batch_size } => {
                self.run_insert(&job.table, reader, *batch_size, &mut counts)
                    .await?
            },
            SyncMode::Update { key_column } => {
                self.run_update(&job.table, reader, key_column, &mut counts)
                    .await
            },
        };

        let summary = RunSummary {
            run_id,
            table: job.table.clone(),
            source: source.name(),
            mode: job.mode.clone(),
            counts,
            total,
            started_at,
            finished_at: Utc::now(),
            interrupted,
        };

        let message = match &summary.interrupted {
            None => format!(
                "Finished: {} processed, {} succeeded, {} failed",
                counts.processed, counts.succeeded, counts.failed
            ),
            Some(reason) => format!(
                "Stopped ({}): {} processed, {} succeeded, {} failed",
                reason, counts.processed, counts.succeeded, counts.failed
            ),
        };
        self.progress.finish(counts, message);
        if counts.has_failures() {
            tracing::warn!(
                failed = counts.failed,
                "Some rows were not written, review the warnings above"
            );
        }

        Ok(summary)
    }

    fn next_record(
        &self,
        reader: &mut RecordReader,
    ) -> std::result::Result<Option<NormalizedRecord>, Interruption> {
        match reader.next() {
            None => Ok(None),
            Some(Ok(record)) => {
                let mut normalized = normalize_record(&record);
                self.coercion.apply(&mut normalized);
                Ok(Some(normalized))
            },
            Some(Err(e)) => {
                self.progress.warn(format!("Stopped reading source: {}", e));
                Err(Interruption::SourceError(e.to_string()))
            },
        }
    }

    async fn run_insert(
        &self,
        table: &str,
        mut reader: RecordReader,
        batch_size: usize,
        counts: &mut RunAccounting,
    ) -> Result<Option<Interruption>> {
        let mut batcher = Batcher::new(batch_size)?;
        let mut batch_number = 0u64;
        let mut interrupted = None;

        loop {
            if self.cancel.is_cancelled() {
                let dropped = batcher.pending();
                self.progress.warn(format!(
                    "Cancellation requested, no further batches will be sent ({} unsent rows dropped)",
                    dropped
                ));
                return Ok(Some(Interruption::Cancelled));
            }
            match self.next_record(&mut reader) {
                Ok(Some(record)) => {
                    if let Some(batch) = batcher.push(record) {
                        batch_number += 1;
                        self.submit_batch(table, batch_number, &batch, counts).await;
                    }
                },
                Ok(None) => break,
                Err(reason) => {
                    interrupted = Some(reason);
                    break;
                },
            }
        }

        // After a source error the records already read are still sent
        if let Some(batch) = batcher.finish() {
            batch_number += 1;
            self.submit_batch(table, batch_number, &batch, counts).await;
        }

        Ok(interrupted)
    }

    async fn submit_batch(
        &self,
        table: &str,
        number: u64,
        batch: &Batch,
        counts: &mut RunAccounting,
    ) {
        let (first, last) = batch.row_range();
        let size = batch.len() as u64;
        self.progress.status(format!(
            "Inserting batch {} (rows {}-{}, {} records)",
            number, first, last, size
        ));

        counts.record_dispatched(size);
        let outcome = self.writer.insert_batch(table, batch).await;
        counts.record_outcome(&outcome, size);

        if outcome.is_success() {
            debug!(batch = number, "Batch inserted");
        } else {
            self.progress.warn(format!(
                "Batch {} (rows {}-{}) failed: {}",
                number,
                first,
                last,
                outcome.describe()
            ));
        }
        self.progress.update_counts(*counts);
    }

    async fn run_update(
        &self,
        table: &str,
        mut reader: RecordReader,
        key_column: &str,
        counts: &mut RunAccounting,
    ) -> Option<Interruption> {
        loop {
            if self.cancel.is_cancelled() {
                self.progress.warn("Cancellation requested, no further rows will be sent");
                return Some(Interruption::Cancelled);
            }
            let record = match self.next_record(&mut reader) {
                Ok(Some(record)) => record,
                Ok(None) => return None,
                Err(reason) => return Some(reason),
            };

            let row = record.row();
            counts.record_dispatched(1);

            match prepare_update(record, key_column) {
                Err(reason) => {
                    counts.record_skipped();
                    self.progress.warn(format!("Row {}: skipped, {}", row, reason));
                },
                Ok(op) => {
                    self.progress.status(format!(
                        "Updating row {} ({} = '{}')",
                        row, key_column, op.key_value
                    ));
                    let outcome = self
                        .writer
                        .update_by_key(table, key_column, &op.key_value, &op.payload)
                        .await;
                    counts.record_outcome(&outcome, 1);

                    match &outcome {
                        Outcome::Success { .. } => debug!(row, "Row updated"),
                        Outcome::NotFound => self.progress.warn(format!(
                            "Row {}: no row in '{}' with {} = '{}'",
                            row, table, key_column, op.key_value
                        )),
                        _ => self.progress.warn(format!(
                            "Row {} ({} = '{}') failed: {}",
                            row,
                            key_column,
                            op.key_value,
                            outcome.describe()
                        )),
                    }
                },
            }
            self.progress.update_counts(*counts);
        }
    }
}

/// Full pass over the source on the blocking pool
async fn count_rows(source: &CsvSource) -> Result<u64> {
    let source = source.clone();
    tokio::task::spawn_blocking(move || source.count_records())
        .await
        .map_err(|e| SyncError::source_format(format!("row count task failed: {}", e)))?
}

impl<W: TableWriter + 'static> SyncEngine<W> {
    /// Run `job` on a background task
    ///
    /// Subscribe and take the cancellation token before calling this.
    pub fn spawn(self, job: SyncJob) -> JoinHandle<Result<RunSummary>> {
        tokio::spawn(async move { self.run(&job).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_validation() {
        assert!(SyncJob::insert("questions", "q.csv", 10).validate().is_ok());
        assert!(SyncJob::insert("", "q.csv", 10).validate().is_err());
        assert!(SyncJob::insert("questions", "q.csv", 0).validate().is_err());
        assert!(SyncJob::update("questions", "q.csv", " ").validate().is_err());
    }

    #[test]
    fn test_job_defaults() {
        let job = SyncJob::update("exams", "exams.tsv", "exam_id").with_delimiter(b'\t');
        assert_eq!(job.mode.key_column(), Some("exam_id"));
        assert_eq!(job.delimiter, b'\t');
        assert!(job.count_rows);
    }
}
