//! tablesync Ingest Library
//!
//! Pushes rows of a local CSV/TSV file into a remote table, either as
//! batched inserts or as per-row updates keyed by a primary key column.
//!
//! # Pipeline
//!
//! - **Reader**: streams records from the source, header first
//! - **Normalizer**: empty strings and `NULL` become null
//! - **Coercion**: optional configured conversions to integer, float or boolean
//! - **Batcher / Dispatcher**: fixed-size insert batches or keyed updates
//! - **Writer**: one remote call per unit, classified as an [`Outcome`]
//! - **Accounting**: counters and a [`RunSummary`] at the end of every run
//!
//! # Example
//!
//! ```no_run
//! use tablesync_ingest::{RestTableWriter, SyncConfig, SyncEngine, SyncJob};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SyncConfig::from_env(None)?;
//!     let writer = RestTableWriter::new(&config.remote)?;
//!     let engine = SyncEngine::new(writer);
//!
//!     let job = SyncJob::insert("questions", "questions.csv", config.sync.batch_size);
//!     let summary = engine.run(&job).await?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

pub mod accounting;
pub mod batcher;
pub mod coercion;
pub mod config;
pub mod dispatch;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod reader;
pub mod record;
pub mod writer;

pub use accounting::{Interruption, RunAccounting, RunSummary};
pub use coercion::CoercionRules;
pub use config::{ConfigFile, SyncConfig};
pub use pipeline::{SyncEngine, SyncJob};
pub use progress::ProgressSnapshot;
pub use record::{Batch, NormalizedRecord, Record};
pub use writer::{Outcome, RestTableWriter, TableWriter};
