//! `tablesync insert` command implementation
//!
//! Inserts every row of the source in fixed-size batches.

use super::{execute, CommandOutcome};
use crate::config::{self, Overrides};
use crate::error::Result;
use crate::TargetArgs;
use std::path::Path;
use tablesync_ingest::SyncJob;

pub async fn run(
    target: &TargetArgs,
    batch_size: Option<usize>,
    config_path: Option<&Path>,
    delimiter: Option<String>,
    json: bool,
) -> Result<CommandOutcome> {
    let config = config::load(
        config_path,
        &Overrides {
            delimiter,
            batch_size,
            key_column: None,
        },
    )?;

    let job = SyncJob::insert(&target.table, &target.file, config.sync.batch_size)
        .with_delimiter(config.sync.delimiter_for(&target.file))
        .with_row_count(!target.no_count);

    execute(job, &config, json).await
}
