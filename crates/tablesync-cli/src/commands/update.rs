//! `tablesync update` command implementation
//!
//! Updates existing rows one at a time, matched on the key column.

use super::{execute, CommandOutcome};
use crate::config::{self, Overrides};
use crate::error::Result;
use crate::TargetArgs;
use std::path::Path;
use tablesync_ingest::SyncJob;

pub async fn run(
    target: &TargetArgs,
    key: Option<String>,
    config_path: Option<&Path>,
    delimiter: Option<String>,
    json: bool,
) -> Result<CommandOutcome> {
    let config = config::load(
        config_path,
        &Overrides {
            delimiter,
            batch_size: None,
            key_column: key,
        },
    )?;

    let job = SyncJob::update(&target.table, &target.file, &config.sync.key_column)
        .with_delimiter(config.sync.delimiter_for(&target.file))
        .with_row_count(!target.no_count);

    execute(job, &config, json).await
}
