//! `tablesync count` command implementation

use super::{check_extension, CommandOutcome};
use crate::config::{self, Overrides};
use crate::error::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use tablesync_ingest::reader::CsvSource;

#[derive(Debug, Serialize)]
struct CountReport {
    source: String,
    rows: u64,
    columns: Vec<String>,
}

pub async fn run(
    file: &Path,
    config_path: Option<&Path>,
    delimiter: Option<String>,
    json: bool,
) -> Result<CommandOutcome> {
    let config = config::load(
        config_path,
        &Overrides {
            delimiter,
            ..Overrides::default()
        },
    )?;
    check_extension(file);

    let source = CsvSource::new(file).with_delimiter(config.sync.delimiter_for(file));
    let columns = source.open()?.header().to_vec();
    let name = source.name();
    let rows = tokio::task::spawn_blocking(move || source.count_records()).await??;

    let report = CountReport {
        source: name,
        rows,
        columns,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} {}: {} rows, {} columns ({})",
            "✓".green(),
            report.source,
            report.rows,
            report.columns.len(),
            report.columns.join(", ")
        );
    }
    Ok(CommandOutcome::Completed)
}
