//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function. Insert and
//! update share the engine setup and reporting in [`execute`].

pub mod count;
pub mod insert;
pub mod update;

use crate::error::Result;
use crate::progress;
use colored::Colorize;
use std::path::Path;
use tablesync_common::SyncMode;
use tablesync_ingest::config::SyncConfig;
use tablesync_ingest::{
    CoercionRules, Interruption, RestTableWriter, RunSummary, SyncEngine, SyncJob,
};

/// How a command ended, mapped to the process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The whole source was processed, per-row failures included
    Completed,
    /// Reading stopped at an undecodable row
    SourceInterrupted,
    /// Stopped by Ctrl-C
    Cancelled,
}

impl CommandOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            CommandOutcome::Completed => 0,
            CommandOutcome::SourceInterrupted => 2,
            CommandOutcome::Cancelled => 130,
        }
    }
}

impl From<&RunSummary> for CommandOutcome {
    fn from(summary: &RunSummary) -> Self {
        match summary.interrupted {
            None => CommandOutcome::Completed,
            Some(Interruption::Cancelled) => CommandOutcome::Cancelled,
            Some(Interruption::SourceError(_)) => CommandOutcome::SourceInterrupted,
        }
    }
}

/// Warn about sources that do not look like delimited text
pub(crate) fn check_extension(file: &Path) {
    let known = file
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ["csv", "tsv", "txt"].iter().any(|k| ext.eq_ignore_ascii_case(k)));
    if !known {
        eprintln!(
            "{} '{}' does not have a .csv or .tsv extension, reading it as delimited text",
            "⚠".yellow(),
            file.display()
        );
    }
}

/// Run `job` against the configured remote store and report the result
pub(crate) async fn execute(job: SyncJob, config: &SyncConfig, json: bool) -> Result<CommandOutcome> {
    config.validate()?;
    check_extension(&job.source);

    let rules = CoercionRules::from_config(&config.sync.coercion)?;
    let writer = RestTableWriter::new(&config.remote)?;
    let engine = SyncEngine::new(writer).with_coercion(rules);

    if !json {
        println!(
            "{} {} '{}' into table '{}'",
            "→".cyan(),
            if matches!(job.mode, SyncMode::Insert { .. }) {
                "Inserting"
            } else {
                "Updating"
            },
            job.source.display(),
            job.table
        );
    }

    let cancel = engine.cancellation_token();
    let observer = progress::spawn_observer(engine.subscribe(), !json);
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling after the current request...");
            cancel.cancel();
        }
    });

    let result = engine.spawn(job).await;
    ctrl_c.abort();
    observer.await?;
    let summary = result??;

    report(&summary, json)?;
    Ok(CommandOutcome::from(&summary))
}

fn report(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("\n{}", summary);
    match &summary.interrupted {
        Some(Interruption::Cancelled) => {
            println!("\n{} Run cancelled, remaining rows were not sent.", "✗".red())
        },
        Some(Interruption::SourceError(msg)) => println!(
            "\n{} Stopped reading the source: {}. Rows after that point were not sent.",
            "✗".red(),
            msg
        ),
        None if summary.counts.has_failures() => println!(
            "\n{} Please review the warnings above. Some rows may not have been written.",
            "⚠".yellow()
        ),
        None => println!("\n{} Done", "✓".green()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CommandOutcome::Completed.exit_code(), 0);
        assert_eq!(CommandOutcome::SourceInterrupted.exit_code(), 2);
        assert_eq!(CommandOutcome::Cancelled.exit_code(), 130);
    }
}
