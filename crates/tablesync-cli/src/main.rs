//! tablesync CLI - Main entry point

use clap::Parser;
use std::process;
use tablesync_cli::commands::{self, CommandOutcome};
use tablesync_cli::{Cli, Commands};
use tablesync_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use tracing::error;

#[tokio::main]
async fn main() {
    // .env comes first so clap's env fallbacks (TABLESYNC_CONFIG) see it too
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Warnings only unless --verbose; LOG_* variables take precedence
    let base = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        })
        .output(LogOutput::Console)
        .log_file_prefix("tablesync-cli")
        .build();
    let log_config = base.clone().merge_env().unwrap_or(base);

    // The CLI works without logging, so a failed setup is not fatal
    let guard = init_logging(&log_config).ok().flatten();

    let code = match execute_command(&cli).await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            1
        },
    };

    // Flush file logs before exiting
    drop(guard);
    process::exit(code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> tablesync_cli::Result<CommandOutcome> {
    let config_path = cli.config.as_deref();
    let delimiter = cli.delimiter.clone();

    match &cli.command {
        Commands::Insert { target, batch_size } => {
            commands::insert::run(target, *batch_size, config_path, delimiter, cli.json).await
        },
        Commands::Update { target, key } => {
            commands::update::run(target, key.clone(), config_path, delimiter, cli.json).await
        },
        Commands::Count { file } => {
            commands::count::run(file, config_path, delimiter, cli.json).await
        },
    }
}
