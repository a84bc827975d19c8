//! Leadflow ingest CLI - Main entry point

use clap::Parser;
use leadflow_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use leadflow_ingest::cli::{Cli, Commands};
use leadflow_ingest::commands;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Verbose mode logs debug output to the console; otherwise warnings only
    let log_config = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        })
        .output(LogOutput::Console)
        .log_file_prefix("leadflow-ingest")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging
    let _ = init_logging(&log_config);

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn execute_command(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Upload {
            file,
            chunk_size,
            dry_run,
        } => commands::upload::run(file, *chunk_size, *dry_run).await,
        Commands::Status { id } => commands::status::run(*id).await,
        Commands::List { limit } => commands::list::run(*limit).await,
    }
}
