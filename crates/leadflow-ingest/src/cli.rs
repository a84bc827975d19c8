//! Command-line definition for `leadflow-ingest`

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

/// Leadflow - load lead spreadsheets into the marketing dashboard
#[derive(Parser, Debug)]
#[command(name = "leadflow-ingest")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a CSV, XLSX or XLS file of leads
    Upload {
        /// File to ingest
        file: PathBuf,

        /// Rows per bulk insert (defaults to LEADFLOW_CHUNK_SIZE or 500)
        #[arg(short, long)]
        chunk_size: Option<usize>,

        /// Run the pipeline against an in-memory store
        #[arg(long)]
        dry_run: bool,
    },

    /// Show one ingestion record
    Status {
        /// Ingestion id
        id: Uuid,
    },

    /// List recent ingestions
    List {
        /// Maximum number of records
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },
}
