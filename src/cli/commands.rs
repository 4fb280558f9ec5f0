//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Paginated REST API reader
#[derive(Parser, Debug)]
#[command(name = "pagewise")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source definition file (YAML)
    #[arg(short, long, global = true)]
    pub source: Option<PathBuf>,

    /// Configuration file (JSON) exposed to templates as `config`
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List stream names
    Streams,

    /// Validate the source definition
    Validate,

    /// Read all pages of a stream, one JSON record per line
    Read {
        /// Stream to read
        #[arg(long)]
        stream: String,

        /// Inline config JSON
        #[arg(long)]
        config_json: Option<String>,

        /// Maximum pages per partition of the stream; parent streams are read in full
        #[arg(long)]
        max_pages: Option<u32>,

        /// Maximum records emitted for the stream
        #[arg(long)]
        max_records: Option<usize>,
    },
}
