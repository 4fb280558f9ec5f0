//! CLI module
//!
//! Command-line interface for reading paginated streams.
//!
//! # Commands
//!
//! - `streams` - List stream names
//! - `validate` - Check a source definition
//! - `read` - Fetch every page of a stream and print its records

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
