// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # pagewise
//!
//! A pagination engine for cursor-driven REST APIs.
//!
//! Every supported style (offset, page number, a token in the body, or a
//! followable link) runs through one [`pagination::Paginator`] state machine
//! that counts pages, decides when the data ran out, and refuses to follow a
//! next-page token identical to the current one.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pagewise::pagination::{OffsetStrategy, Paginator};
//! use pagewise::extract::RecordPath;
//!
//! let records = RecordPath::parse("$.results[*]")?;
//! let mut paginator = Paginator::new(0, OffsetStrategy::until_empty(50, records.clone()))
//!     .with_records_path(records);
//!
//! while !paginator.is_finished() {
//!     let response = fetch_page(*paginator.current_value()).await?;
//!     for record in paginator.iter_records(&response) {
//!         println!("{record}");
//!     }
//!     paginator.advance(&response)?;
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  CLI  →  SourceConfig (YAML)  →  SyncEngine                  │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌──────────────┬──────────────┴──────────┬────────────────────┐
//! │    HTTP      │       Pagination        │      Extract       │
//! ├──────────────┼─────────────────────────┼────────────────────┤
//! │ Retry        │ Offset     Page number  │ JSONPath records   │
//! │ Rate limit   │ JSONPath   HATEOAS      │                    │
//! │ Link header  │ Loop detection          │                    │
//! └──────────────┴─────────────────────────┴────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// JSONPath record extraction
pub mod extract;

/// HTTP client with retry and rate limiting
pub mod http;

/// Pagination strategies
pub mod pagination;

/// Source and stream definitions
pub mod config;

/// Template interpolation
pub mod template;

/// Main execution engine
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::SourceConfig;
pub use engine::SyncEngine;
pub use pagination::{PageStrategy, Paginator};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
