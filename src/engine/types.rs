//! Engine types
//!
//! Output records and configuration for the sync engine.

use crate::types::JsonValue;
use serde::Serialize;

/// A record emitted by a sync, tagged with its stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamRecord {
    /// Stream name
    pub stream: String,
    /// The record as extracted from the page
    pub record: JsonValue,
}

impl StreamRecord {
    pub fn new(stream: impl Into<String>, record: JsonValue) -> Self {
        Self {
            stream: stream.into(),
            record,
        }
    }
}

/// Configuration for sync operation
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Stop a traversal after this many pages
    pub max_pages: Option<u32>,
    /// Stop after this many records; in `sync_stream`, across all partitions
    pub max_records: Option<usize>,
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max pages per traversal
    #[must_use]
    pub fn with_max_pages(mut self, max: u32) -> Self {
        self.max_pages = Some(max);
        self
    }

    /// Set max records
    #[must_use]
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = Some(max);
        self
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Total records synced
    pub records_synced: usize,
    /// Total pages fetched
    pub pages_fetched: usize,
    /// Total streams synced
    pub streams_synced: usize,
    /// Total partitions synced
    pub partitions_synced: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    pub fn add_records(&mut self, count: usize) {
        self.records_synced += count;
    }

    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    pub fn add_partition(&mut self) {
        self.partitions_synced += 1;
    }

    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
