//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Drives paginators against the HTTP client
//! - `SyncConfig` - Page and record limits for a sync
//! - `StreamRecord` - Output records tagged with their stream

mod types;

pub use types::{StreamRecord, SyncConfig, SyncStats};

use crate::config::{ParentConfig, SourceConfig, StreamConfig};
use crate::error::{Error, Result};
use crate::extract::RecordPath;
use crate::http::{HttpClient, PageRequest};
use crate::pagination::{AnyPaginator, PageDriver};
use crate::template::{self, TemplateContext};
use crate::types::{JsonObject, JsonValue};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    /// HTTP client
    client: HttpClient,
    /// Sync configuration
    config: SyncConfig,
    /// Statistics
    stats: SyncStats,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            config: SyncConfig::default(),
            stats: SyncStats::default(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Reset statistics
    pub fn reset_stats(&mut self) {
        self.stats = SyncStats::default();
    }

    /// Fetch pages until `driver` finishes, collecting their records
    ///
    /// Any fetch or pagination error aborts the traversal; records from
    /// earlier pages are discarded with it.
    pub async fn read_pages<D>(
        &mut self,
        driver: &mut D,
        base: &PageRequest,
    ) -> Result<Vec<JsonValue>>
    where
        D: PageDriver + ?Sized,
    {
        let limits = self.config.clone();
        let records = self.fetch_pages(driver, base, &limits).await?;
        self.stats.add_records(records.len());
        Ok(records)
    }

    /// Read every page of one stream for one partition
    pub async fn read_stream(
        &mut self,
        source: &SourceConfig,
        stream: &StreamConfig,
        context: &TemplateContext,
    ) -> Result<Vec<JsonValue>> {
        let limits = self.config.clone();
        let records = self.read_partition(source, stream, context, &limits).await?;
        self.stats.add_records(records.len());
        Ok(records)
    }

    /// Sync a stream by name, expanding parent streams into partitions
    ///
    /// Parent streams are read in full. Page and record limits apply to the
    /// requested stream only, with `max_records` bounding its total output
    /// across partitions. Only records of the requested stream are counted.
    pub async fn sync_stream(
        &mut self,
        source: &SourceConfig,
        stream_name: &str,
        config: &JsonValue,
    ) -> Result<Vec<StreamRecord>> {
        let start = Instant::now();
        let lineage = source.lineage(stream_name)?;
        info!(stream = stream_name, "Starting sync");

        let mut contexts = vec![TemplateContext::with_config(config.clone())];
        let mut records = Vec::new();

        for (depth, stream) in lineage.iter().enumerate() {
            let Some(child) = lineage.get(depth + 1) else {
                self.read_leaf(source, stream, &contexts, &mut records).await?;
                break;
            };

            let mut next_contexts = Vec::new();
            for context in &contexts {
                let parent_records = self
                    .read_partition(source, stream, context, &SyncConfig::default())
                    .await?;

                let Some(parent) = child.parent.as_ref() else {
                    continue;
                };
                for record in &parent_records {
                    match partition_for(parent, record, &context.partition)? {
                        Some(partition) => next_contexts.push(context.with_partition(partition)),
                        None => warn!(
                            stream = %stream.name,
                            "Skipping parent record missing partition fields"
                        ),
                    }
                }
            }

            debug!(
                stream = %stream.name,
                partitions = next_contexts.len(),
                "Expanded parent stream"
            );
            contexts = next_contexts;
        }

        self.stats.add_stream();
        self.stats.set_duration(start.elapsed().as_millis() as u64);

        info!(
            stream = stream_name,
            records = records.len(),
            pages = self.stats.pages_fetched,
            "Completed sync"
        );

        Ok(records)
    }

    /// Read the requested stream for each context, within the sync limits
    async fn read_leaf(
        &mut self,
        source: &SourceConfig,
        stream: &StreamConfig,
        contexts: &[TemplateContext],
        out: &mut Vec<StreamRecord>,
    ) -> Result<()> {
        let mut limits = self.config.clone();

        for context in contexts {
            if limits.max_records == Some(0) {
                debug!(stream = %stream.name, "Record limit reached, skipping partitions");
                break;
            }

            let page_records = self.read_partition(source, stream, context, &limits).await?;
            self.stats.add_records(page_records.len());
            if let Some(max) = limits.max_records.as_mut() {
                *max -= page_records.len();
            }

            out.extend(
                page_records
                    .into_iter()
                    .map(|record| StreamRecord::new(stream.name.as_str(), record)),
            );
        }

        Ok(())
    }

    /// One traversal of `stream` with a fresh paginator
    async fn read_partition(
        &mut self,
        source: &SourceConfig,
        stream: &StreamConfig,
        context: &TemplateContext,
        limits: &SyncConfig,
    ) -> Result<Vec<JsonValue>> {
        let base = base_request(source, stream, context)?;
        let mut paginator = AnyPaginator::from_config(&stream.pagination, stream.records_path()?)?;

        debug!(stream = %stream.name, url = %base.url, "Reading {paginator}");
        let records = self.fetch_pages(&mut paginator, &base, limits).await?;
        self.stats.add_partition();
        Ok(records)
    }

    /// The driving loop; counts pages but not records
    async fn fetch_pages<D>(
        &mut self,
        driver: &mut D,
        base: &PageRequest,
        limits: &SyncConfig,
    ) -> Result<Vec<JsonValue>>
    where
        D: PageDriver + ?Sized,
    {
        let mut records = Vec::new();

        while !driver.is_finished() {
            if let Some(max) = limits.max_pages {
                if driver.page_count() >= max {
                    warn!("{driver}: stopping after {max} pages");
                    break;
                }
            }

            let request = driver.next_request(base);
            let response = self.client.fetch(&request).await?;
            let page = driver.consume(&response)?;
            self.stats.add_page();

            let before = records.len();
            records.extend(page);
            if let Some(max) = limits.max_records {
                records.truncate(max);
            }

            debug!(
                page = driver.page_count(),
                records = records.len() - before,
                "Fetched page for {driver}"
            );

            if limits.max_records.is_some_and(|max| records.len() >= max) {
                debug!("{driver}: record limit reached");
                break;
            }
        }

        Ok(records)
    }
}

/// Request for the first page of `stream`, with templates rendered
fn base_request(
    source: &SourceConfig,
    stream: &StreamConfig,
    context: &TemplateContext,
) -> Result<PageRequest> {
    let mut request = PageRequest::new(template::render(&stream.path, context)?);

    for (key, value) in source.params.iter().chain(&stream.params) {
        let rendered = template::render(value, context)?;
        if !rendered.is_empty() {
            request.query.insert(key.clone(), rendered);
        }
    }

    request
        .headers
        .extend(template::render_map(&source.headers, context)?);
    request
        .headers
        .extend(template::render_map(&stream.headers, context)?);

    Ok(request)
}

/// Partition values for a child of `record`, on top of the inherited ones
///
/// Returns `None` when the record lacks one of the fields.
fn partition_for(
    parent: &ParentConfig,
    record: &JsonValue,
    inherited: &JsonValue,
) -> Result<Option<JsonValue>> {
    let mut partition = match inherited {
        JsonValue::Object(map) => map.clone(),
        _ => JsonObject::new(),
    };

    for (key, path) in &parent.fields {
        let path = RecordPath::parse(path)
            .map_err(|e| Error::config(format!("Parent field '{key}': {e}")))?;
        match path.first(record) {
            Some(JsonValue::Null) | None => return Ok(None),
            Some(value) => {
                partition.insert(key.clone(), value);
            }
        }
    }

    Ok(Some(JsonValue::Object(partition)))
}
