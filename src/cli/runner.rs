//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::SourceConfig;
use crate::engine::{SyncConfig, SyncEngine};
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClient;
use crate::types::JsonValue;
use serde_json::json;
use std::fs;
use std::io::{self, Write};
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command, printing to stdout
    pub async fn run(&self) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.run_with_output(&mut out).await
    }

    /// Run the CLI command, printing to `out`
    pub async fn run_with_output<W: Write>(&self, out: &mut W) -> Result<()> {
        match &self.cli.command {
            Commands::Streams => self.streams(out),
            Commands::Validate => self.validate(out),
            Commands::Read {
                stream,
                config_json,
                max_pages,
                max_records,
            } => {
                let mut sync = SyncConfig::new();
                if let Some(max) = max_pages {
                    sync = sync.with_max_pages(*max);
                }
                if let Some(max) = max_records {
                    sync = sync.with_max_records(*max);
                }
                self.read(stream, config_json.as_deref(), sync, out).await
            }
        }
    }

    /// Load source definition
    fn load_source(&self) -> Result<SourceConfig> {
        let path = self
            .cli
            .source
            .as_ref()
            .ok_or_else(|| Error::config("Source file not specified (use -s flag)"))?;
        SourceConfig::load(path)
    }

    /// Load template config; inline JSON takes precedence over the file
    fn load_config(&self, inline: Option<&str>) -> Result<JsonValue> {
        if let Some(json_str) = inline {
            return serde_json::from_str(json_str)
                .map_err(|e| Error::config(format!("Invalid config JSON: {e}")));
        }

        if let Some(path) = &self.cli.config {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
            return serde_json::from_str(&content)
                .map_err(|e| Error::config(format!("Invalid config JSON: {e}")));
        }

        Ok(json!({}))
    }

    fn streams<W: Write>(&self, out: &mut W) -> Result<()> {
        let source = self.load_source()?;
        let streams: Vec<JsonValue> = source
            .streams
            .iter()
            .map(|s| {
                json!({
                    "name": s.name,
                    "parent": s.parent.as_ref().map(|p| p.stream.as_str()),
                })
            })
            .collect();

        write_line(out, &json!({"source": source.name, "streams": streams}))
    }

    fn validate<W: Write>(&self, out: &mut W) -> Result<()> {
        let source = self.load_source()?;
        write_line(
            out,
            &json!({
                "valid": true,
                "message": format!(
                    "Source '{}' is valid with {} streams",
                    source.name,
                    source.streams.len()
                ),
            }),
        )
    }

    async fn read<W: Write>(
        &self,
        stream: &str,
        config_json: Option<&str>,
        sync: SyncConfig,
        out: &mut W,
    ) -> Result<()> {
        let source = self.load_source()?;
        let config = self.load_config(config_json)?;
        let client = HttpClient::with_config(source.http_client_config())?;
        let mut engine = SyncEngine::new(client).with_config(sync);

        let records = engine.sync_stream(&source, stream, &config).await?;
        for record in &records {
            write_line(out, record)?;
        }

        let stats = engine.stats();
        info!(
            records = stats.records_synced,
            pages = stats.pages_fetched,
            partitions = stats.partitions_synced,
            duration_ms = stats.duration_ms,
            "Read complete"
        );
        Ok(())
    }
}

fn write_line<W: Write, T: serde::Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
