//! Source definitions
//!
//! A source is a REST API plus the streams read from it, declared in YAML:
//!
//! ```yaml
//! name: readthedocs
//! base_url: https://readthedocs.org
//! headers:
//!   Authorization: "Token {{ config.token }}"
//! streams:
//!   - name: projects
//!     path: /api/v3/projects/
//!     record_path: $.results[*]
//!     pagination:
//!       type: offset
//!       page_size: 50
//!   - name: versions
//!     path: /api/v3/projects/{{ partition.project_slug }}/versions
//!     record_path: $.results[*]
//!     parent:
//!       stream: projects
//!       fields:
//!         project_slug: slug
//! ```

use crate::error::{Error, Result, ResultExt};
use crate::extract::RecordPath;
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::pagination::AnyPaginator;
use crate::template;
use crate::types::{BackoffType, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

// ============================================================================
// Top-Level Source Config
// ============================================================================

/// Complete source configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source name (e.g., "readthedocs")
    pub name: String,

    /// Base URL for API requests
    pub base_url: String,

    /// Headers sent with every request (templated)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Query parameters sent with every request (templated)
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Stream definitions
    #[serde(default)]
    pub streams: Vec<StreamConfig>,
}

impl SourceConfig {
    /// Parse and validate a source from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let source: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse source YAML: {e}")))?;
        source.validate()?;
        Ok(source)
    }

    /// Load and validate a source from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read source file '{}'", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Look up a stream by name
    pub fn stream(&self, name: &str) -> Result<&StreamConfig> {
        self.streams
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::stream_not_found(name))
    }

    /// Streams from the root ancestor down to `name`
    pub fn lineage(&self, name: &str) -> Result<Vec<&StreamConfig>> {
        let mut chain = vec![self.stream(name)?];
        while let Some(parent) = chain.last().copied().and_then(|s| s.parent.as_ref()) {
            if chain.len() > self.streams.len() {
                return Err(Error::config(format!(
                    "Stream '{name}' has a cyclic parent chain"
                )));
            }
            chain.push(self.stream(&parent.stream)?);
        }
        chain.reverse();
        Ok(chain)
    }

    /// HTTP client configuration for this source
    pub fn http_client_config(&self) -> HttpClientConfig {
        let backoff = &self.http.retry_backoff;
        let mut builder = HttpClientConfig::builder()
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(self.http.timeout_seconds))
            .max_retries(self.http.max_retries)
            .retry_statuses(self.http.retry_statuses.clone())
            .backoff(
                backoff.backoff_type,
                Duration::from_millis(backoff.initial_ms),
                Duration::from_millis(backoff.max_ms),
            );

        builder = match &self.http.rate_limit {
            Some(limit) => builder.rate_limit(RateLimiterConfig::new(
                limit.requests_per_second,
                limit.burst_size,
            )),
            None => builder.no_rate_limit(),
        };
        builder.build()
    }

    /// Validate the source definition
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::missing_field("name"));
        }
        if self.base_url.trim().is_empty() {
            return Err(Error::missing_field("base_url"));
        }
        Url::parse(&self.base_url)
            .map_err(|e| Error::config(format!("Invalid base_url '{}': {e}", self.base_url)))?;

        let mut seen = HashSet::new();
        for stream in &self.streams {
            if stream.name.trim().is_empty() {
                return Err(Error::config("Stream name cannot be empty"));
            }
            if !seen.insert(stream.name.as_str()) {
                return Err(Error::config(format!(
                    "Duplicate stream name '{}'",
                    stream.name
                )));
            }
        }

        for stream in &self.streams {
            self.validate_stream(stream)?;
        }
        Ok(())
    }

    fn validate_stream(&self, stream: &StreamConfig) -> Result<()> {
        let context = |e: Error| Error::config(format!("Stream '{}': {e}", stream.name));

        // Building the paginator compiles every path it uses
        let records = stream.records_path().map_err(context)?;
        AnyPaginator::from_config(&stream.pagination, records).map_err(context)?;

        if let Some(parent) = &stream.parent {
            if parent.fields.is_empty() {
                return Err(context(Error::missing_field("parent.fields")));
            }
            for path in parent.fields.values() {
                RecordPath::parse(path).map_err(context)?;
            }
            self.lineage(&stream.name)?;
        }

        let templates = std::iter::once(&stream.path)
            .chain(stream.params.values())
            .chain(stream.headers.values());
        for text in templates {
            for variable in template::extract_variables(text) {
                let partition_key = variable.strip_prefix("partition.");
                let known = match (partition_key, &stream.parent) {
                    (Some(key), Some(parent)) => parent.fields.contains_key(key)
                        || self.inherited_partition_key(parent, key),
                    (Some(_), None) => false,
                    (None, _) => variable.starts_with("config."),
                };
                if !known {
                    return Err(context(Error::undefined_var(variable)));
                }
            }
        }
        Ok(())
    }

    fn inherited_partition_key(&self, parent: &ParentConfig, key: &str) -> bool {
        self.lineage(&parent.stream)
            .map(|chain| {
                chain
                    .iter()
                    .filter_map(|s| s.parent.as_ref())
                    .any(|p| p.fields.contains_key(key))
            })
            .unwrap_or(false)
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// HTTP status codes to retry on
    #[serde(default = "default_retry_statuses")]
    pub retry_statuses: Vec<u16>,

    /// Retry backoff configuration
    #[serde(default)]
    pub retry_backoff: BackoffConfig,

    /// Rate limiting configuration; omitted means no client-side limit
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            retry_statuses: default_retry_statuses(),
            retry_backoff: BackoffConfig::default(),
            rate_limit: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_statuses() -> Vec<u16> {
    vec![429, 500, 502, 503, 504]
}

/// Backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    100
}

fn default_max_ms() -> u64 {
    60000
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests per second limit
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,

    /// Burst size
    #[serde(default = "default_rps")]
    pub burst_size: u32,
}

fn default_rps() -> u32 {
    10
}

// ============================================================================
// Stream Config
// ============================================================================

/// Stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Unique stream name
    pub name: String,

    /// API endpoint path (templated)
    pub path: String,

    /// Query parameters (templated)
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    /// Additional headers (templated)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// JSONPath to extract records; defaults to the items of a top-level array
    #[serde(default)]
    pub record_path: Option<String>,

    /// Pagination configuration
    #[serde(default)]
    pub pagination: PaginationConfigDef,

    /// Parent stream this stream is read once per record of
    #[serde(default)]
    pub parent: Option<ParentConfig>,
}

impl StreamConfig {
    /// Compiled record path
    pub fn records_path(&self) -> Result<RecordPath> {
        match &self.record_path {
            Some(path) => RecordPath::parse(path),
            None => Ok(RecordPath::default()),
        }
    }
}

/// Link from a child stream to its parent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentConfig {
    /// Parent stream name
    pub stream: String,

    /// Partition keys mapped to JSONPaths into each parent record
    pub fields: BTreeMap<String, String>,
}

// ============================================================================
// Pagination Config
// ============================================================================

/// Pagination configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaginationConfigDef {
    #[default]
    None,

    Offset {
        #[serde(default = "default_offset_param")]
        offset_param: String,
        #[serde(default = "default_limit_param")]
        limit_param: String,
        page_size: u64,
        #[serde(default)]
        start: u64,
        #[serde(default)]
        stop: StopConditionConfig,
    },

    PageNumber {
        #[serde(default = "default_page_param")]
        page_param: String,
        #[serde(default = "default_start_page")]
        start_page: u64,
        #[serde(default)]
        page_size_param: Option<String>,
        #[serde(default)]
        page_size: Option<u64>,
        #[serde(default)]
        stop: StopConditionConfig,
    },

    JsonPath {
        path: String,
        token_param: String,
    },

    LinkHeader {
        #[serde(default = "default_rel")]
        rel: String,
    },

    NextUrl {
        path: String,
    },
}

fn default_offset_param() -> String {
    "offset".to_string()
}

fn default_limit_param() -> String {
    "limit".to_string()
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_start_page() -> u64 {
    1
}

fn default_rel() -> String {
    "next".to_string()
}

/// Stop condition for counter-based pagination
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StopConditionConfig {
    /// Stop at the first page without records
    #[default]
    EmptyPage,

    HasMore {
        path: String,
    },

    Field {
        path: String,
        value: JsonValue,
    },

    /// Total record count; page-number pagination also needs `page_size`
    TotalCount {
        path: String,
    },

    TotalPages {
        path: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const SOURCE: &str = r#"
name: readthedocs
base_url: https://readthedocs.org
headers:
  Authorization: "Token {{ config.token }}"
http:
  max_retries: 2
  retry_backoff:
    type: constant
    initial_ms: 10
streams:
  - name: projects
    path: /api/v3/projects/
    record_path: $.results[*]
    params:
      expand: config
    pagination:
      type: offset
      page_size: 50
  - name: versions
    path: /api/v3/projects/{{ partition.project_slug }}/versions
    record_path: $.results[*]
    pagination:
      type: offset
      page_size: 50
    parent:
      stream: projects
      fields:
        project_slug: slug
"#;

    #[test]
    fn test_parse_source() {
        let source = SourceConfig::from_yaml(SOURCE).unwrap();
        assert_eq!(source.name, "readthedocs");
        assert_eq!(source.streams.len(), 2);

        let projects = source.stream("projects").unwrap();
        assert_eq!(
            projects.pagination,
            PaginationConfigDef::Offset {
                offset_param: "offset".to_string(),
                limit_param: "limit".to_string(),
                page_size: 50,
                start: 0,
                stop: StopConditionConfig::EmptyPage,
            }
        );
        assert_eq!(projects.records_path().unwrap().as_str(), "$.results[*]");
    }

    #[test]
    fn test_lineage() {
        let source = SourceConfig::from_yaml(SOURCE).unwrap();
        let names: Vec<&str> = source
            .lineage("versions")
            .unwrap()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["projects", "versions"]);
    }

    #[test]
    fn test_http_client_config() {
        let source = SourceConfig::from_yaml(SOURCE).unwrap();
        let config = source.http_client_config();

        assert_eq!(config.base_url.as_deref(), Some("https://readthedocs.org"));
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.backoff_type, BackoffType::Constant);
        assert_eq!(config.initial_backoff, Duration::from_millis(10));
        assert!(config.rate_limit.is_none());
    }

    #[test]
    fn test_pagination_config_variants() {
        let def: PaginationConfigDef =
            serde_yaml::from_str("type: json_path\npath: $.nextPageToken\ntoken_param: pageToken")
                .unwrap();
        assert_eq!(
            def,
            PaginationConfigDef::JsonPath {
                path: "$.nextPageToken".to_string(),
                token_param: "pageToken".to_string(),
            }
        );

        let def: PaginationConfigDef = serde_yaml::from_str("type: link_header").unwrap();
        assert_eq!(
            def,
            PaginationConfigDef::LinkHeader {
                rel: "next".to_string()
            }
        );

        let def: PaginationConfigDef = serde_yaml::from_str(
            "type: page_number\nstop:\n  type: has_more\n  path: $.hasMore",
        )
        .unwrap();
        match def {
            PaginationConfigDef::PageNumber {
                page_param,
                start_page,
                stop,
                ..
            } => {
                assert_eq!(page_param, "page");
                assert_eq!(start_page, 1);
                assert_eq!(
                    stop,
                    StopConditionConfig::HasMore {
                        path: "$.hasMore".to_string()
                    }
                );
            }
            other => panic!("Expected page_number, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_stream() {
        let source = SourceConfig::from_yaml(SOURCE).unwrap();
        let err = source.stream("builds").unwrap_err();
        assert!(matches!(err, Error::StreamNotFound { .. }));
    }

    #[test]
    fn test_rejects_duplicate_streams() {
        let yaml = r"
name: api
base_url: https://api.example.com
streams:
  - name: items
    path: /items
  - name: items
    path: /other
";
        let err = SourceConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("Duplicate stream name"));
    }

    #[test]
    fn test_rejects_missing_parent() {
        let yaml = r"
name: api
base_url: https://api.example.com
streams:
  - name: children
    path: /children
    parent:
      stream: nowhere
      fields:
        id: id
";
        let err = SourceConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::StreamNotFound { .. }));
    }

    #[test]
    fn test_rejects_cyclic_parents() {
        let yaml = r"
name: api
base_url: https://api.example.com
streams:
  - name: a
    path: /a
    parent: { stream: b, fields: { id: id } }
  - name: b
    path: /b
    parent: { stream: a, fields: { id: id } }
";
        let err = SourceConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("cyclic"));
    }

    #[test]
    fn test_rejects_bad_jsonpath() {
        let yaml = r"
name: api
base_url: https://api.example.com
streams:
  - name: items
    path: /items
    record_path: $.items[
";
        let err = SourceConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("Stream 'items'"));
    }

    #[test]
    fn test_rejects_unknown_template_variable() {
        let yaml = r"
name: api
base_url: https://api.example.com
streams:
  - name: items
    path: /items/{{ partition.id }}
";
        let err = SourceConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("partition.id"));
    }

    #[test]
    fn test_rejects_missing_base_url() {
        let err = SourceConfig::from_yaml("name: api\nbase_url: ''\n").unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SOURCE.as_bytes()).unwrap();

        let source = SourceConfig::load(file.path()).unwrap();
        assert_eq!(source.streams.len(), 2);

        let err = SourceConfig::load("/nonexistent/source.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read source file"));
    }
}
