//! Materialized API responses
//!
//! Paginators never see a live connection. The transport hands them an
//! [`ApiResponse`]: status, parsed JSON body, headers and the URL that was
//! requested.

use crate::error::Result;
use crate::types::JsonValue;
use reqwest::header::{HeaderMap, LINK};
use reqwest::StatusCode;
use url::Url;

/// A fully received HTTP response with a parsed JSON body
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: JsonValue,
    headers: HeaderMap,
    url: Option<Url>,
}

impl ApiResponse {
    /// Create a response with the given status and body
    pub fn new(status: StatusCode, body: JsonValue) -> Self {
        Self {
            status,
            body,
            headers: HeaderMap::new(),
            url: None,
        }
    }

    /// Create a `200 OK` response with the given body
    pub fn ok(body: JsonValue) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Set the response headers
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set the URL this response was fetched from
    #[must_use]
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Read a `reqwest` response to completion
    ///
    /// An empty body is treated as `null`. A body that is not JSON is an
    /// error; it is never masked as an empty page.
    pub async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let text = response.text().await?;

        let body = if text.trim().is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_str(&text)?
        };

        Ok(Self {
            status,
            body,
            headers,
            url: Some(url),
        })
    }

    /// HTTP status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Parsed JSON body
    pub fn body(&self) -> &JsonValue {
        &self.body
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// URL the response was fetched from, if known
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// All values of a header, in order, skipping non-UTF-8 values
    pub fn header_values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .get_all(name)
            .into_iter()
            .filter_map(|v| v.to_str().ok())
    }

    /// Every link advertised through `Link` headers
    pub fn links(&self) -> Vec<Link> {
        self.headers
            .get_all(LINK)
            .into_iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(parse_link_header)
            .collect()
    }

    /// Target of the first link carrying the given relation type
    pub fn link(&self, rel: &str) -> Option<String> {
        self.links()
            .into_iter()
            .find(|link| link.has_rel(rel))
            .map(|link| link.target)
    }
}

/// One entry of a `Link` header (RFC 8288)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Target URI reference, as written
    pub target: String,
    /// Relation types, lowercased
    pub rels: Vec<String>,
}

impl Link {
    /// Whether this link carries `rel` (relation types are case-insensitive)
    pub fn has_rel(&self, rel: &str) -> bool {
        self.rels.iter().any(|r| r.eq_ignore_ascii_case(rel))
    }
}

/// Parse a `Link` header value into its links
///
/// Format: `<url>; rel="next", <url>; rel="prev last"`. Commas inside the
/// angle brackets belong to the URL.
pub fn parse_link_header(header: &str) -> Vec<Link> {
    split_links(header)
        .into_iter()
        .filter_map(parse_link_value)
        .collect()
}

fn split_links(header: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_target = false;
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in header.char_indices() {
        match c {
            '<' if !in_quotes => in_target = true,
            '>' if !in_quotes => in_target = false,
            '"' if !in_target => in_quotes = !in_quotes,
            ',' if !in_target && !in_quotes => {
                parts.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&header[start..]);
    parts
}

fn parse_link_value(value: &str) -> Option<Link> {
    let value = value.trim();
    let rest = value.strip_prefix('<')?;
    let end = rest.find('>')?;
    let target = rest[..end].trim().to_string();

    let mut rels = Vec::new();
    for param in rest[end + 1..].split(';') {
        let Some((name, raw)) = param.split_once('=') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("rel") {
            continue;
        }
        let raw = raw.trim().trim_matches('"').trim_matches('\'');
        rels.extend(raw.split_whitespace().map(str::to_ascii_lowercase));
    }

    Some(Link { target, rels })
}
