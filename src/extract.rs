//! Record-path extraction
//!
//! Applies a JSONPath expression to a parsed response body and yields the
//! matching sub-values in document order. Used by the paginators to pull the
//! per-page records and by strategies that inspect body content (next-page
//! tokens, has-more flags, totals).
//!
//! A path that matches nothing yields an empty sequence, never an error.
//! Syntax errors are reported once, when the path is parsed.

use crate::error::{Error, Result};
use crate::types::JsonValue;
use jsonpath_rust::JsonPath;
use std::fmt;
use std::sync::Arc;

/// Default records expression: the items of a top-level array
pub const DEFAULT_RECORDS_PATH: &str = "$[*]";

#[derive(Clone)]
enum Selector {
    /// Items of a top-level array, or values of a top-level object
    RootItems,
    /// Compiled JSONPath query
    Query(Arc<JsonPath>),
}

/// A compiled path expression selecting records from a JSON document
#[derive(Clone)]
pub struct RecordPath {
    expression: String,
    selector: Selector,
}

impl RecordPath {
    /// Parse a JSONPath expression
    ///
    /// Expressions without a leading `$` are treated as relative to the
    /// document root, so `data.next` is the same as `$.data.next`.
    pub fn parse(expression: &str) -> Result<Self> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(Error::json_path("Empty JSONPath expression"));
        }

        let expression = if trimmed.starts_with('$') {
            trimmed.to_string()
        } else {
            format!("$.{trimmed}")
        };

        if expression == DEFAULT_RECORDS_PATH {
            return Ok(Self::default());
        }

        let compiled: JsonPath = JsonPath::try_from(expression.as_str())
            .map_err(|e| Error::json_path(format!("Invalid JSONPath '{expression}': {e}")))?;

        Ok(Self {
            expression,
            selector: Selector::Query(Arc::new(compiled)),
        })
    }

    /// The normalized expression text
    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// Evaluate against a value, yielding every match in document order
    pub fn records(&self, value: &JsonValue) -> Records {
        let matches = match &self.selector {
            Selector::RootItems => match value {
                JsonValue::Array(items) => items.clone(),
                JsonValue::Object(map) => map.values().cloned().collect(),
                _ => Vec::new(),
            },
            Selector::Query(path) => match path.find(value) {
                JsonValue::Array(items) => items,
                JsonValue::Null => Vec::new(),
                other => vec![other],
            },
        };

        Records {
            inner: matches.into_iter(),
        }
    }

    /// First match, if any
    pub fn first(&self, value: &JsonValue) -> Option<JsonValue> {
        self.records(value).next()
    }

    /// Whether at least one element matches
    pub fn has_match(&self, value: &JsonValue) -> bool {
        self.first(value).is_some()
    }
}

impl Default for RecordPath {
    fn default() -> Self {
        Self {
            expression: DEFAULT_RECORDS_PATH.to_string(),
            selector: Selector::RootItems,
        }
    }
}

impl PartialEq for RecordPath {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
    }
}

impl fmt::Debug for RecordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordPath").field(&self.expression).finish()
    }
}

impl fmt::Display for RecordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

/// Single-pass sequence of values matched by a [`RecordPath`]
///
/// Evaluating the path again re-traverses the source document.
#[derive(Debug)]
pub struct Records {
    inner: std::vec::IntoIter<JsonValue>,
}

impl Iterator for Records {
    type Item = JsonValue;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Records {}

/// Parse `path` and evaluate it against `value` in one step
pub fn extract_records(value: &JsonValue, path: &str) -> Result<Records> {
    Ok(RecordPath::parse(path)?.records(value))
}
