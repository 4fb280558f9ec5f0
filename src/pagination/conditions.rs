//! Stop conditions for counter-based pagination
//!
//! Offset and page-number strategies keep counting forever unless something
//! in the response says the data ran out. A [`StopCondition`] is that
//! something, expressed as data so it can come from a YAML source definition.

use super::types::{MoreCheck, PageContext};
use crate::error::Result;
use crate::extract::RecordPath;
use crate::http::ApiResponse;
use crate::types::JsonValue;

/// Ways of telling that the last page has been reached
#[derive(Debug, Clone, PartialEq)]
pub enum StopCondition {
    /// Continue while the record path matches at least one element
    EmptyPage {
        /// Path to the page's records
        records: RecordPath,
    },

    /// Continue while a boolean flag in the body is `true`
    HasMoreFlag {
        /// Path to the flag
        path: RecordPath,
    },

    /// Stop when a field has a specific value
    Field {
        /// Path to the field
        path: RecordPath,
        /// Value that means "no more pages"
        value: JsonValue,
    },

    /// Stop once the next offset would reach the total record count
    TotalCount {
        /// Path to the total count
        path: RecordPath,
        /// Offset increment per page
        page_size: u64,
    },

    /// Stop once `page_count * page_size` reaches the total record count
    ///
    /// For page-number pagination, where the counter is not a record offset.
    TotalRecords {
        /// Path to the total count
        path: RecordPath,
        /// Records per page
        page_size: u64,
    },

    /// Stop once as many pages as the reported total have been read
    TotalPages {
        /// Path to the total page count
        path: RecordPath,
    },
}

impl StopCondition {
    /// Continue while `records` matches something
    pub fn empty_page(records: &str) -> Result<Self> {
        Ok(Self::EmptyPage {
            records: RecordPath::parse(records)?,
        })
    }

    /// Continue while the flag at `path` is `true`
    pub fn has_more_flag(path: &str) -> Result<Self> {
        Ok(Self::HasMoreFlag {
            path: RecordPath::parse(path)?,
        })
    }

    /// Stop when the field at `path` equals `value`
    pub fn field(path: &str, value: impl Into<JsonValue>) -> Result<Self> {
        Ok(Self::Field {
            path: RecordPath::parse(path)?,
            value: value.into(),
        })
    }

    /// Stop when `offset + page_size` reaches the total at `path`
    pub fn total_count(path: &str, page_size: u64) -> Result<Self> {
        Ok(Self::TotalCount {
            path: RecordPath::parse(path)?,
            page_size,
        })
    }

    /// Stop when the records read so far reach the total at `path`
    pub fn total_records(path: &str, page_size: u64) -> Result<Self> {
        Ok(Self::TotalRecords {
            path: RecordPath::parse(path)?,
            page_size,
        })
    }

    /// Stop when the page count reaches the total at `path`
    pub fn total_pages(path: &str) -> Result<Self> {
        Ok(Self::TotalPages {
            path: RecordPath::parse(path)?,
        })
    }
}

impl MoreCheck for StopCondition {
    fn has_more(&self, response: &ApiResponse, page: &PageContext<'_, u64>) -> bool {
        let body = response.body();
        match self {
            Self::EmptyPage { records } => records.has_match(body),
            Self::HasMoreFlag { path } => matches!(path.first(body), Some(JsonValue::Bool(true))),
            // A missing field never matches the stop value
            Self::Field { path, value } => path.first(body).map_or(true, |found| &found != value),
            Self::TotalCount { path, page_size } => first_u64(path, body)
                .is_some_and(|total| page.current.saturating_add(*page_size) < total),
            Self::TotalRecords { path, page_size } => first_u64(path, body).is_some_and(|total| {
                u64::from(page.page_count).saturating_mul(*page_size) < total
            }),
            Self::TotalPages { path } => {
                first_u64(path, body).is_some_and(|total| u64::from(page.page_count) < total)
            }
        }
    }
}

fn first_u64(path: &RecordPath, body: &JsonValue) -> Option<u64> {
    match path.first(body)? {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
