//! Driving paginators against HTTP requests
//!
//! A [`Paginator`] only knows tokens. A [`PageDriver`] also knows where the
//! token goes in the next request, which is what the sync engine needs.

use super::conditions::StopCondition;
use super::strategies::{
    BodyLink, HateoasPaginator, HateoasStrategy, HeaderLink, HeaderLinkPaginator,
    JsonPathPaginator, JsonPathStrategy, OffsetPaginator, OffsetStrategy, PageNumberPaginator,
    PageNumberStrategy, SinglePage, SinglePagePaginator,
};
use super::types::{PageStrategy, Paginator};
use crate::config::{PaginationConfigDef, StopConditionConfig};
use crate::error::{Error, Result};
use crate::extract::RecordPath;
use crate::http::{ApiResponse, PageRequest};
use crate::types::JsonValue;
use std::fmt;
use url::Url;

/// A paginator that can shape the requests it consumes
pub trait PageDriver: fmt::Display {
    /// Whether the last page has been consumed
    fn is_finished(&self) -> bool;

    /// Pages consumed so far
    fn page_count(&self) -> u32;

    /// Request for the current page, derived from `base`
    fn next_request(&self, base: &PageRequest) -> PageRequest;

    /// Extract the records of `response` and advance
    fn consume(&mut self, response: &ApiResponse) -> Result<Vec<JsonValue>>;
}

// ============================================================================
// Bound paginator
// ============================================================================

/// A [`Paginator`] plus a function placing its token into a request
///
/// ```ignore
/// let paginator = Paginator::new(0, OffsetStrategy::until_empty(50, records));
/// let driver = BoundPaginator::new(paginator, |offset: &u64, request: &mut PageRequest| {
///     request.query.insert("skip".into(), offset.to_string());
/// });
/// ```
pub struct BoundPaginator<S: PageStrategy, F> {
    paginator: Paginator<S>,
    place: F,
}

impl<S, F> BoundPaginator<S, F>
where
    S: PageStrategy,
    F: Fn(&S::Token, &mut PageRequest),
{
    pub fn new(paginator: Paginator<S>, place: F) -> Self {
        Self { paginator, place }
    }

    pub fn paginator(&self) -> &Paginator<S> {
        &self.paginator
    }

    pub fn into_inner(self) -> Paginator<S> {
        self.paginator
    }
}

impl<S, F> PageDriver for BoundPaginator<S, F>
where
    S: PageStrategy,
    F: Fn(&S::Token, &mut PageRequest),
{
    fn is_finished(&self) -> bool {
        self.paginator.is_finished()
    }

    fn page_count(&self) -> u32 {
        self.paginator.page_count()
    }

    fn next_request(&self, base: &PageRequest) -> PageRequest {
        let mut request = base.clone();
        (self.place)(self.paginator.current_value(), &mut request);
        request
    }

    fn consume(&mut self, response: &ApiResponse) -> Result<Vec<JsonValue>> {
        self.paginator.process_page(response)
    }
}

impl<S: PageStrategy, F> fmt::Display for BoundPaginator<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.paginator, f)
    }
}

// ============================================================================
// Configured paginator
// ============================================================================

/// Paginator built from a stream's pagination config
#[derive(Debug, Clone)]
pub enum AnyPaginator {
    /// Single request
    Single(SinglePagePaginator),

    /// `?offset=N&limit=M`
    Offset {
        paginator: OffsetPaginator<StopCondition>,
        offset_param: String,
        limit_param: String,
    },

    /// `?page=N`, optionally with a page size parameter
    PageNumber {
        paginator: PageNumberPaginator<StopCondition>,
        page_param: String,
        page_size: Option<(String, u64)>,
    },

    /// Token read from the body, sent back as a query parameter
    JsonPath {
        paginator: JsonPathPaginator,
        token_param: String,
    },

    /// URL from the `Link` header
    LinkHeader(HeaderLinkPaginator),

    /// URL from a body field
    NextUrl(HateoasPaginator<BodyLink>),
}

macro_rules! with_paginator {
    ($any:expr, $p:ident => $body:expr) => {
        match $any {
            AnyPaginator::Single($p) => $body,
            AnyPaginator::Offset { paginator: $p, .. } => $body,
            AnyPaginator::PageNumber { paginator: $p, .. } => $body,
            AnyPaginator::JsonPath { paginator: $p, .. } => $body,
            AnyPaginator::LinkHeader($p) => $body,
            AnyPaginator::NextUrl($p) => $body,
        }
    };
}

impl AnyPaginator {
    /// Build a fresh paginator for one traversal
    pub fn from_config(config: &PaginationConfigDef, records: RecordPath) -> Result<Self> {
        let paginator = match config {
            PaginationConfigDef::None => {
                Self::Single(Paginator::new((), SinglePage).with_records_path(records))
            }

            PaginationConfigDef::Offset {
                offset_param,
                limit_param,
                page_size,
                start,
                stop,
            } => {
                if *page_size == 0 {
                    return Err(Error::config("Offset pagination requires page_size > 0"));
                }
                let check = stop_condition(stop, &records, Counter::Offset(*page_size))?;
                Self::Offset {
                    paginator: Paginator::new(*start, OffsetStrategy::new(*page_size, check))
                        .with_records_path(records),
                    offset_param: offset_param.clone(),
                    limit_param: limit_param.clone(),
                }
            }

            PaginationConfigDef::PageNumber {
                page_param,
                start_page,
                page_size_param,
                page_size,
                stop,
            } => {
                let check = stop_condition(stop, &records, Counter::Page(*page_size))?;
                Self::PageNumber {
                    paginator: Paginator::new(*start_page, PageNumberStrategy::new(check))
                        .with_records_path(records),
                    page_param: page_param.clone(),
                    page_size: page_size_param.clone().zip(*page_size),
                }
            }

            PaginationConfigDef::JsonPath { path, token_param } => Self::JsonPath {
                paginator: Paginator::new(None, JsonPathStrategy::new(path)?)
                    .with_records_path(records),
                token_param: token_param.clone(),
            },

            PaginationConfigDef::LinkHeader { rel } => Self::LinkHeader(
                Paginator::new(None, HateoasStrategy::new(HeaderLink::new(rel.as_str())))
                    .with_records_path(records),
            ),

            PaginationConfigDef::NextUrl { path } => Self::NextUrl(
                Paginator::new(None, HateoasStrategy::new(BodyLink::new(path)?))
                    .with_records_path(records),
            ),
        };
        Ok(paginator)
    }

    /// Most recently yielded record
    pub fn last_seen_record(&self) -> Option<&JsonValue> {
        with_paginator!(self, p => p.last_seen_record())
    }
}

/// What the counter of a counter-based paginator measures
enum Counter {
    /// Record offset, advanced by the page size
    Offset(u64),
    /// Page number, with the page size if configured
    Page(Option<u64>),
}

fn stop_condition(
    config: &StopConditionConfig,
    records: &RecordPath,
    counter: Counter,
) -> Result<StopCondition> {
    match config {
        StopConditionConfig::EmptyPage => Ok(StopCondition::EmptyPage {
            records: records.clone(),
        }),
        StopConditionConfig::HasMore { path } => StopCondition::has_more_flag(path),
        StopConditionConfig::Field { path, value } => StopCondition::field(path, value.clone()),
        StopConditionConfig::TotalCount { path } => match counter {
            Counter::Offset(page_size) => StopCondition::total_count(path, page_size),
            Counter::Page(Some(page_size)) => StopCondition::total_records(path, page_size),
            Counter::Page(None) => Err(Error::config(
                "total_count stop condition requires page_size",
            )),
        },
        StopConditionConfig::TotalPages { path } => StopCondition::total_pages(path),
    }
}

fn follow_link(request: &mut PageRequest, next: Option<&Url>) {
    if let Some(url) = next {
        request.url = url.to_string();
        // The link carries its own query string
        request.query.clear();
    }
}

impl PageDriver for AnyPaginator {
    fn is_finished(&self) -> bool {
        with_paginator!(self, p => p.is_finished())
    }

    fn page_count(&self) -> u32 {
        with_paginator!(self, p => p.page_count())
    }

    fn next_request(&self, base: &PageRequest) -> PageRequest {
        let mut request = base.clone();
        match self {
            Self::Single(_) => {}
            Self::Offset {
                paginator,
                offset_param,
                limit_param,
            } => {
                request
                    .query
                    .insert(offset_param.clone(), paginator.current_value().to_string());
                request.query.insert(
                    limit_param.clone(),
                    paginator.strategy().page_size().to_string(),
                );
            }
            Self::PageNumber {
                paginator,
                page_param,
                page_size,
            } => {
                request
                    .query
                    .insert(page_param.clone(), paginator.current_value().to_string());
                if let Some((param, size)) = page_size {
                    request.query.insert(param.clone(), size.to_string());
                }
            }
            Self::JsonPath {
                paginator,
                token_param,
            } => {
                if let Some(token) = paginator.current_value() {
                    request.query.insert(token_param.clone(), token.clone());
                }
            }
            Self::LinkHeader(paginator) => {
                follow_link(&mut request, paginator.current_value().as_ref());
            }
            Self::NextUrl(paginator) => {
                follow_link(&mut request, paginator.current_value().as_ref());
            }
        }
        request
    }

    fn consume(&mut self, response: &ApiResponse) -> Result<Vec<JsonValue>> {
        with_paginator!(self, p => p.process_page(response))
    }
}

impl fmt::Display for AnyPaginator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        with_paginator!(self, p => fmt::Display::fmt(p, f))
    }
}
