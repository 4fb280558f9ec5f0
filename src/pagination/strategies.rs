//! Pagination strategy implementations
//!
//! Each strategy handles a specific pagination pattern by supplying the
//! `has_more` / `get_next` decisions to [`Paginator`].

use super::conditions::StopCondition;
use super::types::{MoreCheck, NextUrl, PageContext, PageStrategy, Paginator};
use crate::error::{Error, Result};
use crate::extract::RecordPath;
use crate::http::ApiResponse;
use crate::types::JsonValue;
use url::Url;

/// Offset paginator
pub type OffsetPaginator<C> = Paginator<OffsetStrategy<C>>;
/// Page-number paginator
pub type PageNumberPaginator<C> = Paginator<PageNumberStrategy<C>>;
/// Body-token paginator
pub type JsonPathPaginator = Paginator<JsonPathStrategy>;
/// HATEOAS paginator
pub type HateoasPaginator<L> = Paginator<HateoasStrategy<L>>;
/// HATEOAS paginator following the `Link` response header
pub type HeaderLinkPaginator = HateoasPaginator<HeaderLink>;
/// Paginator for endpoints that return a single page
pub type SinglePagePaginator = Paginator<SinglePage>;

// ============================================================================
// Offset Pagination
// ============================================================================

/// Offset-based pagination
///
/// Advances the offset by a constant page size regardless of the response.
/// Common patterns:
/// - `?offset=100&limit=50`
/// - `?skip=100&take=50`
#[derive(Debug, Clone)]
pub struct OffsetStrategy<C> {
    page_size: u64,
    check: C,
}

impl<C: MoreCheck> OffsetStrategy<C> {
    /// Create an offset strategy; `check` decides when the data ran out
    pub fn new(page_size: u64, check: C) -> Self {
        Self { page_size, check }
    }

    /// Offset increment per page
    pub fn page_size(&self) -> u64 {
        self.page_size
    }
}

impl OffsetStrategy<StopCondition> {
    /// Offset pagination that stops at the first page without records
    pub fn until_empty(page_size: u64, records: RecordPath) -> Self {
        Self::new(page_size, StopCondition::EmptyPage { records })
    }
}

impl<C: MoreCheck> PageStrategy for OffsetStrategy<C> {
    type Token = u64;
    const NAME: &'static str = "OffsetPaginator";

    fn has_more(&self, response: &ApiResponse, page: &PageContext<'_, u64>) -> bool {
        self.check.has_more(response, page)
    }

    fn get_next(
        &self,
        _response: &ApiResponse,
        page: &PageContext<'_, u64>,
    ) -> Result<Option<u64>> {
        Ok(page.current.checked_add(self.page_size))
    }
}

// ============================================================================
// Page Number Pagination
// ============================================================================

/// Page number pagination
///
/// Common patterns:
/// - `?page=2`
/// - `?page=2&per_page=50`
#[derive(Debug, Clone)]
pub struct PageNumberStrategy<C> {
    check: C,
}

impl<C: MoreCheck> PageNumberStrategy<C> {
    /// Create a page-number strategy; `check` decides when the data ran out
    pub fn new(check: C) -> Self {
        Self { check }
    }
}

impl<C: MoreCheck> PageStrategy for PageNumberStrategy<C> {
    type Token = u64;
    const NAME: &'static str = "PageNumberPaginator";

    fn has_more(&self, response: &ApiResponse, page: &PageContext<'_, u64>) -> bool {
        self.check.has_more(response, page)
    }

    fn get_next(
        &self,
        _response: &ApiResponse,
        page: &PageContext<'_, u64>,
    ) -> Result<Option<u64>> {
        Ok(page.current.checked_add(1))
    }
}

// ============================================================================
// JSONPath Token Pagination
// ============================================================================

/// Token embedded in the response body (e.g., `{"nextPageToken": "abc"}`)
///
/// The first match of the path is the next token. A missing or `null` token
/// ends pagination.
#[derive(Debug, Clone)]
pub struct JsonPathStrategy {
    path: RecordPath,
}

impl JsonPathStrategy {
    /// Create a strategy reading the token at `path`
    pub fn new(path: &str) -> Result<Self> {
        Ok(Self {
            path: RecordPath::parse(path)?,
        })
    }

    /// Path the token is read from
    pub fn path(&self) -> &RecordPath {
        &self.path
    }
}

impl PageStrategy for JsonPathStrategy {
    type Token = Option<String>;
    const NAME: &'static str = "JSONPathPaginator";

    fn get_next(
        &self,
        response: &ApiResponse,
        _page: &PageContext<'_, Option<String>>,
    ) -> Result<Option<Option<String>>> {
        Ok(self
            .path
            .first(response.body())
            .and_then(token_from_value)
            .map(Some))
    }
}

/// Render a matched JSON value as a page token
fn token_from_value(value: JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

// ============================================================================
// HATEOAS Pagination
// ============================================================================

/// Pagination following a link the API hands back
///
/// Relative links are resolved against the URL of the response they came
/// from.
#[derive(Debug, Clone)]
pub struct HateoasStrategy<L> {
    locator: L,
}

impl<L: NextUrl> HateoasStrategy<L> {
    /// Create a strategy following the links found by `locator`
    pub fn new(locator: L) -> Self {
        Self { locator }
    }
}

impl<L: NextUrl> PageStrategy for HateoasStrategy<L> {
    type Token = Option<Url>;
    const NAME: &'static str = "HATEOASPaginator";

    fn get_next(
        &self,
        response: &ApiResponse,
        _page: &PageContext<'_, Option<Url>>,
    ) -> Result<Option<Option<Url>>> {
        match self.locator.next_url(response) {
            Some(next) if !next.is_empty() => Ok(Some(Some(resolve_url(&next, response.url())?))),
            _ => Ok(None),
        }
    }
}

fn resolve_url(link: &str, base: Option<&Url>) -> Result<Url> {
    match (Url::parse(link), base) {
        (Ok(url), _) => Ok(url),
        (Err(url::ParseError::RelativeUrlWithoutBase), Some(base)) => Ok(base.join(link)?),
        (Err(e), _) => Err(Error::InvalidUrl(e)),
    }
}

/// Next link from the `Link` response header (RFC 8288)
///
/// Format: `Link: <https://api.github.com/...?page=2>; rel="next", ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLink {
    rel: String,
}

impl HeaderLink {
    /// Follow links with relation type `rel`
    pub fn new(rel: impl Into<String>) -> Self {
        Self { rel: rel.into() }
    }
}

impl Default for HeaderLink {
    fn default() -> Self {
        Self::new("next")
    }
}

impl NextUrl for HeaderLink {
    fn next_url(&self, response: &ApiResponse) -> Option<String> {
        response.link(&self.rel)
    }
}

/// Next link from a field in the response body
///
/// Common patterns:
/// - `{ "next": "https://api.example.com/items?page=2" }`
/// - `{ "pagination": { "next_url": "..." } }`
#[derive(Debug, Clone)]
pub struct BodyLink {
    path: RecordPath,
}

impl BodyLink {
    /// Read the next URL at `path`
    pub fn new(path: &str) -> Result<Self> {
        Ok(Self {
            path: RecordPath::parse(path)?,
        })
    }
}

impl NextUrl for BodyLink {
    fn next_url(&self, response: &ApiResponse) -> Option<String> {
        match self.path.first(response.body())? {
            JsonValue::String(url) => Some(url),
            _ => None,
        }
    }
}

// ============================================================================
// Single Page
// ============================================================================

/// No pagination - single request
#[derive(Debug, Clone, Copy, Default)]
pub struct SinglePage;

impl PageStrategy for SinglePage {
    type Token = ();
    const NAME: &'static str = "SinglePagePaginator";

    fn get_next(&self, _response: &ApiResponse, _page: &PageContext<'_, ()>) -> Result<Option<()>> {
        Ok(None)
    }
}
