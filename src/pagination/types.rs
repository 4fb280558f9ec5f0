//! Pagination types and traits
//!
//! Defines the core pagination abstractions shared by all strategies: the
//! [`PageStrategy`] capability set, the [`PaginationState`] it drives, and
//! the generic [`Paginator`] state machine.

use crate::error::{Error, Result};
use crate::extract::{RecordPath, Records};
use crate::http::ApiResponse;
use crate::types::JsonValue;
use std::fmt;
use tracing::debug;
use url::Url;

// ============================================================================
// Tokens
// ============================================================================

/// A value identifying where to resume pagination
pub trait PageToken: Clone + PartialEq + fmt::Debug {
    /// Human-readable rendering for logs and loop errors
    fn describe(&self) -> String;
}

impl PageToken for u64 {
    fn describe(&self) -> String {
        self.to_string()
    }
}

impl PageToken for () {
    fn describe(&self) -> String {
        "()".to_string()
    }
}

impl PageToken for Option<String> {
    fn describe(&self) -> String {
        match self {
            Some(token) => token.clone(),
            None => "null".to_string(),
        }
    }
}

impl PageToken for Option<Url> {
    fn describe(&self) -> String {
        match self {
            Some(url) => url.to_string(),
            None => "null".to_string(),
        }
    }
}

// ============================================================================
// State
// ============================================================================

/// Tracks pagination state during iteration
///
/// Only the owning [`Paginator`] mutates it.
#[derive(Debug, Clone)]
pub struct PaginationState<T> {
    current: T,
    page_count: u32,
    finished: bool,
    last_seen_record: Option<JsonValue>,
}

impl<T: PageToken> PaginationState<T> {
    /// Create state positioned at the start token
    pub fn new(start_value: T) -> Self {
        Self {
            current: start_value,
            page_count: 0,
            finished: false,
            last_seen_record: None,
        }
    }

    /// Current token
    pub fn current(&self) -> &T {
        &self.current
    }

    /// Pages consumed so far
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Whether the last page has been reached
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Most recently yielded record
    pub fn last_seen_record(&self) -> Option<&JsonValue> {
        self.last_seen_record.as_ref()
    }

    fn context(&self) -> PageContext<'_, T> {
        PageContext {
            current: &self.current,
            page_count: self.page_count,
            last_seen_record: self.last_seen_record.as_ref(),
        }
    }
}

/// Read-only view of the state handed to strategy decisions
#[derive(Debug)]
pub struct PageContext<'a, T> {
    /// Token the response was fetched with
    pub current: &'a T,
    /// Pages consumed, counting the response being decided on
    pub page_count: u32,
    /// Last record yielded from the current page
    pub last_seen_record: Option<&'a JsonValue>,
}

// ============================================================================
// Strategy traits
// ============================================================================

/// Core trait for pagination strategies
///
/// A strategy supplies the two decisions of the advance cycle. The state
/// machine around them lives in [`Paginator`].
pub trait PageStrategy {
    /// Token type this strategy produces
    type Token: PageToken;

    /// Name used when displaying a paginator
    const NAME: &'static str = "Paginator";

    /// Whether the endpoint has pages left after `response`
    ///
    /// Defaults to `true`, in which case exhaustion must be signaled by
    /// [`get_next`](Self::get_next) returning `None`.
    fn has_more(&self, _response: &ApiResponse, _page: &PageContext<'_, Self::Token>) -> bool {
        true
    }

    /// Next token computed from `response`; `None` ends pagination
    fn get_next(
        &self,
        response: &ApiResponse,
        page: &PageContext<'_, Self::Token>,
    ) -> Result<Option<Self::Token>>;
}

/// Decides whether more pages exist for counter-based strategies
///
/// Offset and page-number pagination cannot tell the end of the data from
/// their own token, so they require one of these.
pub trait MoreCheck {
    /// Whether another page should be requested
    fn has_more(&self, response: &ApiResponse, page: &PageContext<'_, u64>) -> bool;
}

impl<F> MoreCheck for F
where
    F: Fn(&ApiResponse) -> bool,
{
    fn has_more(&self, response: &ApiResponse, _page: &PageContext<'_, u64>) -> bool {
        self(response)
    }
}

/// Locates the followable next-page URL for HATEOAS pagination
pub trait NextUrl {
    /// URL (absolute or relative) of the next page, if the response has one
    fn next_url(&self, response: &ApiResponse) -> Option<String>;
}

impl<F> NextUrl for F
where
    F: Fn(&ApiResponse) -> Option<String>,
{
    fn next_url(&self, response: &ApiResponse) -> Option<String> {
        self(response)
    }
}

// ============================================================================
// Paginator
// ============================================================================

/// Stateful traversal of an API's pages
///
/// Constructed fresh for every request sequence and discarded once finished.
#[derive(Debug, Clone)]
pub struct Paginator<S: PageStrategy> {
    strategy: S,
    state: PaginationState<S::Token>,
    records_path: RecordPath,
}

impl<S: PageStrategy> Paginator<S> {
    /// Create a paginator positioned at `start_value`
    pub fn new(start_value: S::Token, strategy: S) -> Self {
        Self {
            strategy,
            state: PaginationState::new(start_value),
            records_path: RecordPath::default(),
        }
    }

    /// Set the path used to extract records from each page
    #[must_use]
    pub fn with_records_path(mut self, records_path: RecordPath) -> Self {
        self.records_path = records_path;
        self
    }

    /// Current pagination token
    pub fn current_value(&self) -> &S::Token {
        self.state.current()
    }

    /// Whether the last page has been reached
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Number of pages traversed so far
    pub fn page_count(&self) -> u32 {
        self.state.page_count()
    }

    /// Most recently yielded record
    pub fn last_seen_record(&self) -> Option<&JsonValue> {
        self.state.last_seen_record()
    }

    /// Full pagination state
    pub fn state(&self) -> &PaginationState<S::Token> {
        &self.state
    }

    /// The underlying strategy
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Path used to extract records
    pub fn records_path(&self) -> &RecordPath {
        &self.records_path
    }

    /// Consume `response` and move to the next page
    ///
    /// Counts the page, then asks the strategy whether more pages exist, and
    /// only then computes the next token. A computed token equal to the
    /// current one is a [`Error::PaginationLoop`]; the state is left as it
    /// was before the call apart from the page count.
    ///
    /// Calling this on a finished paginator does nothing.
    pub fn advance(&mut self, response: &ApiResponse) -> Result<()> {
        if self.state.finished {
            debug!("{self}: advance ignored, pagination already finished");
            return Ok(());
        }

        self.state.page_count += 1;
        let page = self.state.context();

        if !self.strategy.has_more(response, &page) {
            debug!(page = self.state.page_count, "{}: no more pages", S::NAME);
            self.state.finished = true;
            return Ok(());
        }

        match self.strategy.get_next(response, &page)? {
            Some(next) if next == self.state.current => {
                Err(Error::pagination_loop(next.describe()))
            }
            Some(next) => {
                debug!(
                    page = self.state.page_count,
                    "{}: {} -> {}",
                    S::NAME,
                    self.state.current.describe(),
                    next.describe()
                );
                self.state.current = next;
                Ok(())
            }
            None => {
                debug!(page = self.state.page_count, "{}: no next token", S::NAME);
                self.state.finished = true;
                Ok(())
            }
        }
    }

    /// Iterate the records of `response`, tracking the last one seen
    ///
    /// Does not advance; call [`advance`](Self::advance) once the page has
    /// been consumed, or use [`process_page`](Self::process_page).
    pub fn iter_records(&mut self, response: &ApiResponse) -> PageRecords<'_> {
        PageRecords {
            records: self.records_path.records(response.body()),
            last_seen: &mut self.state.last_seen_record,
        }
    }

    /// Collect the records of `response`, then advance
    pub fn process_page(&mut self, response: &ApiResponse) -> Result<Vec<JsonValue>> {
        let records: Vec<JsonValue> = self.iter_records(response).collect();
        self.advance(response)?;
        Ok(records)
    }
}

impl<S: PageStrategy> fmt::Display for Paginator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<{}>", S::NAME, self.state.current.describe())
    }
}

/// Records of one page, recording each yield as the last seen record
pub struct PageRecords<'a> {
    records: Records,
    last_seen: &'a mut Option<JsonValue>,
}

impl Iterator for PageRecords<'_> {
    type Item = JsonValue;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        *self.last_seen = Some(record.clone());
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}
