//! Pagination module
//!
//! Supports: Offset, Page Number, JSONPath token, HATEOAS (Link header or
//! body link), and single-page endpoints.
//!
//! # Overview
//!
//! Every strategy runs inside the same [`Paginator`] state machine: a page is
//! fetched with the current token, its records are extracted, and
//! [`Paginator::advance`] asks the strategy whether more pages exist and what
//! the next token is. A next token equal to the current one is reported as
//! a pagination loop instead of being followed.
//!
//! [`AnyPaginator`] builds one of these from a YAML pagination config and
//! places its token into each outgoing request.

mod conditions;
mod driver;
mod strategies;
mod types;

pub use conditions::StopCondition;
pub use driver::{AnyPaginator, BoundPaginator, PageDriver};
pub use strategies::{
    BodyLink, HateoasPaginator, HateoasStrategy, HeaderLink, HeaderLinkPaginator,
    JsonPathPaginator, JsonPathStrategy, OffsetPaginator, OffsetStrategy, PageNumberPaginator,
    PageNumberStrategy, SinglePage, SinglePagePaginator,
};
pub use types::{
    MoreCheck, NextUrl, PageContext, PageRecords, PageStrategy, PageToken, PaginationState,
    Paginator,
};
