//! HTTP module
//!
//! The transport collaborator of the pagination engine.
//!
//! # Features
//!
//! - **Materialized responses**: `ApiResponse` carries status, JSON body, headers
//! - **Link headers**: RFC 8288 parsing for HATEOAS pagination
//! - **Automatic Retries**: Configurable retry logic with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor

mod client;
mod rate_limit;
mod response;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, PageRequest};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use response::{parse_link_header, ApiResponse, Link};

#[cfg(test)]
mod tests;
