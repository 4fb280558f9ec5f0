//! Tests for the HTTP module

use super::*;
use crate::error::Error;
use crate::types::BackoffType;
use pretty_assertions::assert_eq;
use reqwest::header::{HeaderMap, HeaderValue, LINK};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> HttpClient {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_secs(1),
        )
        .no_rate_limit()
        .build();
    HttpClient::with_config(config).unwrap()
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.max_retries, 3);
    assert!(config.base_url.is_none());
    assert!(config.rate_limit.is_some());
    assert_eq!(config.retry_statuses, vec![429, 500, 502, 503, 504]);
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com")
        .timeout(Duration::from_secs(60))
        .max_retries(5)
        .retry_statuses(vec![503])
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.base_url, Some("https://api.example.com".to_string()));
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.retry_statuses, vec![503]);
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_page_request_builder() {
    let request = PageRequest::new("/api/items")
        .query("offset", "0")
        .query("offset", "50")
        .header("Authorization", "Token abc");

    assert_eq!(request.url, "/api/items");
    assert_eq!(request.query.get("offset"), Some(&"50".to_string()));
    assert_eq!(request.query.len(), 1);
    assert_eq!(
        request.headers.get("Authorization"),
        Some(&"Token abc".to_string())
    );
}

#[test]
fn test_calculate_backoff() {
    let client = |backoff_type| {
        let config = HttpClientConfig::builder()
            .backoff(
                backoff_type,
                Duration::from_millis(100),
                Duration::from_millis(500),
            )
            .no_rate_limit()
            .build();
        HttpClient::with_config(config).unwrap()
    };

    let constant = client(BackoffType::Constant);
    assert_eq!(constant.calculate_backoff(3), Duration::from_millis(100));

    let linear = client(BackoffType::Linear);
    assert_eq!(linear.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(linear.calculate_backoff(2), Duration::from_millis(300));

    let exponential = client(BackoffType::Exponential);
    assert_eq!(exponential.calculate_backoff(1), Duration::from_millis(200));
    assert_eq!(exponential.calculate_backoff(10), Duration::from_millis(500));
}

// ============================================================================
// Link Header Tests
// ============================================================================

#[test]
fn test_parse_link_header_multiple_links() {
    let links = parse_link_header(concat!(
        "<https://myapi.test/path?page=3&limit=100>;rel=next,",
        "<https://myapi.test/path?page=2&limit=100>;rel=back",
    ));

    assert_eq!(
        links,
        vec![
            Link {
                target: "https://myapi.test/path?page=3&limit=100".to_string(),
                rels: vec!["next".to_string()],
            },
            Link {
                target: "https://myapi.test/path?page=2&limit=100".to_string(),
                rels: vec!["back".to_string()],
            },
        ]
    );
}

#[test]
fn test_parse_link_header_quoted_and_multiple_rels() {
    let links = parse_link_header(
        r#"<https://api.example.com/items?page=5>; rel="Last Next"; title="end, really""#,
    );

    assert_eq!(links.len(), 1);
    assert!(links[0].has_rel("next"));
    assert!(links[0].has_rel("last"));
    assert!(!links[0].has_rel("prev"));
}

#[test]
fn test_parse_link_header_comma_in_target() {
    let links = parse_link_header("<https://api.example.com/items?ids=1,2,3>; rel=next");
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].target, "https://api.example.com/items?ids=1,2,3");
}

#[test]
fn test_parse_link_header_garbage() {
    assert!(parse_link_header("").is_empty());
    assert!(parse_link_header("not a link").is_empty());
}

#[test]
fn test_api_response_link_across_header_lines() {
    let mut headers = HeaderMap::new();
    headers.append(
        LINK,
        HeaderValue::from_static("<https://api.example.com/items?page=1>; rel=prev"),
    );
    headers.append(
        LINK,
        HeaderValue::from_static("<https://api.example.com/items?page=3>; rel=next"),
    );

    let response = ApiResponse::ok(json!({})).with_headers(headers);
    assert_eq!(response.header_values("link").count(), 2);
    assert_eq!(
        response.link("next"),
        Some("https://api.example.com/items?page=3".to_string())
    );
    assert_eq!(response.link("last"), None);
}

// ============================================================================
// Client Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_reads_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/items"))
        .and(query_param("offset", "50"))
        .and(header("Authorization", "Token abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", "</api/items?offset=100>; rel=next")
                .set_body_json(json!({"results": [{"id": 1}]})),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let request = PageRequest::new("/api/items")
        .query("offset", "50")
        .header("Authorization", "Token abc");
    let response = client.fetch(&request).await.unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.body()["results"][0]["id"], 1);
    assert_eq!(response.link("next"), Some("/api/items?offset=100".to_string()));
    assert!(response.url().unwrap().as_str().contains("offset=50"));
}

#[tokio::test]
async fn test_fetch_empty_body_is_null() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/empty"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let response = client.fetch(&PageRequest::new("/api/empty")).await.unwrap();
    assert!(response.body().is_null());
}

#[tokio::test]
async fn test_fetch_malformed_body_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client
        .fetch(&PageRequest::new("/api/html"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::JsonParse(_)));
}

#[tokio::test]
async fn test_fetch_404_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client
        .fetch(&PageRequest::new("/api/missing"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_fetch_retries_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let response = client.fetch(&PageRequest::new("/api/flaky")).await.unwrap();
    assert_eq!(response.body()["ok"], true);
}

#[tokio::test]
async fn test_fetch_retries_rate_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/limited"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "0")
                .set_body_string("Rate limited"),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/limited"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let response = client.fetch(&PageRequest::new("/api/limited")).await.unwrap();
    assert_eq!(response.body()["ok"], true);
}

#[tokio::test]
async fn test_fetch_gives_up_after_max_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/always-fail"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .max_retries(2)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(5),
            Duration::from_millis(5),
        )
        .no_rate_limit()
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let err = client
        .fetch(&PageRequest::new("/api/always-fail"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_fetch_only_retries_configured_statuses() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .max_retries(3)
        .retry_statuses(vec![503])
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(5),
            Duration::from_millis(5),
        )
        .no_rate_limit()
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let err = client
        .fetch(&PageRequest::new("/api/broken"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_fetch_absolute_url_ignores_base() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url("https://unused.invalid")
        .no_rate_limit()
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let url = format!("{}/elsewhere", mock_server.uri());
    let response = client.fetch(&PageRequest::new(url)).await.unwrap();
    assert_eq!(response.body(), &json!([]));
}

#[test]
fn test_http_client_debug() {
    let client = HttpClient::new().unwrap();
    assert!(client.has_rate_limiter());
    let debug = format!("{client:?}");
    assert!(debug.contains("HttpClient"));
}
