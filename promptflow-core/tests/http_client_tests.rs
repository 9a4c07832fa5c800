//! Tests for the shared HTTP client with mocking

use promptflow_core::http::client::HttpClient;
use promptflow_core::http::CallOptions;
use promptflow_core::protocol::ErrorKind;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{body_json, header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct Echo {
    ok: bool,
}

/// Test that the request id and user agent are sent
#[tokio::test]
async fn test_request_headers() {
    let mock_server = MockServer::start().await;
    let options = CallOptions::new();

    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(header("x-request-id", options.request_id.to_string().as_str()))
        .and(header_regex("user-agent", "^promptflow/"))
        .and(body_json(json!({ "ping": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().expect("Failed to create client");
    let url = format!("{}/echo", mock_server.uri());
    let result: Echo = client
        .post_json(&url, HeaderMap::new(), &json!({ "ping": 1 }), &options)
        .await
        .expect("request should succeed");

    assert_eq!(result, Echo { ok: true });
}

/// Test that each renewed option set gets a fresh request id
#[test]
fn test_renewed_options_get_new_request_id() {
    let options = CallOptions::new();
    let renewed = options.renewed();
    assert_ne!(options.request_id, renewed.request_id);
    assert_eq!(options.timeout, renewed.timeout);
}

/// Test that a plain-text error body becomes the failure message
#[tokio::test]
async fn test_plain_text_error_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad gateway"))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let result: Result<Echo, _> = client
        .post_json(&mock_server.uri(), HeaderMap::new(), &json!({}), &CallOptions::new())
        .await;

    let failure = result.unwrap_err();
    assert_eq!(failure.error_kind, ErrorKind::Provider);
    assert_eq!(failure.message, "Bad gateway");
    assert_eq!(failure.http_status, Some(502));
    assert_eq!(failure.provider_details, Some(json!("Bad gateway")));
}

/// Test that a body of the wrong shape is reported with the raw text
#[tokio::test]
async fn test_unexpected_shape_keeps_raw_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let result: Result<Echo, _> = client
        .post_json(&mock_server.uri(), HeaderMap::new(), &json!({}), &CallOptions::new())
        .await;

    let failure = result.unwrap_err();
    assert!(failure.message.starts_with("Invalid response format"));
    assert_eq!(
        failure.provider_details,
        Some(json!(r#"{"unexpected":true}"#))
    );
}
