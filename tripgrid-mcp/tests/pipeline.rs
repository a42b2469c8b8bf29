// tripgrid-mcp/tests/pipeline.rs
// ============================================================================
// Module: Pipeline Tests
// Description: End-to-end tests for the MCP request pipeline.
// Purpose: Validate the discovery, policy, and transport scenarios.
// Dependencies: tripgrid-mcp, tower, axum
// ============================================================================

//! End-to-end pipeline tests over the in-memory data plane.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions use unwrap for clarity."
)]

mod common;

use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use serde_json::json;

use common::UNSIGNED_TOKEN;
use common::post_mcp;
use common::read_json;
use common::send;
use common::test_router;
use common::tool_text_payload;

#[tokio::test]
async fn anonymous_discovery_lists_exactly_whoami() {
    let router = test_router();
    let body = json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"});
    let (status, value) = post_mcp(&router, &body, None).await;
    assert_eq!(status, StatusCode::OK);
    let tools = value["result"]["tools"].as_array().expect("tools");
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], json!("whoami"));
}

#[tokio::test]
async fn unsigned_whoami_reports_claims_and_trust_state() {
    let router = test_router();
    let body = json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/call",
        "params": {"name": "whoami", "arguments": {}}
    });
    let header = format!("Bearer {UNSIGNED_TOKEN}");
    let (status, value) = post_mcp(&router, &body, Some(&header)).await;
    assert_eq!(status, StatusCode::OK);
    let report = tool_text_payload(&value["result"]);
    assert_eq!(report["authenticated"], json!(false));
    assert_eq!(report["userInfo"]["tenantId"], json!("ABC123"));
    assert_eq!(report["tokenInfo"]["isUnsigned"], json!(true));
}

#[tokio::test]
async fn protected_tool_with_unsigned_token_reads_as_not_found() {
    let router = test_router();
    let body = json!({
        "jsonrpc": "2.0",
        "id": 3,
        "method": "tools/call",
        "params": {"name": "list_bookings", "arguments": {}}
    });
    let header = format!("Bearer {UNSIGNED_TOKEN}");
    let (status, value) = post_mcp(&router, &body, Some(&header)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["error"]["code"], json!(-32601));
}

#[tokio::test]
async fn protected_tool_without_any_token_reads_as_not_found() {
    let router = test_router();
    let body = json!({
        "jsonrpc": "2.0",
        "id": 3,
        "method": "tools/call",
        "params": {"name": "list_bookings", "arguments": {}}
    });
    let (status, value) = post_mcp(&router, &body, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["error"]["code"], json!(-32601));
}

#[tokio::test]
async fn unsigned_token_cannot_list_resources() {
    let router = test_router();
    let body = json!({"jsonrpc": "2.0", "id": 4, "method": "resources/list"});
    let header = format!("Bearer {UNSIGNED_TOKEN}");
    let (status, value) = post_mcp(&router, &body, Some(&header)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(value["error"]["message"], json!("unsigned-token-not-accepted"));
    assert_eq!(value["error"]["data"]["reason"], json!("unsigned"));
}

#[tokio::test]
async fn empty_bearer_token_is_reported_as_empty_token() {
    let router = test_router();
    let body = json!({"jsonrpc": "2.0", "id": 5, "method": "prompts/list"});
    let (status, value) = post_mcp(&router, &body, Some("Bearer ")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(value["error"]["message"], json!("empty-token"));
}

#[tokio::test]
async fn non_bearer_scheme_is_reported_as_bad_format() {
    let router = test_router();
    let body = json!({"jsonrpc": "2.0", "id": 6, "method": "resources/list"});
    let (status, value) = post_mcp(&router, &body, Some("Basic dXNlcjpwdw==")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(value["error"]["message"], json!("bad-auth-format"));
}

#[tokio::test]
async fn get_on_mcp_endpoint_is_method_not_allowed() {
    let router = test_router();
    let request = Request::builder().method("GET").uri("/mcp").body(Body::empty()).unwrap();
    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let allow = response.headers().get("allow").expect("allow header");
    assert_eq!(allow, "POST");
    let value = read_json(response).await;
    assert_eq!(value["jsonrpc"], json!("2.0"));
    assert!(value["error"]["code"].is_i64());
}

#[tokio::test]
async fn delete_on_mcp_endpoint_is_method_not_allowed() {
    let router = test_router();
    let request = Request::builder().method("DELETE").uri("/mcp").body(Body::empty()).unwrap();
    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get("allow").expect("allow header"), "POST");
}

#[tokio::test]
async fn oversize_body_is_rejected_before_parsing() {
    let router = test_router();
    let padding = "x".repeat(2 * 1024 * 1024);
    let body = format!("{{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\",\"params\":{{\"pad\":\"{padding}\"}}}}");
    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn health_endpoint_bypasses_auth() {
    let router = test_router();
    let request = Request::builder().method("GET").uri("/health").body(Body::empty()).unwrap();
    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let value = read_json(response).await;
    assert_eq!(value["status"], json!("ok"));
    assert_eq!(value["name"], json!("tripgrid"));
}

#[tokio::test]
async fn malformed_envelope_is_a_json_rpc_error_over_200() {
    let router = test_router();
    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let value = read_json(response).await;
    assert_eq!(value["error"]["code"], json!(-32600));
}

#[tokio::test]
async fn notification_only_envelope_has_no_response_body() {
    let router = test_router();
    let body = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn sse_accept_header_switches_content_type() {
    let router = test_router();
    let body = json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"});
    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .header("accept", "text/event-stream")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .expect("content type");
    assert!(content_type.starts_with("text/event-stream"));
}

#[tokio::test]
async fn batch_responses_preserve_request_id_correlation() {
    let router = test_router();
    let body = json!([
        {"jsonrpc": "2.0", "id": "a", "method": "tools/list"},
        {"jsonrpc": "2.0", "id": "b", "method": "initialize"},
        {"jsonrpc": "2.0", "method": "notifications/initialized"}
    ]);
    let (status, value) = post_mcp(&router, &body, None).await;
    assert_eq!(status, StatusCode::OK);
    let responses = value.as_array().expect("batch array");
    // The notification contributes no response.
    assert_eq!(responses.len(), 2);
    let ids: Vec<&str> =
        responses.iter().map(|response| response["id"].as_str().expect("id")).collect();
    assert!(ids.contains(&"a"));
    assert!(ids.contains(&"b"));
}

#[tokio::test]
async fn initialize_is_public_and_reports_capabilities() {
    let router = test_router();
    let body = json!({"jsonrpc": "2.0", "id": 9, "method": "initialize"});
    let (status, value) = post_mcp(&router, &body, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["result"]["serverInfo"]["name"], json!("tripgrid"));
    assert!(value["result"]["capabilities"]["prompts"].is_object());
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let router = test_router();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/mcp")
        .header("origin", "https://chat.example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "authorization,content-type")
        .body(Body::empty())
        .unwrap();
    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let allow_origin = response
        .headers()
        .get("access-control-allow-origin")
        .and_then(|value| value.to_str().ok())
        .expect("allow origin");
    assert_eq!(allow_origin, "*");
}
