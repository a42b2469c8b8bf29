// tripgrid-mcp/tests/common/mod.rs
// ============================================================================
// Module: Integration Test Helpers
// Description: Shared state builders and HTTP drivers for pipeline tests.
// Purpose: Exercise the axum router end to end without external services.
// Dependencies: tripgrid-mcp, tower, axum
// ============================================================================

//! Shared helpers for MCP pipeline integration tests.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    dead_code,
    reason = "Test-only helpers; not every test uses every helper."
)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::http::StatusCode;
use serde_json::Value;
use tower::ServiceExt;
use tripgrid_config::IdpConfig;
use tripgrid_core::Booking;
use tripgrid_core::BookingId;
use tripgrid_core::BookingKind;
use tripgrid_core::BookingStatus;
use tripgrid_core::InMemoryTravelStore;
use tripgrid_core::PromptCatalog;
use tripgrid_core::StaticCredentialVendor;
use tripgrid_core::TenantId;
use tripgrid_core::UserId;
use tripgrid_mcp::JwtVerifier;
use tripgrid_mcp::NoopAuditSink;
use tripgrid_mcp::ServerState;
use tripgrid_mcp::ToolDeps;
use tripgrid_mcp::build_router;

/// Unsigned token from the discovery test suite: `{"alg":"none"}` header,
/// claims `sub=user1`, `custom:tenantId=ABC123`.
pub const UNSIGNED_TOKEN: &str = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.\
                                  eyJzdWIiOiJ1c2VyMSIsImN1c3RvbTp0ZW5hbnRJZCI6IkFCQzEyMyJ9.";

/// Builds a decode-only identity-provider configuration.
pub fn decode_only_idp() -> IdpConfig {
    IdpConfig {
        user_pool_id: None,
        client_id: None,
        region: "us-east-1".to_string(),
        jwks_timeout_ms: 30_000,
    }
}

/// Builds a router over an in-memory data plane with no verification.
pub fn test_router() -> Router {
    build_router(test_state(JwtVerifier::from_config(&decode_only_idp()).expect("verifier")))
}

/// Builds a router around an injected verifier.
pub fn test_router_with_verifier(verifier: JwtVerifier) -> Router {
    build_router(test_state(verifier))
}

/// Builds the shared server state over the in-memory store.
pub fn test_state(verifier: JwtVerifier) -> Arc<ServerState> {
    let store = Arc::new(InMemoryTravelStore::new());
    store.seed(sample_booking("ABC123", "user1", "bk-1"));
    Arc::new(ServerState {
        verifier,
        deps: ToolDeps {
            store: Some(store),
            vendor: Some(Arc::new(StaticCredentialVendor)),
            prompts: Arc::new(PromptCatalog::travel()),
        },
        policy_source: None,
        vendor: Some(Arc::new(StaticCredentialVendor)),
        audit: Arc::new(NoopAuditSink),
        max_body_bytes: 1024 * 1024,
    })
}

/// Builds a seeded booking record.
pub fn sample_booking(tenant: &str, user: &str, id: &str) -> Booking {
    Booking {
        booking_id: BookingId::new(id),
        tenant_id: TenantId::new(tenant),
        user_id: UserId::new(user),
        kind: BookingKind::Hotel,
        status: BookingStatus::Confirmed,
        city: "Lisbon".to_string(),
        check_in: "2025-05-01".to_string(),
        check_out: "2025-05-08".to_string(),
        amount_usd: 1260.0,
    }
}

/// Posts a JSON-RPC body to /mcp and returns status plus parsed body.
pub async fn post_mcp(
    router: &Router,
    body: &Value,
    auth_header: Option<&str>,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json");
    if let Some(header) = auth_header {
        request = request.header("authorization", header);
    }
    let request = request.body(Body::from(body.to_string())).expect("request");
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let value = read_json(response).await;
    (status, value)
}

/// Sends an arbitrary request through the router.
pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.expect("response")
}

/// Reads a response body as JSON; empty bodies become null.
pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// Extracts and parses the text payload of the first content part.
pub fn tool_text_payload(result: &Value) -> Value {
    let text = result["content"][0]["text"].as_str().expect("text content");
    serde_json::from_str(text).expect("json text payload")
}
