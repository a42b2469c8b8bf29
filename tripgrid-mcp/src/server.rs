// tripgrid-mcp/src/server.rs
// ============================================================================
// Module: MCP Server
// Description: HTTP front door and per-request pipeline for the MCP endpoint.
// Purpose: Classify, gate, dispatch, and stream one JSON-RPC envelope per POST.
// Dependencies: axum, tower-http, tripgrid-config, tokio
// ============================================================================

//! ## Overview
//! The server owns the process-lived state (verifier, JWKS cache, prompt
//! catalog, data-plane bindings, audit sink) and builds everything else per
//! request: token classification, registries, dispatcher, transport. The
//! pipeline order is CORS, body size gate, token classification, public-method
//! policy, dispatch, framing. `/mcp` accepts POST only; GET and DELETE answer
//! 405 with `Allow: POST` because there are no sessions to resume.
//!
//! Public-method membership is computed by `(method, tool-name)` pair: the
//! set is `initialize`, `notifications/initialized`, `tools/list`, and
//! `tools/call` of a public tool. Callers without credentials (or with the
//! unsigned development affordance) fall back to the anonymous context for
//! those; a presented-but-failed token fails fast with 401 on anything else.
//!
//! Known failure classes stay on the JSON-RPC channel over HTTP 200. The
//! only 500 is the catch-all panic boundary at the router layer, which logs
//! the panic with a backtrace and answers with the generic
//! `internal-server-error` envelope.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::backtrace::Backtrace;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::header::ALLOW;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tripgrid_config::TripgridConfig;
use tripgrid_core::CredentialVendor;
use tripgrid_core::PromptCatalog;
use tripgrid_core::TravelStore;
use tripgrid_store_dynamo::DynamoStoreConfig;
use tripgrid_store_dynamo::DynamoTravelStore;

use crate::audit::AuditEvent;
use crate::audit::AuditEventParams;
use crate::audit::AuditOutcome;
use crate::audit::AuditSink;
use crate::audit::StderrAuditSink;
use crate::auth::AuthInfo;
use crate::auth::AuthReason;
use crate::auth::JwtVerifier;
use crate::auth::TokenClassification;
use crate::credentials::StsCredentialVendor;
use crate::dispatcher::CODE_INTERNAL;
use crate::dispatcher::CODE_INVALID_REQUEST;
use crate::dispatcher::McpDispatcher;
use crate::metadata::ServerMetadata;
use crate::resources::PolicySource;
use crate::resources::S3PolicySource;
use crate::resources::build_resource_registry;
use crate::tools::ToolDeps;
use crate::tools::build_tool_registry;
use crate::tools::is_public_tool;
use crate::transport::Envelope;
use crate::transport::JsonRpcRequest;
use crate::transport::JsonRpcResponse;
use crate::transport::emit;
use crate::transport::parse_envelope;
use crate::transport::response_mode;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// MCP server errors.
#[derive(Debug, thiserror::Error)]
pub enum McpServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Server State
// ============================================================================

/// Process-lived server state shared across requests.
pub struct ServerState {
    /// JWT verifier with its JWKS cache.
    pub verifier: JwtVerifier,
    /// Tool handler dependencies.
    pub deps: ToolDeps,
    /// Tenant policy document source.
    pub policy_source: Option<Arc<dyn PolicySource>>,
    /// Tenant credential vendor.
    pub vendor: Option<Arc<dyn CredentialVendor>>,
    /// Audit sink for request records.
    pub audit: Arc<dyn AuditSink>,
    /// Maximum accepted request body size.
    pub max_body_bytes: usize,
}

/// MCP server instance.
pub struct McpServer {
    /// Listen port.
    port: u16,
    /// Shared request state.
    state: Arc<ServerState>,
}

impl McpServer {
    /// Builds a server from configuration, binding the AWS data plane.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when initialization fails.
    pub fn from_config(config: &TripgridConfig) -> Result<Self, McpServerError> {
        config.validate().map_err(|err| McpServerError::Config(err.to_string()))?;
        let verifier = JwtVerifier::from_config(&config.idp)
            .map_err(|err| McpServerError::Init(err.to_string()))?;
        if !config.idp.verification_enabled() {
            tracing::warn!(
                "no user pool configured; running in decode-only mode, all tokens unverified"
            );
        }
        let vendor: Option<Arc<dyn CredentialVendor>> = config
            .data_plane
            .role_arn
            .as_ref()
            .map(|role_arn| {
                Arc::new(StsCredentialVendor::new(role_arn.clone(), config.idp.region.clone()))
                    as Arc<dyn CredentialVendor>
            });
        let store: Option<Arc<dyn TravelStore>> = config
            .data_plane
            .table_name
            .as_ref()
            .map(|table_name| {
                Arc::new(DynamoTravelStore::new(DynamoStoreConfig {
                    table_name: table_name.clone(),
                    region: config.idp.region.clone(),
                    endpoint_url: None,
                })) as Arc<dyn TravelStore>
            });
        if !config.data_plane.bookings_enabled() {
            tracing::warn!("booking data plane unbound; domain tools are disabled");
        }
        let policy_source: Option<Arc<dyn PolicySource>> = config
            .data_plane
            .bucket_name
            .as_ref()
            .map(|bucket| {
                Arc::new(S3PolicySource::new(bucket.clone(), config.idp.region.clone()))
                    as Arc<dyn PolicySource>
            });
        let state = ServerState {
            verifier,
            deps: ToolDeps {
                store: if vendor.is_some() { store } else { None },
                vendor: vendor.clone(),
                prompts: Arc::new(PromptCatalog::travel()),
            },
            policy_source,
            vendor,
            audit: Arc::new(StderrAuditSink),
            max_body_bytes: config.server.max_body_bytes,
        };
        Ok(Self {
            port: config.server.port,
            state: Arc::new(state),
        })
    }

    /// Builds a server around injected state, for embedding and tests.
    #[must_use]
    pub fn with_state(port: u16, state: Arc<ServerState>) -> Self {
        Self {
            port,
            state,
        }
    }

    /// Returns the axum router for this server.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.state))
    }

    /// Serves requests until the process exits.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), McpServerError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|err| McpServerError::Transport(format!("bind failed: {err}")))?;
        tracing::info!(%addr, "tripgrid mcp server listening");
        axum::serve(listener, router)
            .await
            .map_err(|err| McpServerError::Transport(format!("server failed: {err}")))
    }
}

/// Builds the axum router with CORS, the body-size gate, and the catch-all
/// panic boundary.
#[must_use]
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::PUT,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);
    let max_body_bytes = state.max_body_bytes;
    Router::new()
        .route("/health", get(handle_health))
        .route("/mcp", post(handle_mcp).get(handle_wrong_verb).delete(handle_wrong_verb))
        .layer(DefaultBodyLimit::max(max_body_bytes.saturating_add(1)))
        .layer(cors)
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// Converts an escaped panic into the generic internal-server-error envelope.
///
/// Known failure classes never reach this boundary; anything that does is a
/// bug, so the panic is logged with a backtrace before the 500 goes out.
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| err.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    let backtrace = Backtrace::force_capture();
    tracing::error!(panic = %detail, backtrace = %backtrace, "request handler panicked");
    let body = JsonRpcResponse::error(
        Value::Null,
        CODE_INTERNAL,
        "internal-server-error",
        None,
    );
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
}

// ============================================================================
// SECTION: Route Handlers
// ============================================================================

/// Serves process metadata without authentication.
async fn handle_health() -> impl IntoResponse {
    axum::Json(ServerMetadata::current().health_payload())
}

/// Rejects GET/DELETE on the MCP endpoint: there are no sessions.
async fn handle_wrong_verb() -> impl IntoResponse {
    let body = JsonRpcResponse::error(
        Value::Null,
        CODE_INVALID_REQUEST,
        "method not allowed: the mcp endpoint is POST-only",
        None,
    );
    (StatusCode::METHOD_NOT_ALLOWED, [(ALLOW, "POST")], axum::Json(body))
}

/// Handles one MCP POST: the whole per-request pipeline.
async fn handle_mcp(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Response {
    let mode = response_mode(&headers);
    if bytes.len() > state.max_body_bytes {
        let body = JsonRpcResponse::error(
            Value::Null,
            CODE_INVALID_REQUEST,
            "request body too large",
            None,
        );
        record_rejection(&state, None, bytes.len(), Some(-32600));
        return (StatusCode::PAYLOAD_TOO_LARGE, axum::Json(body)).into_response();
    }

    let auth_header = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
    let classification = state.verifier.classify(auth_header).await;

    let envelope = match parse_envelope(&bytes) {
        Ok(envelope) => envelope,
        Err(_) => {
            let body = JsonRpcResponse::error(
                Value::Null,
                CODE_INVALID_REQUEST,
                "invalid json-rpc envelope",
                None,
            );
            record_rejection(&state, Some(&classification), bytes.len(), Some(-32600));
            return emit(mode, false, vec![body]);
        }
    };

    // A lone protected request fails fast with 401; batches keep auth
    // failures in-body because one HTTP status cannot serve mixed outcomes.
    if !envelope.is_batch {
        if let Some(Ok(request)) = envelope.requests.first() {
            if let Some(reason) = rejection_reason(&classification, request) {
                let id = request.id.clone().unwrap_or(Value::Null);
                let body = JsonRpcResponse::error(
                    id,
                    reason.error_code(),
                    reason.wire_message(),
                    Some(serde_json::json!({ "reason": reason.as_str() })),
                );
                record_rejection(&state, Some(&classification), bytes.len(), Some(reason.error_code()));
                return (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response();
            }
        }
    }

    let is_batch = envelope.is_batch;
    let first_request = envelope.requests.first().and_then(|entry| entry.as_ref().ok());
    let method = first_request.map(|request| request.method.clone());
    let tool = first_request.and_then(|request| request.tool_name().map(str::to_string));
    let responses = dispatch_envelope(&state, &classification, envelope).await;
    record_outcome(&state, &classification, bytes.len(), method, tool, &responses);
    emit(mode, is_batch, responses).into_response()
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Reasons the anonymous fallback tolerates: no credential was presented, or
/// the unsigned development affordance applies.
const fn tolerates_anonymous(reason: AuthReason) -> bool {
    matches!(
        reason,
        AuthReason::Missing | AuthReason::Unsigned | AuthReason::VerificationDisabled
    )
}

/// Public-method membership, computed by `(method, tool-name)` pair.
#[must_use]
pub fn is_public_method(method: &str, tool: Option<&str>) -> bool {
    match method {
        "initialize" | "notifications/initialized" | "tools/list" => true,
        "tools/call" => tool.is_some_and(is_public_tool),
        _ => false,
    }
}

/// Decides whether a request must be rejected with 401 before dispatch.
///
/// Protected `tools/call` from a tolerated-anonymous caller is dispatched so
/// the answer is the same tool-not-found an unknown name produces.
fn rejection_reason(
    classification: &TokenClassification,
    request: &JsonRpcRequest,
) -> Option<AuthReason> {
    if classification.context.verified {
        return None;
    }
    if is_public_method(&request.method, request.tool_name()) {
        return None;
    }
    let reason = classification.reason.unwrap_or(AuthReason::Unknown);
    if tolerates_anonymous(reason) && request.method == "tools/call" {
        return None;
    }
    Some(reason)
}

/// Builds the per-request dispatcher and routes every envelope entry.
async fn dispatch_envelope(
    state: &ServerState,
    classification: &TokenClassification,
    envelope: Envelope,
) -> Vec<JsonRpcResponse> {
    let context = classification.context.clone();
    let info = AuthInfo {
        token: context.token.clone(),
        reason: classification.reason,
    };
    let tools = match build_tool_registry(&context, &state.deps) {
        Ok(tools) => tools,
        Err(err) => {
            return vec![JsonRpcResponse::error(
                Value::Null,
                CODE_INTERNAL,
                err.to_string(),
                None,
            )];
        }
    };
    let resources = match build_resource_registry(
        &context,
        state.policy_source.as_ref(),
        state.vendor.as_ref(),
    ) {
        Ok(resources) => resources,
        Err(err) => {
            return vec![JsonRpcResponse::error(
                Value::Null,
                CODE_INTERNAL,
                err.to_string(),
                None,
            )];
        }
    };
    let dispatcher = McpDispatcher::new(
        context,
        info,
        tools,
        resources,
        Arc::clone(&state.deps.prompts),
    );

    let is_batch = envelope.is_batch;
    let mut responses = Vec::with_capacity(envelope.requests.len());
    for entry in envelope.requests {
        match entry {
            Ok(request) => {
                if is_batch {
                    if let Some(reason) = rejection_reason(classification, &request) {
                        let id = request.id.clone().unwrap_or(Value::Null);
                        responses.push(JsonRpcResponse::error(
                            id,
                            reason.error_code(),
                            reason.wire_message(),
                            Some(serde_json::json!({ "reason": reason.as_str() })),
                        ));
                        continue;
                    }
                }
                if let Some(response) = dispatcher.dispatch(request).await {
                    responses.push(response);
                }
            }
            Err(()) => {
                responses.push(JsonRpcResponse::error(
                    Value::Null,
                    CODE_INVALID_REQUEST,
                    "invalid json-rpc request",
                    None,
                ));
            }
        }
    }
    responses
}

// ============================================================================
// SECTION: Audit Helpers
// ============================================================================

/// Records an audit event for a pre-dispatch rejection.
fn record_rejection(
    state: &ServerState,
    classification: Option<&TokenClassification>,
    request_bytes: usize,
    error_code: Option<i64>,
) {
    let (user_id, tenant_id, verified, auth_reason) = match classification {
        Some(classification) => (
            classification.context.user_id.to_string(),
            classification.context.tenant_id.to_string(),
            classification.context.verified,
            classification.reason.map(AuthReason::as_str),
        ),
        None => ("anonymous".to_string(), String::new(), false, None),
    };
    state.audit.record(&AuditEvent::new(AuditEventParams {
        method: None,
        tool: None,
        user_id,
        tenant_id,
        verified,
        auth_reason,
        outcome: AuditOutcome::Rejected,
        error_code,
        request_bytes,
    }));
}

/// Records an audit event for a dispatched envelope.
fn record_outcome(
    state: &ServerState,
    classification: &TokenClassification,
    request_bytes: usize,
    method: Option<String>,
    tool: Option<String>,
    responses: &[JsonRpcResponse],
) {
    let first_error = responses.iter().find_map(|response| response.error.as_ref());
    let outcome =
        if first_error.is_some() { AuditOutcome::Error } else { AuditOutcome::Ok };
    state.audit.record(&AuditEvent::new(AuditEventParams {
        method,
        tool,
        user_id: classification.context.user_id.to_string(),
        tenant_id: classification.context.tenant_id.to_string(),
        verified: classification.context.verified,
        auth_reason: classification.reason.map(AuthReason::as_str),
        outcome,
        error_code: first_error.map(|error| error.code),
        request_bytes,
    }));
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions."
    )]

    use axum::Router;
    use axum::body::Body;
    use axum::http::Request;
    use axum::http::StatusCode;
    use axum::routing::get;
    use serde_json::json;
    use tower::ServiceExt;
    use tower_http::catch_panic::CatchPanicLayer;

    use super::handle_panic;
    use super::is_public_method;
    use super::rejection_reason;
    use crate::auth::AuthContext;
    use crate::auth::AuthReason;
    use crate::auth::TokenClassification;
    use crate::transport::JsonRpcRequest;

    fn request(method: &str, tool: Option<&str>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: method.to_string(),
            params: tool.map(|name| json!({"name": name, "arguments": {}})),
        }
    }

    fn unverified(reason: AuthReason) -> TokenClassification {
        TokenClassification {
            context: AuthContext::anonymous(),
            reason: Some(reason),
        }
    }

    fn verified() -> TokenClassification {
        let mut context = AuthContext::anonymous();
        context.verified = true;
        TokenClassification {
            context,
            reason: None,
        }
    }

    #[test]
    fn public_set_is_computed_by_method_and_tool_pair() {
        assert!(is_public_method("initialize", None));
        assert!(is_public_method("notifications/initialized", None));
        assert!(is_public_method("tools/list", None));
        assert!(is_public_method("tools/call", Some("whoami")));
        assert!(!is_public_method("tools/call", Some("list_bookings")));
        assert!(!is_public_method("tools/call", None));
        assert!(!is_public_method("resources/list", None));
        assert!(!is_public_method("prompts/get", None));
    }

    #[test]
    fn verified_callers_are_never_rejected() {
        let classification = verified();
        for method in ["tools/call", "resources/list", "prompts/get"] {
            assert!(rejection_reason(&classification, &request(method, Some("x"))).is_none());
        }
    }

    #[test]
    fn expired_token_fails_fast_on_protected_call() {
        let classification = unverified(AuthReason::Expired);
        let reason =
            rejection_reason(&classification, &request("tools/call", Some("list_bookings")));
        assert_eq!(reason, Some(AuthReason::Expired));
        assert_eq!(reason.unwrap().wire_message(), "token-expired");
    }

    #[test]
    fn expired_token_still_reaches_public_pairs() {
        let classification = unverified(AuthReason::Expired);
        assert!(rejection_reason(&classification, &request("tools/list", None)).is_none());
        assert!(
            rejection_reason(&classification, &request("tools/call", Some("whoami"))).is_none()
        );
    }

    #[test]
    fn missing_and_unsigned_protected_calls_dispatch_to_not_found() {
        for reason in [AuthReason::Missing, AuthReason::Unsigned] {
            let classification = unverified(reason);
            assert!(
                rejection_reason(&classification, &request("tools/call", Some("list_bookings")))
                    .is_none(),
                "tolerated reason {reason:?} must dispatch and hide the tool"
            );
        }
    }

    #[test]
    fn unsigned_token_is_rejected_on_non_call_protected_methods() {
        let classification = unverified(AuthReason::Unsigned);
        let reason = rejection_reason(&classification, &request("resources/list", None));
        assert_eq!(reason, Some(AuthReason::Unsigned));
        assert_eq!(reason.unwrap().wire_message(), "unsigned-token-not-accepted");
    }

    #[test]
    fn bad_format_fails_fast_even_on_tools_call() {
        let classification = unverified(AuthReason::BadFormat);
        let reason =
            rejection_reason(&classification, &request("tools/call", Some("list_bookings")));
        assert_eq!(reason, Some(AuthReason::BadFormat));
    }

    #[test]
    fn panic_boundary_answers_with_internal_server_error_envelope() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    async fn boom() -> &'static str {
        panic!("boom");
    }

    #[tokio::test]
    async fn escaped_panic_becomes_a_500_with_the_generic_envelope() {
        let router = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(handle_panic));
        let request = Request::builder().method("GET").uri("/boom").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes =
            axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(value["jsonrpc"], json!("2.0"));
        assert_eq!(value["error"]["code"], json!(-32603));
        assert_eq!(value["error"]["message"], json!("internal-server-error"));
    }
}
