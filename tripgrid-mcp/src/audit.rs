// tripgrid-mcp/src/audit.rs
// ============================================================================
// Module: Request Audit Logging
// Description: Structured audit events for MCP request handling.
// Purpose: Emit one redacted JSON line per request without hard dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines the audit event payload and sinks for request logging.
//! Tokens never appear in events; only the verifier's classification reason
//! does. It is intentionally lightweight so deployments can route events to
//! their preferred logging pipeline without redesign.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Request outcome label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    /// Request completed without a JSON-RPC error.
    Ok,
    /// Request produced a JSON-RPC error.
    Error,
    /// Request was rejected before dispatch.
    Rejected,
}

/// Audit event payload for one request.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// JSON-RPC method, when one was parsed.
    pub method: Option<String>,
    /// Tool name for tools/call requests.
    pub tool: Option<String>,
    /// Caller subject; the anonymous sentinel without a valid token.
    pub user_id: String,
    /// Caller tenant; empty when unknown.
    pub tenant_id: String,
    /// Whether the caller presented a verified token.
    pub verified: bool,
    /// Verifier classification reason for unverified callers.
    pub auth_reason: Option<&'static str>,
    /// Request outcome.
    pub outcome: AuditOutcome,
    /// JSON-RPC or HTTP-mapped error code when present.
    pub error_code: Option<i64>,
    /// Request body size in bytes.
    pub request_bytes: usize,
}

/// Inputs for building an audit event.
#[derive(Debug, Clone)]
pub struct AuditEventParams {
    /// JSON-RPC method, when one was parsed.
    pub method: Option<String>,
    /// Tool name for tools/call requests.
    pub tool: Option<String>,
    /// Caller subject.
    pub user_id: String,
    /// Caller tenant.
    pub tenant_id: String,
    /// Whether the caller presented a verified token.
    pub verified: bool,
    /// Verifier classification reason for unverified callers.
    pub auth_reason: Option<&'static str>,
    /// Request outcome.
    pub outcome: AuditOutcome,
    /// JSON-RPC or HTTP-mapped error code when present.
    pub error_code: Option<i64>,
    /// Request body size in bytes.
    pub request_bytes: usize,
}

impl AuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: AuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "mcp_request",
            timestamp_ms,
            method: params.method,
            tool: params.tool,
            user_id: params.user_id,
            tenant_id: params.tenant_id,
            verified: params.verified,
            auth_reason: params.auth_reason,
            outcome: params.outcome,
            error_code: params.error_code,
            request_bytes: params.request_bytes,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for request events.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &AuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// No-op audit sink for tests.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &AuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
