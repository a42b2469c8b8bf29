// tripgrid-mcp/src/transport.rs
// ============================================================================
// Module: Streamable HTTP Transport
// Description: JSON-RPC envelope framing and JSON/SSE response emission.
// Purpose: Parse one inbound envelope and emit replies as JSON or SSE frames.
// Dependencies: axum, serde, serde_json, tokio-stream
// ============================================================================

//! ## Overview
//! The transport is strictly stateless: one POST carries one JSON-RPC
//! envelope (request, batch, or notification) and the reply is either a
//! single JSON body or an SSE stream with one `data:` frame per response.
//! There is no session identifier and no resumption. The per-request
//! transport ends with the HTTP response; a client disconnect drops the
//! response future, which cancels in-flight handlers at their next await.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::convert::Infallible;

use axum::http::HeaderMap;
use axum::http::header::ACCEPT;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::response::Sse;
use axum::response::sse::Event;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tokio_stream::wrappers::ReceiverStream;

// ============================================================================
// SECTION: Envelope Types
// ============================================================================

/// Incoming JSON-RPC request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC protocol version.
    pub jsonrpc: String,
    /// Request identifier; absent for notifications.
    #[serde(default)]
    pub id: Option<Value>,
    /// Method name.
    pub method: String,
    /// Optional parameters payload.
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Returns true when the request is a notification.
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Returns the tool name for `tools/call` requests.
    #[must_use]
    pub fn tool_name(&self) -> Option<&str> {
        if self.method != "tools/call" {
            return None;
        }
        self.params.as_ref()?.get("name")?.as_str()
    }
}

/// JSON-RPC response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC protocol version.
    pub jsonrpc: String,
    /// Request identifier.
    pub id: Value,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload when the request fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,
    /// Human-readable error message.
    pub message: String,
    /// Structured error metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Builds a success response.
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error response.
    #[must_use]
    pub fn error(id: Value, code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data,
            }),
        }
    }
}

// ============================================================================
// SECTION: Envelope Parsing
// ============================================================================

/// Parsed inbound envelope.
#[derive(Debug)]
pub struct Envelope {
    /// Parsed requests; a parse failure keeps its slot as `Err`.
    pub requests: Vec<Result<JsonRpcRequest, ()>>,
    /// Whether the envelope was a batch array.
    pub is_batch: bool,
}

/// Envelope-level parse failure: the body is not JSON or not an envelope.
#[derive(Debug)]
pub struct EnvelopeError;

/// Parses one JSON-RPC envelope from a request body.
///
/// # Errors
///
/// Returns [`EnvelopeError`] when the body is not a JSON object or array.
pub fn parse_envelope(bytes: &[u8]) -> Result<Envelope, EnvelopeError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|_| EnvelopeError)?;
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                return Err(EnvelopeError);
            }
            let requests = items
                .into_iter()
                .map(|item| serde_json::from_value::<JsonRpcRequest>(item).map_err(|_| ()))
                .collect();
            Ok(Envelope {
                requests,
                is_batch: true,
            })
        }
        Value::Object(_) => {
            let request = serde_json::from_value::<JsonRpcRequest>(value).map_err(|_| ());
            Ok(Envelope {
                requests: vec![request],
                is_batch: false,
            })
        }
        _ => Err(EnvelopeError),
    }
}

// ============================================================================
// SECTION: Response Emission
// ============================================================================

/// Reply framing selected from the request's `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Single `application/json` body.
    Json,
    /// `text/event-stream` with one frame per response.
    Sse,
}

/// Selects the response mode from request headers.
#[must_use]
pub fn response_mode(headers: &HeaderMap) -> ResponseMode {
    let accepts_sse = headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.contains("text/event-stream"));
    if accepts_sse { ResponseMode::Sse } else { ResponseMode::Json }
}

/// Emits responses in the selected framing.
///
/// A unary envelope yields an object body; a batch yields an array. Over SSE
/// each response is one unnamed `data:` frame, emitted in dispatcher order.
#[must_use]
pub fn emit(mode: ResponseMode, is_batch: bool, responses: Vec<JsonRpcResponse>) -> Response {
    match mode {
        ResponseMode::Json => {
            if is_batch {
                axum::Json(responses).into_response()
            } else {
                match responses.into_iter().next() {
                    Some(response) => axum::Json(response).into_response(),
                    // All requests were notifications: nothing to say.
                    None => axum::http::StatusCode::ACCEPTED.into_response(),
                }
            }
        }
        ResponseMode::Sse => {
            let (tx, rx) = tokio::sync::mpsc::channel::<Result<Event, Infallible>>(
                responses.len().max(1),
            );
            for response in responses {
                let payload = serde_json::to_string(&response).unwrap_or_else(|_| {
                    "{\"jsonrpc\":\"2.0\",\"id\":null,\"error\":{\"code\":-32603,\
                     \"message\":\"serialization failed\"}}"
                        .to_string()
                });
                let _ = tx.try_send(Ok(Event::default().data(payload)));
            }
            drop(tx);
            Sse::new(ReceiverStream::new(rx)).into_response()
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use axum::http::HeaderMap;
    use serde_json::json;

    use super::JsonRpcRequest;
    use super::JsonRpcResponse;
    use super::ResponseMode;
    use super::parse_envelope;
    use super::response_mode;

    #[test]
    fn single_request_parses_as_unary_envelope() {
        let body = br#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#;
        let envelope = parse_envelope(body).expect("envelope");
        assert!(!envelope.is_batch);
        assert_eq!(envelope.requests.len(), 1);
        let request = envelope.requests[0].as_ref().expect("request");
        assert_eq!(request.method, "tools/list");
        assert!(!request.is_notification());
    }

    #[test]
    fn batch_preserves_slot_for_invalid_items() {
        let body = br#"[{"jsonrpc":"2.0","id":1,"method":"tools/list"},{"bogus":true}]"#;
        let envelope = parse_envelope(body).expect("envelope");
        assert!(envelope.is_batch);
        assert_eq!(envelope.requests.len(), 2);
        assert!(envelope.requests[0].is_ok());
        assert!(envelope.requests[1].is_err());
    }

    #[test]
    fn empty_batch_is_an_envelope_error() {
        assert!(parse_envelope(b"[]").is_err());
        assert!(parse_envelope(b"42").is_err());
        assert!(parse_envelope(b"not json").is_err());
    }

    #[test]
    fn notification_has_no_id() {
        let body = br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        let envelope = parse_envelope(body).expect("envelope");
        let request = envelope.requests[0].as_ref().expect("request");
        assert!(request.is_notification());
    }

    #[test]
    fn tool_name_extracted_from_call_params() {
        let body =
            br#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"whoami"}}"#;
        let envelope = parse_envelope(body).expect("envelope");
        let request = envelope.requests[0].as_ref().expect("request");
        assert_eq!(request.tool_name(), Some("whoami"));
    }

    #[test]
    fn parse_then_serialize_round_trips() {
        let response = JsonRpcResponse::success(json!(7), json!({"ok": true}));
        let serialized = serde_json::to_string(&response).expect("serialized");
        let back: JsonRpcResponse = serde_json::from_str(&serialized).expect("parsed");
        assert_eq!(serde_json::to_value(&back).unwrap(), serde_json::to_value(&response).unwrap());
    }

    #[test]
    fn accept_header_selects_sse() {
        let mut headers = HeaderMap::new();
        assert_eq!(response_mode(&headers), ResponseMode::Json);
        headers.insert("accept", "text/event-stream".parse().unwrap());
        assert_eq!(response_mode(&headers), ResponseMode::Sse);
    }

    #[test]
    fn request_round_trip_preserves_fields() {
        let body = br#"{"jsonrpc":"2.0","id":"abc","method":"tools/call","params":{"name":"whoami","arguments":{}}}"#;
        let envelope = parse_envelope(body).expect("envelope");
        let request: &JsonRpcRequest = envelope.requests[0].as_ref().expect("request");
        assert_eq!(request.id, Some(json!("abc")));
        assert_eq!(request.params.as_ref().unwrap()["name"], json!("whoami"));
    }
}
