// tripgrid-mcp/src/dispatcher.rs
// ============================================================================
// Module: MCP Dispatcher
// Description: JSON-RPC method routing bound to one caller context.
// Purpose: Serve the MCP tool, resource, and prompt methods per request.
// Dependencies: tripgrid-core, jsonschema, serde_json
// ============================================================================

//! ## Overview
//! A dispatcher is constructed per request, bound to the caller's
//! [`AuthContext`] and the registries built for it, and dropped when the
//! response closes. It holds no cross-request state. Protected tools are
//! simply absent from an unverified caller's registry, so a call to one
//! reports the same not-found error an unknown name produces.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use jsonschema::CompilationOptions;
use jsonschema::Draft;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use tripgrid_core::PromptCatalog;
use tripgrid_core::PromptError;

use crate::auth::AuthContext;
use crate::auth::AuthInfo;
use crate::metadata::ServerMetadata;
use crate::prompt_methods;
use crate::registry::ResourceRegistry;
use crate::registry::ToolError;
use crate::registry::ToolRegistry;
use crate::transport::JsonRpcRequest;
use crate::transport::JsonRpcResponse;

// ============================================================================
// SECTION: Error Codes
// ============================================================================

/// JSON-RPC invalid request.
pub const CODE_INVALID_REQUEST: i64 = -32600;
/// JSON-RPC method not found.
pub const CODE_METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC invalid params.
pub const CODE_INVALID_PARAMS: i64 = -32602;
/// JSON-RPC internal error.
pub const CODE_INTERNAL: i64 = -32603;

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Per-request MCP dispatcher.
pub struct McpDispatcher {
    /// Caller context the registries were built for.
    context: AuthContext,
    /// Raw token sidecar for the whoami tool.
    info: AuthInfo,
    /// Tools visible to this caller.
    tools: ToolRegistry,
    /// Resources visible to this caller.
    resources: ResourceRegistry,
    /// Immutable prompt catalog.
    prompts: Arc<PromptCatalog>,
    /// Server metadata served by initialize.
    metadata: ServerMetadata,
}

/// Parameters of `tools/call`.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    /// Tool name.
    name: String,
    /// Raw JSON arguments.
    #[serde(default)]
    arguments: Value,
}

/// Parameters of `resources/read`.
#[derive(Debug, Deserialize)]
struct ResourceReadParams {
    /// Resource URI.
    uri: String,
}

/// Parameters of `prompts/get`.
#[derive(Debug, Deserialize)]
struct PromptGetParams {
    /// Prompt name.
    name: String,
    /// Prompt arguments.
    #[serde(default)]
    arguments: BTreeMap<String, String>,
}

impl McpDispatcher {
    /// Creates a dispatcher bound to one caller.
    #[must_use]
    pub fn new(
        context: AuthContext,
        info: AuthInfo,
        tools: ToolRegistry,
        resources: ResourceRegistry,
        prompts: Arc<PromptCatalog>,
    ) -> Self {
        Self {
            context,
            info,
            tools,
            resources,
            prompts,
            metadata: ServerMetadata::current(),
        }
    }

    /// Returns the caller context this dispatcher is bound to.
    #[must_use]
    pub fn context(&self) -> &AuthContext {
        &self.context
    }

    /// Dispatches one JSON-RPC request.
    ///
    /// Notifications produce no response per JSON-RPC semantics.
    pub async fn dispatch(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            // notifications/initialized is acknowledged by silence; unknown
            // notifications are dropped the same way.
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                id,
                CODE_INVALID_REQUEST,
                "invalid json-rpc version",
                None,
            ));
        }
        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.metadata.initialize_result()),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            "resources/list" => self.handle_resources_list(id),
            "resources/read" => self.handle_resources_read(id, request.params).await,
            "prompts/list" => self.handle_prompts_list(id),
            "prompts/get" => self.handle_prompts_get(id, request.params),
            _ => JsonRpcResponse::error(id, CODE_METHOD_NOT_FOUND, "method not found", None),
        };
        Some(response)
    }

    /// Serves `tools/list` from the per-request registry.
    fn handle_tools_list(&self, id: Value) -> JsonRpcResponse {
        match serde_json::to_value(self.tools.list()) {
            Ok(tools) => JsonRpcResponse::success(id, json!({ "tools": tools })),
            Err(_) => serialization_error(id),
        }
    }

    /// Serves `tools/call`: visibility, schema validation, then the handler.
    async fn handle_tools_call(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params = params.unwrap_or(Value::Null);
        let call: ToolCallParams = match serde_json::from_value(params) {
            Ok(call) => call,
            Err(err) => {
                return JsonRpcResponse::error(
                    id,
                    CODE_INVALID_PARAMS,
                    format!("invalid tool params: {err}"),
                    None,
                );
            }
        };
        let Some(descriptor) = self.tools.get(&call.name) else {
            // Not visible and nonexistent are indistinguishable on purpose.
            return JsonRpcResponse::error(
                id,
                CODE_METHOD_NOT_FOUND,
                format!("tool not found: {}", call.name),
                None,
            );
        };
        let arguments =
            if call.arguments.is_null() { json!({}) } else { call.arguments };
        if let Err(err) = validate_arguments(&descriptor.input_schema, &arguments) {
            return tool_error_response(id, &err);
        }
        match descriptor.handler.call(arguments, &self.context, &self.info).await {
            Ok(result) => match serde_json::to_value(&result) {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(_) => serialization_error(id),
            },
            Err(err) => tool_error_response(id, &err),
        }
    }

    /// Serves `resources/list` from the per-request registry.
    fn handle_resources_list(&self, id: Value) -> JsonRpcResponse {
        match serde_json::to_value(self.resources.list()) {
            Ok(resources) => JsonRpcResponse::success(id, json!({ "resources": resources })),
            Err(_) => serialization_error(id),
        }
    }

    /// Serves `resources/read` through the owning handler.
    async fn handle_resources_read(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params = params.unwrap_or(Value::Null);
        let read: ResourceReadParams = match serde_json::from_value(params) {
            Ok(read) => read,
            Err(err) => {
                return JsonRpcResponse::error(
                    id,
                    CODE_INVALID_PARAMS,
                    format!("invalid resource params: {err}"),
                    None,
                );
            }
        };
        let Some(descriptor) = self.resources.get(&read.uri) else {
            return JsonRpcResponse::error(
                id,
                CODE_METHOD_NOT_FOUND,
                format!("resource not found: {}", read.uri),
                None,
            );
        };
        match descriptor.handler.read(&read.uri, &self.context).await {
            Ok(content) => match serde_json::to_value(vec![content]) {
                Ok(contents) => JsonRpcResponse::success(id, json!({ "contents": contents })),
                Err(_) => serialization_error(id),
            },
            Err(err) => tool_error_response(id, &err),
        }
    }

    /// Serves `prompts/list` from the catalog.
    fn handle_prompts_list(&self, id: Value) -> JsonRpcResponse {
        match serde_json::to_value(prompt_methods::prompt_listing(&self.prompts)) {
            Ok(prompts) => JsonRpcResponse::success(id, json!({ "prompts": prompts })),
            Err(_) => serialization_error(id),
        }
    }

    /// Serves `prompts/get` by rendering the template.
    fn handle_prompts_get(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params = params.unwrap_or(Value::Null);
        let get: PromptGetParams = match serde_json::from_value(params) {
            Ok(get) => get,
            Err(err) => {
                return JsonRpcResponse::error(
                    id,
                    CODE_INVALID_PARAMS,
                    format!("invalid prompt params: {err}"),
                    None,
                );
            }
        };
        match prompt_methods::rendered_prompt(&self.prompts, &get.name, &get.arguments) {
            Ok(rendered) => match serde_json::to_value(&rendered) {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(_) => serialization_error(id),
            },
            Err(err @ (PromptError::UnknownPrompt(_) | PromptError::MissingArgument(_))) => {
                JsonRpcResponse::error(id, CODE_INVALID_PARAMS, err.to_string(), None)
            }
            Err(err) => JsonRpcResponse::error(id, CODE_INTERNAL, err.to_string(), None),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates tool arguments against the declared schema.
fn validate_arguments(schema: &Value, arguments: &Value) -> Result<(), ToolError> {
    let mut options = CompilationOptions::default();
    options.with_draft(Draft::Draft202012);
    let compiled = options
        .compile(schema)
        .map_err(|err| ToolError::Internal(format!("invalid tool schema: {err}")))?;
    if let Err(errors) = compiled.validate(arguments) {
        let messages = errors.map(|error| error.to_string()).collect::<Vec<_>>();
        return Err(ToolError::InvalidParams(format!(
            "arguments do not match schema: {}",
            messages.join("; ")
        )));
    }
    Ok(())
}

/// Maps a tool error onto the JSON-RPC error envelope.
fn tool_error_response(id: Value, error: &ToolError) -> JsonRpcResponse {
    let (code, message) = match error {
        ToolError::NotFound(name) => (CODE_METHOD_NOT_FOUND, format!("tool not found: {name}")),
        ToolError::ResourceNotFound(uri) => {
            (CODE_METHOD_NOT_FOUND, format!("resource not found: {uri}"))
        }
        ToolError::InvalidParams(message) => (CODE_INVALID_PARAMS, message.clone()),
        ToolError::Internal(message) => (CODE_INTERNAL, message.clone()),
        ToolError::Serialization => (CODE_INTERNAL, "serialization failed".to_string()),
        ToolError::Duplicate(name) => {
            (CODE_INTERNAL, format!("duplicate registration: {name}"))
        }
    };
    JsonRpcResponse::error(id, code, message, None)
}

/// Builds the internal serialization failure response.
fn serialization_error(id: Value) -> JsonRpcResponse {
    JsonRpcResponse::error(id, CODE_INTERNAL, "serialization failed", None)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
