// tripgrid-mcp/src/registry.rs
// ============================================================================
// Module: Tool & Resource Registry
// Description: Per-request tool and resource registration with visibility.
// Purpose: Hold exactly the handlers the current caller is allowed to see.
// Dependencies: tripgrid-core, serde_json, async-trait
// ============================================================================

//! ## Overview
//! A registry is built per request from the caller's [`AuthContext`]: the
//! anonymous registry carries only public tools, the verified registry adds
//! the domain tools and tenant resources. Because invisibility means absence,
//! a protected tool name can never leak to an unverified caller: lookups fail
//! with the same not-found error an unknown name produces.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tripgrid_core::ToolResult;

use crate::auth::AuthContext;
use crate::auth::AuthInfo;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tool routing and handler errors.
///
/// Business failures do not appear here: handlers report them inside a
/// [`ToolResult`] with `is_error` set.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool name is not visible to the caller.
    #[error("tool not found: {0}")]
    NotFound(String),
    /// Arguments failed schema validation.
    #[error("invalid params: {0}")]
    InvalidParams(String),
    /// Resource URI is not visible to the caller.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
    /// Infrastructure failure inside a handler.
    #[error("internal error: {0}")]
    Internal(String),
    /// Response serialization failed.
    #[error("serialization failed")]
    Serialization,
    /// A name was registered twice.
    #[error("duplicate registration: {0}")]
    Duplicate(String),
}

// ============================================================================
// SECTION: Tool Registry
// ============================================================================

/// Tool visibility class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolVisibility {
    /// Callable by any caller, verified or not.
    Public,
    /// Callable only with a verified token.
    Authenticated,
}

/// Tool handler invoked with validated arguments.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Executes the tool call.
    async fn call(
        &self,
        arguments: Value,
        context: &AuthContext,
        info: &AuthInfo,
    ) -> Result<ToolResult, ToolError>;
}

/// Registered tool with schema and handler.
#[derive(Clone)]
pub struct ToolDescriptor {
    /// Tool name, unique within the registry.
    pub name: String,
    /// Tool description for clients.
    pub description: String,
    /// JSON schema for tool arguments.
    pub input_schema: Value,
    /// Visibility class.
    pub visibility: ToolVisibility,
    /// Handler invoked with validated arguments.
    pub handler: Arc<dyn ToolHandler>,
}

/// Wire shape of a tool entry in `tools/list`.
#[derive(Debug, Serialize)]
pub struct ToolListing {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON schema for tool arguments.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Per-request tool registry.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    /// Registered tools ordered by name.
    tools: BTreeMap<String, ToolDescriptor>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Duplicate`] when the name is already taken.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<(), ToolError> {
        if self.tools.contains_key(&descriptor.name) {
            return Err(ToolError::Duplicate(descriptor.name));
        }
        self.tools.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Lists all registered tools in wire shape.
    #[must_use]
    pub fn list(&self) -> Vec<ToolListing> {
        self.tools
            .values()
            .map(|descriptor| ToolListing {
                name: descriptor.name.clone(),
                description: descriptor.description.clone(),
                input_schema: descriptor.input_schema.clone(),
            })
            .collect()
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// Returns the registered tool names.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }
}

// ============================================================================
// SECTION: Resource Registry
// ============================================================================

/// Content returned by a resource read.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceContent {
    /// Resource URI as requested.
    pub uri: String,
    /// Content MIME type.
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Text payload.
    pub text: String,
}

/// Resource handler resolving a URI for the current caller.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Reads the resource content.
    async fn read(
        &self,
        uri: &str,
        context: &AuthContext,
    ) -> Result<ResourceContent, ToolError>;
}

/// Registered resource with URI and handler.
#[derive(Clone)]
pub struct ResourceDescriptor {
    /// Resource name.
    pub name: String,
    /// Resource URI; the handler owns its interpretation.
    pub uri: String,
    /// Resource description for clients.
    pub description: String,
    /// Content MIME type advertised in listings.
    pub mime_type: String,
    /// Handler resolving the URI.
    pub handler: Arc<dyn ResourceHandler>,
}

/// Wire shape of a resource entry in `resources/list`.
#[derive(Debug, Serialize)]
pub struct ResourceListing {
    /// Resource name.
    pub name: String,
    /// Resource URI.
    pub uri: String,
    /// Resource description.
    pub description: String,
    /// Content MIME type.
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// Per-request resource registry.
#[derive(Default, Clone)]
pub struct ResourceRegistry {
    /// Registered resources ordered by URI.
    resources: BTreeMap<String, ResourceDescriptor>,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Duplicate`] when the URI is already taken.
    pub fn register(&mut self, descriptor: ResourceDescriptor) -> Result<(), ToolError> {
        if self.resources.contains_key(&descriptor.uri) {
            return Err(ToolError::Duplicate(descriptor.uri));
        }
        self.resources.insert(descriptor.uri.clone(), descriptor);
        Ok(())
    }

    /// Lists all registered resources in wire shape.
    #[must_use]
    pub fn list(&self) -> Vec<ResourceListing> {
        self.resources
            .values()
            .map(|descriptor| ResourceListing {
                name: descriptor.name.clone(),
                uri: descriptor.uri.clone(),
                description: descriptor.description.clone(),
                mime_type: descriptor.mime_type.clone(),
            })
            .collect()
    }

    /// Looks up a resource by URI.
    #[must_use]
    pub fn get(&self, uri: &str) -> Option<&ResourceDescriptor> {
        self.resources.get(uri)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::Value;
    use serde_json::json;
    use tripgrid_core::ToolResult;

    use super::ToolDescriptor;
    use super::ToolError;
    use super::ToolHandler;
    use super::ToolRegistry;
    use super::ToolVisibility;
    use crate::auth::AuthContext;
    use crate::auth::AuthInfo;

    struct EchoTool;

    #[async_trait]
    impl ToolHandler for EchoTool {
        async fn call(
            &self,
            arguments: Value,
            _context: &AuthContext,
            _info: &AuthInfo,
        ) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::json(&arguments))
        }
    }

    fn echo_descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor {
            name: name.to_string(),
            description: "echo".to_string(),
            input_schema: json!({"type": "object"}),
            visibility: ToolVisibility::Public,
            handler: Arc::new(EchoTool),
        }
    }

    #[test]
    fn duplicate_tool_names_are_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_descriptor("echo")).expect("first registration");
        let result = registry.register(echo_descriptor("echo"));
        assert!(matches!(result, Err(ToolError::Duplicate(_))));
    }

    #[test]
    fn listing_matches_registration() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_descriptor("b_tool")).expect("register");
        registry.register(echo_descriptor("a_tool")).expect("register");
        let names: Vec<String> = registry.list().into_iter().map(|tool| tool.name).collect();
        assert_eq!(names, vec!["a_tool".to_string(), "b_tool".to_string()]);
        assert!(registry.get("a_tool").is_some());
        assert!(registry.get("missing").is_none());
    }
}
