// tripgrid-mcp/src/lib.rs
// ============================================================================
// Module: Tripgrid MCP
// Description: Stateless multi-tenant MCP server for Tripgrid travel tools.
// Purpose: Expose travel tools, resources, and prompts over JSON-RPC 2.0.
// Dependencies: tripgrid-core, tripgrid-config, axum, tokio
// ============================================================================

//! ## Overview
//! Tripgrid MCP serves the Model Context Protocol over a single streamable
//! HTTP endpoint. Each request is authenticated, projected into a
//! tenant-scoped context, routed to a per-request registry of tools and
//! resources, and answered as unary JSON or an SSE stream. The server is
//! strictly stateless: there are no sessions, and the only process-lived
//! mutable state is the JWKS cache.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod credentials;
pub mod dispatcher;
pub mod jwks;
pub mod metadata;
pub mod prompt_methods;
pub mod registry;
pub mod resources;
pub mod server;
pub mod tools;
pub mod transport;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditEvent;
pub use audit::AuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use auth::AuthContext;
pub use auth::AuthInfo;
pub use auth::AuthReason;
pub use auth::JwtVerifier;
pub use auth::TokenClassification;
pub use credentials::StsCredentialVendor;
pub use dispatcher::McpDispatcher;
pub use jwks::JwksCache;
pub use jwks::JwksError;
pub use metadata::ServerMetadata;
pub use registry::ResourceRegistry;
pub use registry::ToolDescriptor;
pub use registry::ToolError;
pub use registry::ToolHandler;
pub use registry::ToolRegistry;
pub use registry::ToolVisibility;
pub use resources::PolicySource;
pub use resources::S3PolicySource;
pub use server::McpServer;
pub use server::McpServerError;
pub use server::ServerState;
pub use server::build_router;
pub use server::is_public_method;
pub use tools::ToolDeps;
pub use tools::build_tool_registry;
pub use transport::JsonRpcRequest;
pub use transport::JsonRpcResponse;
