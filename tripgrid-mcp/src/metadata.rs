// tripgrid-mcp/src/metadata.rs
// ============================================================================
// Module: Server Metadata
// Description: Version, protocol, and capability advertisement.
// Purpose: Serve identical metadata through initialize and /health.
// Dependencies: serde, serde_json
// ============================================================================

//! Process-lived server metadata, fixed at build time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Server name advertised to clients.
pub const SERVER_NAME: &str = "tripgrid";
/// MCP protocol revision implemented by the dispatcher.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

// ============================================================================
// SECTION: Metadata
// ============================================================================

/// Immutable server metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ServerMetadata {
    /// Server name.
    pub name: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Implemented MCP protocol revision.
    pub protocol_version: &'static str,
}

impl ServerMetadata {
    /// Returns the build-time metadata.
    #[must_use]
    pub const fn current() -> Self {
        Self {
            name: SERVER_NAME,
            version: env!("CARGO_PKG_VERSION"),
            protocol_version: PROTOCOL_VERSION,
        }
    }

    /// Builds the `initialize` result payload.
    #[must_use]
    pub fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": self.protocol_version,
            "capabilities": {
                "tools": {},
                "resources": {},
                "prompts": {}
            },
            "serverInfo": {
                "name": self.name,
                "version": self.version
            }
        })
    }

    /// Builds the `/health` payload.
    #[must_use]
    pub fn health_payload(&self) -> Value {
        json!({
            "status": "ok",
            "name": self.name,
            "version": self.version,
            "protocolVersion": self.protocol_version
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
