// tripgrid-config/src/lib.rs
// ============================================================================
// Module: Tripgrid Configuration
// Description: Environment-driven configuration for the Tripgrid MCP server.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Configuration is read from process environment variables and validated
//! eagerly at startup. Missing identity-provider binding switches the server
//! into decode-only development mode; missing data-plane binding disables the
//! corresponding handlers with a startup warning. Invalid values fail closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ConfigError;
pub use config::DataPlaneConfig;
pub use config::IdpConfig;
pub use config::ServerConfig;
pub use config::TripgridConfig;
