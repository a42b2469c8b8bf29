// tripgrid-config/src/config.rs
// ============================================================================
// Module: Configuration Loading
// Description: Environment parsing and validation for Tripgrid.
// Purpose: Bind the verifier, data plane, and server limits from environment.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! The configuration is assembled from environment variables and validated in
//! one pass. Lookups are injected as a closure so tests can exercise parsing
//! without touching process environment. All limits are bounded; out-of-range
//! values are rejected rather than clamped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default HTTP listen port.
pub(crate) const DEFAULT_PORT: u16 = 3000;
/// Default maximum request body size in bytes.
pub(crate) const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Minimum allowed request body limit.
pub(crate) const MIN_MAX_BODY_BYTES: usize = 1024;
/// Maximum allowed request body limit.
pub(crate) const MAX_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
/// Default JWKS fetch timeout in milliseconds.
pub(crate) const DEFAULT_JWKS_TIMEOUT_MS: u64 = 30_000;
/// Minimum JWKS fetch timeout in milliseconds.
pub(crate) const MIN_JWKS_TIMEOUT_MS: u64 = 1_000;
/// Maximum JWKS fetch timeout in milliseconds.
pub(crate) const MAX_JWKS_TIMEOUT_MS: u64 = 120_000;
/// Default identity-provider region.
pub(crate) const DEFAULT_IDP_REGION: &str = "us-east-1";
/// Default log filter when `LOG_LEVEL` is unset.
pub(crate) const DEFAULT_LOG_LEVEL: &str = "info";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Top-level Tripgrid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripgridConfig {
    /// HTTP server binding and limits.
    pub server: ServerConfig,
    /// Identity-provider binding for the JWT verifier.
    pub idp: IdpConfig,
    /// Downstream data-plane binding visible to handlers.
    pub data_plane: DataPlaneConfig,
    /// Log filter directive (`LOG_LEVEL`).
    pub log_level: String,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen port.
    pub port: u16,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

/// Identity-provider binding for token verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdpConfig {
    /// User-pool identifier; absent switches the verifier to decode-only mode.
    pub user_pool_id: Option<String>,
    /// Expected token audience (app client id).
    pub client_id: Option<String>,
    /// Identity-provider region.
    pub region: String,
    /// JWKS fetch timeout in milliseconds.
    pub jwks_timeout_ms: u64,
}

impl IdpConfig {
    /// Returns true when signed-token verification is configured.
    #[must_use]
    pub fn verification_enabled(&self) -> bool {
        self.user_pool_id.is_some() && self.client_id.is_some()
    }

    /// Returns the expected token issuer, when configured.
    #[must_use]
    pub fn issuer(&self) -> Option<String> {
        self.user_pool_id
            .as_ref()
            .map(|pool| format!("https://cognito-idp.{}.amazonaws.com/{pool}", self.region))
    }

    /// Returns the JWKS document URI, when configured.
    #[must_use]
    pub fn jwks_uri(&self) -> Option<String> {
        self.issuer().map(|issuer| format!("{issuer}/.well-known/jwks.json"))
    }
}

/// Downstream data-plane binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPlaneConfig {
    /// Role assumed per call with the tenant session tag.
    pub role_arn: Option<String>,
    /// Tenant-partitioned booking table name.
    pub table_name: Option<String>,
    /// Tenant travel-policy bucket name.
    pub bucket_name: Option<String>,
}

impl DataPlaneConfig {
    /// Returns true when the booking data plane is fully bound.
    #[must_use]
    pub fn bookings_enabled(&self) -> bool {
        self.role_arn.is_some() && self.table_name.is_some()
    }

    /// Returns true when the travel-policy resource is fully bound.
    #[must_use]
    pub fn policy_resource_enabled(&self) -> bool {
        self.role_arn.is_some() && self.bucket_name.is_some()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable failed to parse.
    #[error("invalid value for {name}: {message}")]
    Invalid {
        /// Environment variable name.
        name: &'static str,
        /// Parse or validation failure detail.
        message: String,
    },
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl TripgridConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable fails to parse or validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through an injected variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable fails to parse or validate.
    pub fn from_lookup(
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let port = parse_or("PORT", &lookup, DEFAULT_PORT)?;
        let max_body_bytes = parse_or("MAX_BODY_BYTES", &lookup, DEFAULT_MAX_BODY_BYTES)?;
        let jwks_timeout_ms = parse_or("JWKS_TIMEOUT_MS", &lookup, DEFAULT_JWKS_TIMEOUT_MS)?;
        let config = Self {
            server: ServerConfig {
                port,
                max_body_bytes,
            },
            idp: IdpConfig {
                user_pool_id: non_empty(lookup("IDP_USER_POOL_ID")),
                client_id: non_empty(lookup("IDP_CLIENT_ID")),
                region: non_empty(lookup("IDP_REGION"))
                    .unwrap_or_else(|| DEFAULT_IDP_REGION.to_string()),
                jwks_timeout_ms,
            },
            data_plane: DataPlaneConfig {
                role_arn: non_empty(lookup("ROLE_ARN")),
                table_name: non_empty(lookup("TABLE_NAME")),
                bucket_name: non_empty(lookup("BUCKET_NAME")),
            },
            log_level: non_empty(lookup("LOG_LEVEL"))
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates bounds and cross-field requirements.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a value is out of range or inconsistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.max_body_bytes < MIN_MAX_BODY_BYTES
            || self.server.max_body_bytes > MAX_MAX_BODY_BYTES
        {
            return Err(ConfigError::Invalid {
                name: "MAX_BODY_BYTES",
                message: format!(
                    "must be between {MIN_MAX_BODY_BYTES} and {MAX_MAX_BODY_BYTES}"
                ),
            });
        }
        if self.idp.jwks_timeout_ms < MIN_JWKS_TIMEOUT_MS
            || self.idp.jwks_timeout_ms > MAX_JWKS_TIMEOUT_MS
        {
            return Err(ConfigError::Invalid {
                name: "JWKS_TIMEOUT_MS",
                message: format!(
                    "must be between {MIN_JWKS_TIMEOUT_MS} and {MAX_JWKS_TIMEOUT_MS}"
                ),
            });
        }
        if self.idp.region.is_empty() {
            return Err(ConfigError::Invalid {
                name: "IDP_REGION",
                message: "must not be empty".to_string(),
            });
        }
        if self.idp.user_pool_id.is_some() && self.idp.client_id.is_none() {
            return Err(ConfigError::Invalid {
                name: "IDP_CLIENT_ID",
                message: "required when IDP_USER_POOL_ID is set".to_string(),
            });
        }
        Ok(())
    }

    /// Builds a development configuration with verification disabled.
    #[must_use]
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                port: DEFAULT_PORT,
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            },
            idp: IdpConfig {
                user_pool_id: None,
                client_id: None,
                region: DEFAULT_IDP_REGION.to_string(),
                jwks_timeout_ms: DEFAULT_JWKS_TIMEOUT_MS,
            },
            data_plane: DataPlaneConfig {
                role_arn: None,
                table_name: None,
                bucket_name: None,
            },
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Treats empty strings as absent values.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty()).map(|value| value.trim().to_string())
}

/// Parses a variable or falls back to the default when unset.
fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    lookup: &impl Fn(&'static str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match non_empty(lookup(name)) {
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::Invalid {
            name,
            message: format!("failed to parse {raw:?}"),
        }),
        None => Ok(default),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use std::collections::BTreeMap;

    use super::ConfigError;
    use super::TripgridConfig;

    fn lookup_from(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: BTreeMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, (*v).to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = TripgridConfig::from_lookup(lookup_from(&[])).expect("config");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.max_body_bytes, 1024 * 1024);
        assert_eq!(config.idp.region, "us-east-1");
        assert_eq!(config.log_level, "info");
        assert!(!config.idp.verification_enabled());
    }

    #[test]
    fn issuer_and_jwks_uri_derive_from_pool_binding() {
        let config = TripgridConfig::from_lookup(lookup_from(&[
            ("IDP_USER_POOL_ID", "us-east-1_AbCdEfGhI"),
            ("IDP_CLIENT_ID", "client-1"),
            ("IDP_REGION", "us-east-1"),
        ]))
        .expect("config");
        assert!(config.idp.verification_enabled());
        assert_eq!(
            config.idp.issuer().unwrap(),
            "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_AbCdEfGhI"
        );
        assert_eq!(
            config.idp.jwks_uri().unwrap(),
            "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_AbCdEfGhI/.well-known/jwks.json"
        );
    }

    #[test]
    fn pool_without_client_id_is_rejected() {
        let result = TripgridConfig::from_lookup(lookup_from(&[(
            "IDP_USER_POOL_ID",
            "us-east-1_AbCdEfGhI",
        )]));
        assert!(matches!(result, Err(ConfigError::Invalid { name, .. }) if name == "IDP_CLIENT_ID"));
    }

    #[test]
    fn out_of_range_body_limit_is_rejected() {
        let result =
            TripgridConfig::from_lookup(lookup_from(&[("MAX_BODY_BYTES", "128")]));
        assert!(matches!(result, Err(ConfigError::Invalid { name, .. }) if name == "MAX_BODY_BYTES"));
    }

    #[test]
    fn unparseable_port_is_rejected() {
        let result = TripgridConfig::from_lookup(lookup_from(&[("PORT", "not-a-port")]));
        assert!(matches!(result, Err(ConfigError::Invalid { name, .. }) if name == "PORT"));
    }

    #[test]
    fn data_plane_flags_reflect_bindings() {
        let config = TripgridConfig::from_lookup(lookup_from(&[
            ("ROLE_ARN", "arn:aws:iam::123456789012:role/tripgrid-tenant"),
            ("TABLE_NAME", "tripgrid-bookings"),
        ]))
        .expect("config");
        assert!(config.data_plane.bookings_enabled());
        assert!(!config.data_plane.policy_resource_enabled());
    }
}
