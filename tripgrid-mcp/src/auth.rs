// tripgrid-mcp/src/auth.rs
// ============================================================================
// Module: JWT Verifier
// Description: Bearer extraction, token classification, and claim projection.
// Purpose: Produce a per-request AuthContext with a fail-closed trust flag.
// Dependencies: jsonwebtoken, base64, serde_json, tripgrid-config
// ============================================================================

//! ## Overview
//! The verifier classifies every request into one of: absent token, unsigned
//! token, signed-and-valid, or signed-but-invalid with a distinct reason. It
//! never errors for known failure classes; the pipeline decides whether a
//! given classification is acceptable for the requested method. `verified` is
//! true only when signature, issuer, and audience all passed.
//!
//! Without a configured user pool the verifier refuses the signed path and
//! returns a decoded-only context with `verified=false`. That mode exists for
//! local development and must not be reachable in production deployments.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::Algorithm;
use jsonwebtoken::Validation;
use jsonwebtoken::errors::ErrorKind;
use serde_json::Map;
use serde_json::Value;
use tripgrid_config::IdpConfig;
use tripgrid_core::TenantId;
use tripgrid_core::TenantTier;
use tripgrid_core::UserId;

use crate::jwks::JwksCache;
use crate::jwks::JwksError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Required bearer scheme prefix, case-sensitive with exactly one space.
const BEARER_PREFIX: &str = "Bearer ";
/// Maximum accepted authorization header length.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Auth Context
// ============================================================================

/// Per-request caller context derived from the authorization header.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Subject identifier; the anonymous sentinel without a valid token.
    pub user_id: UserId,
    /// Tenant identifier; empty when unknown.
    pub tenant_id: TenantId,
    /// Tenant service tier; `basic` when the claim is absent.
    pub tenant_tier: TenantTier,
    /// Raw compact token; empty for anonymous callers.
    pub token: String,
    /// Full decoded claim set, read-only.
    pub claims: Map<String, Value>,
    /// True only when signature, issuer, and audience all passed.
    pub verified: bool,
}

impl AuthContext {
    /// Builds the anonymous context used when no usable token is present.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            user_id: UserId::anonymous(),
            tenant_id: TenantId::new(""),
            tenant_tier: TenantTier::default(),
            token: String::new(),
            claims: Map::new(),
            verified: false,
        }
    }
}

/// Classification reason attached to non-verified contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthReason {
    /// No authorization header present.
    Missing,
    /// Header present but not `Bearer ` prefixed.
    BadFormat,
    /// Bearer scheme with an empty token.
    Empty,
    /// Token structure or base64url decoding failed.
    Malformed,
    /// Token carries no usable signature (`alg` none/absent or no `kid`).
    Unsigned,
    /// Signature valid but the token has expired.
    Expired,
    /// Signature verification failed.
    InvalidSignature,
    /// Issuer claim does not match the configured pool.
    WrongIssuer,
    /// Audience claim does not match the configured client id.
    WrongAudience,
    /// Token is not valid yet (`nbf`/`iat` in the future).
    NotYetValid,
    /// Signed-path verification is not configured (development mode).
    VerificationDisabled,
    /// Any other verification failure.
    Unknown,
}

impl AuthReason {
    /// Returns the stable reason label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::BadFormat => "bad-format",
            Self::Empty => "empty",
            Self::Malformed => "malformed",
            Self::Unsigned => "unsigned",
            Self::Expired => "expired",
            Self::InvalidSignature => "invalid-signature",
            Self::WrongIssuer => "wrong-issuer",
            Self::WrongAudience => "wrong-audience",
            Self::NotYetValid => "not-yet-valid",
            Self::VerificationDisabled => "verification-disabled",
            Self::Unknown => "unknown",
        }
    }

    /// Returns the stable wire message used in 401 error envelopes.
    #[must_use]
    pub const fn wire_message(self) -> &'static str {
        match self {
            Self::Missing => "missing-token",
            Self::BadFormat => "bad-auth-format",
            Self::Empty => "empty-token",
            Self::Expired => "token-expired",
            Self::Unsigned => "unsigned-token-not-accepted",
            Self::Malformed
            | Self::InvalidSignature
            | Self::WrongIssuer
            | Self::WrongAudience
            | Self::NotYetValid
            | Self::VerificationDisabled
            | Self::Unknown => "token-invalid",
        }
    }

    /// Returns the server-defined JSON-RPC error code for this reason.
    #[must_use]
    pub const fn error_code(self) -> i64 {
        match self {
            Self::Missing => -32001,
            Self::BadFormat => -32002,
            Self::Empty => -32003,
            Self::Expired => -32004,
            Self::Unsigned => -32006,
            Self::Malformed
            | Self::InvalidSignature
            | Self::WrongIssuer
            | Self::WrongAudience
            | Self::NotYetValid
            | Self::VerificationDisabled
            | Self::Unknown => -32005,
        }
    }
}

/// Verifier outcome: a context plus the reason it is not verified, if any.
#[derive(Debug, Clone)]
pub struct TokenClassification {
    /// Derived caller context.
    pub context: AuthContext,
    /// Classification reason; absent on the clean signed path.
    pub reason: Option<AuthReason>,
}

impl TokenClassification {
    /// Returns true when the token was classified as unsigned.
    #[must_use]
    pub fn is_unsigned(&self) -> bool {
        self.reason == Some(AuthReason::Unsigned)
    }

    /// Builds an anonymous classification with the given reason.
    fn anonymous(reason: AuthReason) -> Self {
        Self {
            context: AuthContext::anonymous(),
            reason: Some(reason),
        }
    }
}

/// Sidecar passed to the `whoami` handler alongside validated arguments.
///
/// Carried explicitly per call; the verifier keeps no request-scoped global
/// state, so concurrent requests cannot observe each other's headers.
#[derive(Debug, Clone)]
pub struct AuthInfo {
    /// Raw bearer token value; empty when none was presented.
    pub token: String,
    /// Verifier classification reason, absent on the clean signed path.
    pub reason: Option<AuthReason>,
}

// ============================================================================
// SECTION: Verifier
// ============================================================================

/// JWT verifier bound to an identity-provider configuration.
pub struct JwtVerifier {
    /// Identity-provider binding.
    idp: IdpConfig,
    /// JWKS cache; absent in decode-only development mode.
    jwks: Option<Arc<JwksCache>>,
}

impl JwtVerifier {
    /// Builds a verifier from identity-provider configuration.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError`] when the JWKS client cannot be constructed.
    pub fn from_config(idp: &IdpConfig) -> Result<Self, JwksError> {
        let jwks = match idp.jwks_uri() {
            Some(uri) if idp.verification_enabled() => Some(Arc::new(JwksCache::new(
                uri,
                Duration::from_millis(idp.jwks_timeout_ms),
            )?)),
            _ => None,
        };
        Ok(Self {
            idp: idp.clone(),
            jwks,
        })
    }

    /// Builds a verifier with an injected JWKS cache.
    #[must_use]
    pub fn with_cache(idp: IdpConfig, cache: Arc<JwksCache>) -> Self {
        Self {
            idp,
            jwks: Some(cache),
        }
    }

    /// Classifies the authorization header into a caller context.
    ///
    /// Classification never fails; every outcome is a [`TokenClassification`].
    pub async fn classify(&self, auth_header: Option<&str>) -> TokenClassification {
        let Some(header) = auth_header else {
            return TokenClassification::anonymous(AuthReason::Missing);
        };
        if header.len() > MAX_AUTH_HEADER_BYTES {
            return TokenClassification::anonymous(AuthReason::BadFormat);
        }
        let Some(remainder) = header.strip_prefix(BEARER_PREFIX) else {
            return TokenClassification::anonymous(AuthReason::BadFormat);
        };
        let token = remainder.trim();
        if token.is_empty() {
            return TokenClassification::anonymous(AuthReason::Empty);
        }

        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() < 2 {
            return TokenClassification::anonymous(AuthReason::Malformed);
        }
        let Some(header_json) = decode_segment(segments[0]) else {
            return TokenClassification::anonymous(AuthReason::Malformed);
        };
        let Some(claims) = decode_segment(segments[1]) else {
            return TokenClassification::anonymous(AuthReason::Malformed);
        };

        let alg = header_json.get("alg").and_then(Value::as_str);
        let kid = header_json.get("kid").and_then(Value::as_str);
        let unsigned = matches!(alg, None | Some("none")) || kid.is_none();
        if unsigned {
            return TokenClassification {
                context: decoded_context(token, claims),
                reason: Some(AuthReason::Unsigned),
            };
        }

        let Some(jwks) = &self.jwks else {
            // Development mode: decode claims but never mark them verified.
            return TokenClassification {
                context: decoded_context(token, claims),
                reason: Some(AuthReason::VerificationDisabled),
            };
        };
        // kid is present on the signed path by construction.
        let kid = kid.unwrap_or_default();
        let key = match jwks.key_for(kid).await {
            Ok(key) => key,
            Err(JwksError::UnknownKid(_)) => {
                return TokenClassification {
                    context: decoded_context(token, claims),
                    reason: Some(AuthReason::InvalidSignature),
                };
            }
            Err(_) => {
                return TokenClassification {
                    context: decoded_context(token, claims),
                    reason: Some(AuthReason::Unknown),
                };
            }
        };

        let mut validation = Validation::new(Algorithm::RS256);
        if let Some(issuer) = self.idp.issuer() {
            validation.set_issuer(&[issuer]);
        }
        if let Some(client_id) = &self.idp.client_id {
            validation.set_audience(&[client_id]);
        }
        match jsonwebtoken::decode::<Map<String, Value>>(token, &key, &validation) {
            Ok(data) => {
                let mut context = decoded_context(token, data.claims);
                context.verified = !context.user_id.is_anonymous();
                let reason =
                    if context.verified { None } else { Some(AuthReason::Unknown) };
                TokenClassification {
                    context,
                    reason,
                }
            }
            Err(err) => TokenClassification {
                context: decoded_context(token, claims),
                reason: Some(map_validation_error(err.kind())),
            },
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Decodes one base64url token segment into a JSON object.
///
/// Padding is tolerated even though compact tokens omit it.
fn decode_segment(segment: &str) -> Option<Map<String, Value>> {
    let bytes = URL_SAFE_NO_PAD.decode(segment.trim_end_matches('=')).ok()?;
    serde_json::from_slice::<Value>(&bytes).ok()?.as_object().cloned()
}

/// Projects claims into an unverified caller context.
fn decoded_context(token: &str, claims: Map<String, Value>) -> AuthContext {
    let user_id = claims
        .get("sub")
        .and_then(Value::as_str)
        .map_or_else(UserId::anonymous, UserId::new);
    let tenant_id = claims
        .get("custom:tenantId")
        .or_else(|| claims.get("tenantId"))
        .and_then(Value::as_str)
        .map_or_else(|| TenantId::new(""), TenantId::new);
    let tenant_tier = claims
        .get("custom:tenantTier")
        .and_then(Value::as_str)
        .map_or_else(TenantTier::default, TenantTier::new);
    AuthContext {
        user_id,
        tenant_id,
        tenant_tier,
        token: token.to_string(),
        claims,
        verified: false,
    }
}

/// Maps a validation failure to a classification reason.
fn map_validation_error(kind: &ErrorKind) -> AuthReason {
    match kind {
        ErrorKind::ExpiredSignature => AuthReason::Expired,
        ErrorKind::InvalidSignature => AuthReason::InvalidSignature,
        ErrorKind::InvalidIssuer => AuthReason::WrongIssuer,
        ErrorKind::InvalidAudience => AuthReason::WrongAudience,
        ErrorKind::ImmatureSignature => AuthReason::NotYetValid,
        _ => AuthReason::Unknown,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use tripgrid_config::IdpConfig;

    use super::AuthReason;
    use super::JwtVerifier;

    /// Unsigned token with `{"alg":"none"}` and tenant claims.
    const UNSIGNED_TOKEN: &str = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.\
                                  eyJzdWIiOiJ1c2VyMSIsImN1c3RvbTp0ZW5hbnRJZCI6IkFCQzEyMyJ9.";

    fn decode_only_verifier() -> JwtVerifier {
        JwtVerifier::from_config(&IdpConfig {
            user_pool_id: None,
            client_id: None,
            region: "us-east-1".to_string(),
            jwks_timeout_ms: 30_000,
        })
        .expect("verifier")
    }

    #[tokio::test]
    async fn missing_header_is_anonymous() {
        let classification = decode_only_verifier().classify(None).await;
        assert_eq!(classification.reason, Some(AuthReason::Missing));
        assert!(!classification.context.verified);
        assert!(classification.context.user_id.is_anonymous());
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_bad_format() {
        let classification = decode_only_verifier().classify(Some("Basic abc")).await;
        assert_eq!(classification.reason, Some(AuthReason::BadFormat));
    }

    #[tokio::test]
    async fn lowercase_bearer_is_bad_format() {
        let classification = decode_only_verifier().classify(Some("bearer abc")).await;
        assert_eq!(classification.reason, Some(AuthReason::BadFormat));
    }

    #[tokio::test]
    async fn bearer_with_trailing_space_only_is_empty() {
        let classification = decode_only_verifier().classify(Some("Bearer ")).await;
        assert_eq!(classification.reason, Some(AuthReason::Empty));
    }

    #[tokio::test]
    async fn garbage_token_is_malformed() {
        let classification = decode_only_verifier().classify(Some("Bearer not-a-jwt")).await;
        assert_eq!(classification.reason, Some(AuthReason::Malformed));
    }

    #[tokio::test]
    async fn none_alg_token_is_unsigned_with_projected_claims() {
        let header = format!("Bearer {UNSIGNED_TOKEN}");
        let classification = decode_only_verifier().classify(Some(&header)).await;
        assert!(classification.is_unsigned());
        assert!(!classification.context.verified);
        assert_eq!(classification.context.user_id.as_str(), "user1");
        assert_eq!(classification.context.tenant_id.as_str(), "ABC123");
        assert_eq!(classification.context.tenant_tier.as_str(), "basic");
        assert_eq!(classification.context.token, UNSIGNED_TOKEN);
    }

    #[tokio::test]
    async fn oversized_header_is_bad_format() {
        let header = format!("Bearer {}", "a".repeat(9000));
        let classification = decode_only_verifier().classify(Some(&header)).await;
        assert_eq!(classification.reason, Some(AuthReason::BadFormat));
    }

    #[test]
    fn wire_messages_are_stable() {
        assert_eq!(AuthReason::Missing.wire_message(), "missing-token");
        assert_eq!(AuthReason::BadFormat.wire_message(), "bad-auth-format");
        assert_eq!(AuthReason::Empty.wire_message(), "empty-token");
        assert_eq!(AuthReason::Expired.wire_message(), "token-expired");
        assert_eq!(AuthReason::Unsigned.wire_message(), "unsigned-token-not-accepted");
        assert_eq!(AuthReason::InvalidSignature.wire_message(), "token-invalid");
    }
}
