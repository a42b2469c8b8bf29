// tripgrid-core/src/identifiers.rs
// ============================================================================
// Module: Tripgrid Identifiers
// Description: Canonical opaque identifiers for tenants, users, and bookings.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the canonical string-based identifiers used throughout
//! Tripgrid. Identifiers are opaque and serialize as strings. Validation is
//! handled at the auth and data-plane boundaries rather than within these
//! simple wrappers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Tenant identifier that scopes every data-plane access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new tenant identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the identifier is empty (tenant unknown).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TenantId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Subject identifier projected from a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Sentinel subject used when no valid token was presented.
    pub const ANONYMOUS: &'static str = "anonymous";

    /// Creates a new user identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the anonymous sentinel subject.
    #[must_use]
    pub fn anonymous() -> Self {
        Self(Self::ANONYMOUS.to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the subject is the anonymous sentinel.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.0 == Self::ANONYMOUS
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Booking record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
    /// Creates a new booking identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for BookingId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BookingId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Tenant Tier
// ============================================================================

/// Tenant service tier carried in token claims.
///
/// Tiers are open-ended strings; `basic` is the default when the claim is
/// absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantTier(String);

impl TenantTier {
    /// Default tier assigned when the token carries no tier claim.
    pub const BASIC: &'static str = "basic";

    /// Creates a new tenant tier.
    #[must_use]
    pub fn new(tier: impl Into<String>) -> Self {
        Self(tier.into())
    }

    /// Returns the tier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TenantTier {
    fn default() -> Self {
        Self(Self::BASIC.to_string())
    }
}

impl fmt::Display for TenantTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TenantTier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::BookingId;
    use super::TenantId;
    use super::TenantTier;
    use super::UserId;

    #[test]
    fn tenant_id_round_trips_as_string() {
        let id = TenantId::new("ABC123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"ABC123\"");
        let back: TenantId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn anonymous_user_is_flagged() {
        assert!(UserId::anonymous().is_anonymous());
        assert!(!UserId::new("user1").is_anonymous());
    }

    #[test]
    fn tenant_tier_defaults_to_basic() {
        assert_eq!(TenantTier::default().as_str(), "basic");
    }

    #[test]
    fn booking_id_displays_inner_value() {
        assert_eq!(BookingId::new("bk-1").to_string(), "bk-1");
    }
}
