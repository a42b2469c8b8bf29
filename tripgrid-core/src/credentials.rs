// tripgrid-core/src/credentials.rs
// ============================================================================
// Module: Tenant Credentials
// Description: Short-lived tenant-scoped credential types and vendor seam.
// Purpose: Carry the vended identity that constrains data-plane access.
// Dependencies: serde, thiserror, async-trait
// ============================================================================

//! ## Overview
//! Every data-plane call acts under short-lived credentials vended for the
//! caller's tenant. The credentials carry a session tag encoding the tenant
//! identifier; downstream policies reference that tag as the required leading
//! key, so the identity cannot cross tenants by construction. Credentials are
//! vended per handler call and never cached across requests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;

use async_trait::async_trait;
use thiserror::Error;

use crate::identifiers::TenantId;

// ============================================================================
// SECTION: Credential Types
// ============================================================================

/// Short-lived credentials scoped to a single tenant.
#[derive(Debug, Clone)]
pub struct TenantCredentials {
    /// Access key identifier.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Session token carrying the tenant session tag.
    pub session_token: String,
    /// Expiry instant of the credentials.
    pub expires_at: SystemTime,
    /// Tenant the credentials were vended for.
    pub tenant_id: TenantId,
}

impl TenantCredentials {
    /// Returns true when the credentials have expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Credential vending errors.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Tenant identifier was missing or empty.
    #[error("tenant id required for credential vending")]
    MissingTenant,
    /// The vendor is not configured for this deployment.
    #[error("credential vendor not configured: {0}")]
    NotConfigured(String),
    /// The downstream credentials API failed.
    #[error("credential issuance failed: {0}")]
    Issuance(String),
}

// ============================================================================
// SECTION: Vendor Seam
// ============================================================================

/// Vendor of short-lived tenant-scoped credentials.
#[async_trait]
pub trait CredentialVendor: Send + Sync {
    /// Vends credentials for the given tenant, valid for one handler call.
    async fn vend(&self, tenant_id: &TenantId) -> Result<TenantCredentials, CredentialError>;
}

/// Vendor returning fixed marker credentials for local development and tests.
pub struct StaticCredentialVendor;

#[async_trait]
impl CredentialVendor for StaticCredentialVendor {
    async fn vend(&self, tenant_id: &TenantId) -> Result<TenantCredentials, CredentialError> {
        if tenant_id.is_empty() {
            return Err(CredentialError::MissingTenant);
        }
        Ok(TenantCredentials {
            access_key_id: "STATIC".to_string(),
            secret_access_key: "STATIC".to_string(),
            session_token: format!("tenantId={tenant_id}"),
            expires_at: SystemTime::now() + std::time::Duration::from_secs(900),
            tenant_id: tenant_id.clone(),
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use super::CredentialError;
    use super::CredentialVendor;
    use super::StaticCredentialVendor;
    use crate::identifiers::TenantId;

    #[tokio::test]
    async fn static_vendor_tags_session_with_tenant() {
        let creds =
            StaticCredentialVendor.vend(&TenantId::new("ABC123")).await.expect("credentials");
        assert!(creds.session_token.contains("ABC123"));
        assert!(!creds.is_expired());
    }

    #[tokio::test]
    async fn static_vendor_rejects_empty_tenant() {
        let result = StaticCredentialVendor.vend(&TenantId::new("")).await;
        assert!(matches!(result, Err(CredentialError::MissingTenant)));
    }
}
