// tripgrid-mcp/src/credentials.rs
// ============================================================================
// Module: Tenant Credential Vendor
// Description: Short-lived credential vending via role assumption.
// Purpose: Bind each data-plane call to one tenant through a session tag.
// Dependencies: tripgrid-core, aws-sdk-sts, aws-config
// ============================================================================

//! ## Overview
//! The vendor assumes the configured downstream role with exactly one session
//! tag, `tenantId=<value>`. Data-plane policies reference that tag as the
//! required leading key for partitioned reads and writes, so the vended
//! identity cannot cross tenants. Credentials are vended per handler call and
//! never cached across requests; issuance failures surface to the caller and
//! are never retried with a different tenant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;
use std::time::SystemTime;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_sts::types::Tag;
use tripgrid_core::CredentialError;
use tripgrid_core::CredentialVendor;
use tripgrid_core::TenantCredentials;
use tripgrid_core::TenantId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Session tag key evaluated by downstream leading-key policies.
const TENANT_TAG_KEY: &str = "tenantId";
/// Maximum role session name length accepted by the credentials API.
const MAX_SESSION_NAME_LENGTH: usize = 64;

// ============================================================================
// SECTION: Vendor
// ============================================================================

/// Credential vendor backed by the platform short-lived-credentials API.
pub struct StsCredentialVendor {
    /// Role assumed for data-plane access.
    role_arn: String,
    /// Region for the credentials endpoint.
    region: String,
}

impl StsCredentialVendor {
    /// Creates a vendor for the given role and region.
    #[must_use]
    pub fn new(role_arn: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            role_arn: role_arn.into(),
            region: region.into(),
        }
    }

    /// Derives a session name from the tenant, within API constraints.
    fn session_name(tenant_id: &TenantId) -> String {
        let mut name = format!("tripgrid-{tenant_id}");
        name = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || "=,.@-".contains(c) { c } else { '-' })
            .collect();
        name.truncate(MAX_SESSION_NAME_LENGTH);
        name
    }
}

#[async_trait]
impl CredentialVendor for StsCredentialVendor {
    async fn vend(&self, tenant_id: &TenantId) -> Result<TenantCredentials, CredentialError> {
        if tenant_id.is_empty() {
            return Err(CredentialError::MissingTenant);
        }
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .load()
            .await;
        let client = aws_sdk_sts::Client::new(&shared_config);
        let tag = Tag::builder()
            .key(TENANT_TAG_KEY)
            .value(tenant_id.as_str())
            .build()
            .map_err(|err| CredentialError::Issuance(err.to_string()))?;
        let output = client
            .assume_role()
            .role_arn(&self.role_arn)
            .role_session_name(Self::session_name(tenant_id))
            .tags(tag)
            .send()
            .await
            .map_err(|err| CredentialError::Issuance(err.to_string()))?;
        let credentials = output
            .credentials()
            .ok_or_else(|| CredentialError::Issuance("response carried no credentials".to_string()))?;
        let expiry_secs = u64::try_from(credentials.expiration().secs())
            .map_err(|_| CredentialError::Issuance("credential expiry out of range".to_string()))?;
        Ok(TenantCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expires_at: SystemTime::UNIX_EPOCH + Duration::from_secs(expiry_secs),
            tenant_id: tenant_id.clone(),
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use tripgrid_core::TenantId;

    use super::StsCredentialVendor;

    #[test]
    fn session_name_is_sanitized_and_bounded() {
        let name = StsCredentialVendor::session_name(&TenantId::new("ABC 123/!"));
        assert_eq!(name, "tripgrid-ABC-123--");
        let long = StsCredentialVendor::session_name(&TenantId::new("t".repeat(100)));
        assert_eq!(long.len(), 64);
    }
}
