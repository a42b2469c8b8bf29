// tripgrid-mcp/src/resources.rs
// ============================================================================
// Module: Tenant Resources
// Description: Tenant-scoped travel policy resource backed by object storage.
// Purpose: Resolve travelpolicy:// URIs under vended tenant credentials.
// Dependencies: tripgrid-core, aws-sdk-s3, aws-config
// ============================================================================

//! ## Overview
//! The travel policy resource serves `travelpolicy://<tenant>/policy.md` from
//! the configured bucket at key `<tenant>/travel-policy.md`. The object client
//! is built per read from the vended credentials, so the bucket policy's
//! principal-tag condition scopes every request to one tenant prefix.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::config::BehaviorVersion;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::config::Region;
use tripgrid_core::CredentialVendor;
use tripgrid_core::TenantCredentials;
use tripgrid_core::TenantId;

use crate::auth::AuthContext;
use crate::registry::ResourceContent;
use crate::registry::ResourceDescriptor;
use crate::registry::ResourceHandler;
use crate::registry::ResourceRegistry;
use crate::registry::ToolError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// URI scheme served by the policy resource.
const POLICY_SCHEME: &str = "travelpolicy://";
/// Object key suffix under the tenant prefix.
const POLICY_OBJECT_NAME: &str = "travel-policy.md";
/// Maximum accepted policy document size in bytes.
const MAX_POLICY_BYTES: usize = 512 * 1024;

// ============================================================================
// SECTION: Policy Source Seam
// ============================================================================

/// Reader for tenant policy documents.
#[async_trait]
pub trait PolicySource: Send + Sync {
    /// Reads the policy document for a tenant.
    async fn read_policy(
        &self,
        credentials: &TenantCredentials,
        tenant_id: &TenantId,
    ) -> Result<String, ToolError>;
}

/// Object-store-backed policy source.
pub struct S3PolicySource {
    /// Bucket holding tenant policy documents.
    bucket: String,
    /// Bucket region.
    region: String,
}

impl S3PolicySource {
    /// Creates a policy source for the given bucket and region.
    #[must_use]
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
        }
    }
}

#[async_trait]
impl PolicySource for S3PolicySource {
    async fn read_policy(
        &self,
        credentials: &TenantCredentials,
        tenant_id: &TenantId,
    ) -> Result<String, ToolError> {
        let provider = Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            Some(credentials.session_token.clone()),
            Some(credentials.expires_at),
            "tripgrid-tenant-vendor",
        );
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(provider)
            .build();
        let client = aws_sdk_s3::Client::from_conf(config);
        let key = format!("{tenant_id}/{POLICY_OBJECT_NAME}");
        let output = client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|err| ToolError::Internal(format!("policy read failed: {err}")))?;
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|err| ToolError::Internal(format!("policy read failed: {err}")))?
            .into_bytes();
        if bytes.len() > MAX_POLICY_BYTES {
            return Err(ToolError::Internal(format!(
                "policy document exceeds {MAX_POLICY_BYTES} bytes"
            )));
        }
        String::from_utf8(bytes.to_vec())
            .map_err(|_| ToolError::Internal("policy document is not utf-8".to_string()))
    }
}

// ============================================================================
// SECTION: Resource Handler
// ============================================================================

/// Handler resolving the tenant policy URI.
struct TravelPolicyResource {
    /// Policy document reader.
    source: Arc<dyn PolicySource>,
    /// Tenant credential vendor.
    vendor: Arc<dyn CredentialVendor>,
}

#[async_trait]
impl ResourceHandler for TravelPolicyResource {
    async fn read(
        &self,
        uri: &str,
        context: &AuthContext,
    ) -> Result<ResourceContent, ToolError> {
        let expected = policy_uri(&context.tenant_id);
        // The URI encodes the tenant; a mismatch is indistinguishable from
        // an unknown resource to avoid leaking other tenants' URIs.
        if uri != expected {
            return Err(ToolError::ResourceNotFound(uri.to_string()));
        }
        let credentials = self
            .vendor
            .vend(&context.tenant_id)
            .await
            .map_err(|err| ToolError::Internal(err.to_string()))?;
        let text = self.source.read_policy(&credentials, &context.tenant_id).await?;
        Ok(ResourceContent {
            uri: uri.to_string(),
            mime_type: "text/markdown".to_string(),
            text,
        })
    }
}

/// Returns the policy URI for a tenant.
#[must_use]
pub fn policy_uri(tenant_id: &TenantId) -> String {
    format!("{POLICY_SCHEME}{tenant_id}/policy.md")
}

/// Builds the resource registry visible to the given caller.
///
/// # Errors
///
/// Returns [`ToolError::Duplicate`] when two descriptors share a URI.
pub fn build_resource_registry(
    context: &AuthContext,
    source: Option<&Arc<dyn PolicySource>>,
    vendor: Option<&Arc<dyn CredentialVendor>>,
) -> Result<ResourceRegistry, ToolError> {
    let mut registry = ResourceRegistry::new();
    if !context.verified || context.tenant_id.is_empty() {
        return Ok(registry);
    }
    if let (Some(source), Some(vendor)) = (source, vendor) {
        registry.register(ResourceDescriptor {
            name: "travel-policy".to_string(),
            uri: policy_uri(&context.tenant_id),
            description: "Tenant travel policy document".to_string(),
            mime_type: "text/markdown".to_string(),
            handler: Arc::new(TravelPolicyResource {
                source: Arc::clone(source),
                vendor: Arc::clone(vendor),
            }),
        })?;
    }
    Ok(registry)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
