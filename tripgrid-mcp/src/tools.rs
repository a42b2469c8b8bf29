// tripgrid-mcp/src/tools.rs
// ============================================================================
// Module: Tool Handlers
// Description: whoami, travel domain tools, and prompt fallback tools.
// Purpose: Build the per-request tool registry and execute tool calls.
// Dependencies: tripgrid-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Tool handlers are thin wrappers: they decode validated arguments, vend
//! tenant credentials where the data plane is involved, call the
//! [`TravelStore`], and wrap the outcome into a [`ToolResult`]. Business
//! failures (booking declined, nothing found) stay inside the result with
//! `is_error` set; only infrastructure faults become [`ToolError::Internal`].
//!
//! The `whoami` tool is the one public tool: it reports the caller's claims
//! and the verifier's trust decision from the [`AuthInfo`] sidecar, so it
//! works for every caller including anonymous ones.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use tripgrid_core::Booking;
use tripgrid_core::BookingKind;
use tripgrid_core::BookingStatus;
use tripgrid_core::CredentialVendor;
use tripgrid_core::HotelQuery;
use tripgrid_core::PromptCatalog;
use tripgrid_core::ToolResult;
use tripgrid_core::TravelStore;
use tripgrid_core::TravelStoreError;

use crate::auth::AuthContext;
use crate::auth::AuthInfo;
use crate::registry::ToolDescriptor;
use crate::registry::ToolError;
use crate::registry::ToolHandler;
use crate::registry::ToolRegistry;
use crate::registry::ToolVisibility;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name of the always-available identity tool.
pub const WHOAMI_TOOL: &str = "whoami";
/// Tool names callable without a verified token.
pub const PUBLIC_TOOLS: &[&str] = &[WHOAMI_TOOL];

/// Returns true when the tool name is callable without verification.
#[must_use]
pub fn is_public_tool(name: &str) -> bool {
    PUBLIC_TOOLS.contains(&name)
}

// ============================================================================
// SECTION: Dependencies
// ============================================================================

/// Handler dependencies shared across requests.
#[derive(Clone)]
pub struct ToolDeps {
    /// Travel data store; absent when the data plane is unbound.
    pub store: Option<Arc<dyn TravelStore>>,
    /// Tenant credential vendor; absent when the data plane is unbound.
    pub vendor: Option<Arc<dyn CredentialVendor>>,
    /// Immutable prompt catalog.
    pub prompts: Arc<PromptCatalog>,
}

/// Builds the tool registry visible to the given caller.
///
/// Registration order is irrelevant; the registry enforces name uniqueness
/// and a duplicate here is a programming error surfaced at request time.
///
/// # Errors
///
/// Returns [`ToolError::Duplicate`] when two descriptors share a name.
pub fn build_tool_registry(
    context: &AuthContext,
    deps: &ToolDeps,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(whoami_descriptor())?;
    if !context.verified {
        return Ok(registry);
    }
    if let (Some(store), Some(vendor)) = (&deps.store, &deps.vendor) {
        registry.register(list_bookings_descriptor(store, vendor))?;
        registry.register(find_hotels_descriptor(store, vendor))?;
        registry.register(book_hotel_descriptor(store, vendor))?;
        registry.register(loyalty_info_descriptor(store, vendor))?;
    }
    registry.register(list_prompts_descriptor(&deps.prompts))?;
    registry.register(get_prompt_descriptor(&deps.prompts))?;
    Ok(registry)
}

// ============================================================================
// SECTION: whoami
// ============================================================================

/// Identity report returned by the `whoami` tool.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WhoamiReport {
    /// True iff the verifier accepted signature, issuer, and audience.
    authenticated: bool,
    /// Projected caller identity.
    user_info: WhoamiUserInfo,
    /// Raw token state as seen by the verifier.
    token_info: WhoamiTokenInfo,
}

/// Projected identity section of the whoami report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WhoamiUserInfo {
    /// Subject identifier.
    user_id: String,
    /// Tenant identifier; empty when unknown.
    tenant_id: String,
    /// Tenant service tier.
    tenant_tier: String,
}

/// Token state section of the whoami report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WhoamiTokenInfo {
    /// Whether any bearer token was presented.
    present: bool,
    /// Whether the token carried no usable signature.
    is_unsigned: bool,
    /// Verifier classification reason, absent on the clean signed path.
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    /// Full decoded claim set.
    claims: Value,
}

/// The always-available identity tool.
struct WhoamiTool;

#[async_trait]
impl ToolHandler for WhoamiTool {
    async fn call(
        &self,
        _arguments: Value,
        context: &AuthContext,
        info: &AuthInfo,
    ) -> Result<ToolResult, ToolError> {
        let report = WhoamiReport {
            authenticated: context.verified,
            user_info: WhoamiUserInfo {
                user_id: context.user_id.to_string(),
                tenant_id: context.tenant_id.to_string(),
                tenant_tier: context.tenant_tier.to_string(),
            },
            token_info: WhoamiTokenInfo {
                present: !info.token.is_empty(),
                is_unsigned: info.reason == Some(crate::auth::AuthReason::Unsigned),
                reason: info.reason.map(crate::auth::AuthReason::as_str),
                claims: Value::Object(context.claims.clone()),
            },
        };
        let value = serde_json::to_value(&report).map_err(|_| ToolError::Serialization)?;
        Ok(ToolResult::json(&value))
    }
}

fn whoami_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: WHOAMI_TOOL.to_string(),
        description: "Report the caller's identity, tenant, and token trust state".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
        visibility: ToolVisibility::Public,
        handler: Arc::new(WhoamiTool),
    }
}

// ============================================================================
// SECTION: Travel Tools
// ============================================================================

/// Shared plumbing for tools that reach the tenant data plane.
struct TravelToolDeps {
    /// Travel data store.
    store: Arc<dyn TravelStore>,
    /// Tenant credential vendor.
    vendor: Arc<dyn CredentialVendor>,
}

impl TravelToolDeps {
    /// Vends credentials for the caller's tenant.
    async fn credentials(
        &self,
        context: &AuthContext,
    ) -> Result<tripgrid_core::TenantCredentials, ToolError> {
        self.vendor
            .vend(&context.tenant_id)
            .await
            .map_err(|err| ToolError::Internal(err.to_string()))
    }
}

/// Maps a store failure to the tool response channel.
///
/// Access and validation problems are business outcomes; backend faults are
/// infrastructure errors.
fn store_failure(err: &TravelStoreError) -> Result<ToolResult, ToolError> {
    match err {
        TravelStoreError::NotFound(message) | TravelStoreError::Invalid(message) => {
            Ok(ToolResult::error(message.clone()))
        }
        TravelStoreError::AccessDenied(message) => {
            Ok(ToolResult::error(format!("access denied: {message}")))
        }
        TravelStoreError::Backend(message) => Err(ToolError::Internal(message.clone())),
    }
}

/// Arguments of the `list_bookings` tool.
#[derive(Debug, Deserialize)]
struct ListBookingsArgs {
    /// Optional status filter.
    status: Option<BookingStatus>,
}

/// Lists the caller's bookings within the tenant partition.
struct ListBookingsTool {
    /// Data-plane plumbing.
    deps: TravelToolDeps,
}

#[async_trait]
impl ToolHandler for ListBookingsTool {
    async fn call(
        &self,
        arguments: Value,
        context: &AuthContext,
        _info: &AuthInfo,
    ) -> Result<ToolResult, ToolError> {
        let args = decode::<ListBookingsArgs>(arguments)?;
        let credentials = self.deps.credentials(context).await?;
        match self
            .deps
            .store
            .list_bookings(&credentials, &context.tenant_id, &context.user_id)
            .await
        {
            Ok(bookings) => {
                let bookings: Vec<&Booking> = bookings
                    .iter()
                    .filter(|booking| {
                        args.status.map_or(true, |status| booking.status == status)
                    })
                    .collect();
                let value = serde_json::to_value(&bookings)
                    .map_err(|_| ToolError::Serialization)?;
                Ok(ToolResult::json(&json!({ "bookings": value })))
            }
            Err(err) => store_failure(&err),
        }
    }
}

fn list_bookings_descriptor(
    store: &Arc<dyn TravelStore>,
    vendor: &Arc<dyn CredentialVendor>,
) -> ToolDescriptor {
    ToolDescriptor {
        name: "list_bookings".to_string(),
        description: "List the caller's travel bookings".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "enum": ["confirmed", "pending", "cancelled"],
                    "description": "Optional status filter"
                }
            },
            "additionalProperties": false
        }),
        visibility: ToolVisibility::Authenticated,
        handler: Arc::new(ListBookingsTool {
            deps: TravelToolDeps {
                store: Arc::clone(store),
                vendor: Arc::clone(vendor),
            },
        }),
    }
}

/// Arguments of the `find_hotels` tool.
#[derive(Debug, Deserialize)]
struct FindHotelsArgs {
    /// Destination city.
    city: String,
    /// Check-in date (YYYY-MM-DD).
    check_in: String,
    /// Check-out date (YYYY-MM-DD).
    check_out: String,
    /// Number of guests.
    guests: u8,
}

/// Searches hotel availability for the caller's tenant.
struct FindHotelsTool {
    /// Data-plane plumbing.
    deps: TravelToolDeps,
}

#[async_trait]
impl ToolHandler for FindHotelsTool {
    async fn call(
        &self,
        arguments: Value,
        context: &AuthContext,
        _info: &AuthInfo,
    ) -> Result<ToolResult, ToolError> {
        let args = decode::<FindHotelsArgs>(arguments)?;
        let credentials = self.deps.credentials(context).await?;
        let query = HotelQuery {
            city: args.city,
            check_in: args.check_in,
            check_out: args.check_out,
            guests: args.guests,
        };
        match self.deps.store.find_hotels(&credentials, &query).await {
            Ok(offers) if offers.is_empty() => {
                Ok(ToolResult::error(format!("no hotels available in {}", query.city)))
            }
            Ok(offers) => {
                let value =
                    serde_json::to_value(&offers).map_err(|_| ToolError::Serialization)?;
                Ok(ToolResult::json(&json!({ "offers": value })))
            }
            Err(err) => store_failure(&err),
        }
    }
}

fn find_hotels_descriptor(
    store: &Arc<dyn TravelStore>,
    vendor: &Arc<dyn CredentialVendor>,
) -> ToolDescriptor {
    ToolDescriptor {
        name: "find_hotels".to_string(),
        description: "Search hotel availability for a city and date range".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "city": { "type": "string", "minLength": 1 },
                "check_in": { "type": "string", "format": "date" },
                "check_out": { "type": "string", "format": "date" },
                "guests": { "type": "integer", "minimum": 1, "maximum": 8 }
            },
            "required": ["city", "check_in", "check_out", "guests"],
            "additionalProperties": false
        }),
        visibility: ToolVisibility::Authenticated,
        handler: Arc::new(FindHotelsTool {
            deps: TravelToolDeps {
                store: Arc::clone(store),
                vendor: Arc::clone(vendor),
            },
        }),
    }
}

/// Arguments of the `book_hotel` tool.
#[derive(Debug, Deserialize)]
struct BookHotelArgs {
    /// Offer identifier from a prior `find_hotels` call.
    offer_id: String,
    /// Destination city.
    city: String,
    /// Check-in date (YYYY-MM-DD).
    check_in: String,
    /// Check-out date (YYYY-MM-DD).
    check_out: String,
    /// Total amount in USD.
    amount_usd: f64,
}

/// Books a hotel offer for the caller.
struct BookHotelTool {
    /// Data-plane plumbing.
    deps: TravelToolDeps,
}

#[async_trait]
impl ToolHandler for BookHotelTool {
    async fn call(
        &self,
        arguments: Value,
        context: &AuthContext,
        _info: &AuthInfo,
    ) -> Result<ToolResult, ToolError> {
        let args = decode::<BookHotelArgs>(arguments)?;
        if args.amount_usd <= 0.0 {
            return Ok(ToolResult::error("booking declined: amount must be positive"));
        }
        let credentials = self.deps.credentials(context).await?;
        let booking = Booking {
            booking_id: new_booking_id(&args.offer_id),
            tenant_id: context.tenant_id.clone(),
            user_id: context.user_id.clone(),
            kind: BookingKind::Hotel,
            status: BookingStatus::Confirmed,
            city: args.city,
            check_in: args.check_in,
            check_out: args.check_out,
            amount_usd: args.amount_usd,
        };
        match self.deps.store.put_booking(&credentials, &booking).await {
            Ok(()) => {
                let value =
                    serde_json::to_value(&booking).map_err(|_| ToolError::Serialization)?;
                Ok(ToolResult::json(&json!({ "booking": value })))
            }
            Err(err) => store_failure(&err),
        }
    }
}

fn book_hotel_descriptor(
    store: &Arc<dyn TravelStore>,
    vendor: &Arc<dyn CredentialVendor>,
) -> ToolDescriptor {
    ToolDescriptor {
        name: "book_hotel".to_string(),
        description: "Book a hotel offer for the caller".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "offer_id": { "type": "string", "minLength": 1 },
                "city": { "type": "string", "minLength": 1 },
                "check_in": { "type": "string", "format": "date" },
                "check_out": { "type": "string", "format": "date" },
                "amount_usd": { "type": "number", "minimum": 0 }
            },
            "required": ["offer_id", "city", "check_in", "check_out", "amount_usd"],
            "additionalProperties": false
        }),
        visibility: ToolVisibility::Authenticated,
        handler: Arc::new(BookHotelTool {
            deps: TravelToolDeps {
                store: Arc::clone(store),
                vendor: Arc::clone(vendor),
            },
        }),
    }
}

/// Reports the caller's loyalty profile.
struct LoyaltyInfoTool {
    /// Data-plane plumbing.
    deps: TravelToolDeps,
}

#[async_trait]
impl ToolHandler for LoyaltyInfoTool {
    async fn call(
        &self,
        _arguments: Value,
        context: &AuthContext,
        _info: &AuthInfo,
    ) -> Result<ToolResult, ToolError> {
        let credentials = self.deps.credentials(context).await?;
        match self
            .deps
            .store
            .loyalty_profile(&credentials, &context.tenant_id, &context.user_id)
            .await
        {
            Ok(profile) => {
                let value =
                    serde_json::to_value(&profile).map_err(|_| ToolError::Serialization)?;
                Ok(ToolResult::json(&value))
            }
            Err(err) => store_failure(&err),
        }
    }
}

fn loyalty_info_descriptor(
    store: &Arc<dyn TravelStore>,
    vendor: &Arc<dyn CredentialVendor>,
) -> ToolDescriptor {
    ToolDescriptor {
        name: "loyalty_info".to_string(),
        description: "Report the caller's loyalty tier and points balance".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
        visibility: ToolVisibility::Authenticated,
        handler: Arc::new(LoyaltyInfoTool {
            deps: TravelToolDeps {
                store: Arc::clone(store),
                vendor: Arc::clone(vendor),
            },
        }),
    }
}

// ============================================================================
// SECTION: Prompt Fallback Tools
// ============================================================================

/// Lists the prompt catalog; mirrors `prompts/list` for clients without
/// prompt support.
struct ListPromptsTool {
    /// Immutable prompt catalog.
    prompts: Arc<PromptCatalog>,
}

#[async_trait]
impl ToolHandler for ListPromptsTool {
    async fn call(
        &self,
        _arguments: Value,
        _context: &AuthContext,
        _info: &AuthInfo,
    ) -> Result<ToolResult, ToolError> {
        let listing = crate::prompt_methods::prompt_listing(&self.prompts);
        let value = serde_json::to_value(&listing).map_err(|_| ToolError::Serialization)?;
        Ok(ToolResult::json(&json!({ "prompts": value })))
    }
}

fn list_prompts_descriptor(prompts: &Arc<PromptCatalog>) -> ToolDescriptor {
    ToolDescriptor {
        name: "list_prompts".to_string(),
        description: "List available prompt templates".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
        visibility: ToolVisibility::Authenticated,
        handler: Arc::new(ListPromptsTool {
            prompts: Arc::clone(prompts),
        }),
    }
}

/// Arguments of the `get_prompt` tool.
#[derive(Debug, Deserialize)]
struct GetPromptArgs {
    /// Prompt name.
    name: String,
    /// Prompt arguments.
    #[serde(default)]
    arguments: BTreeMap<String, String>,
}

/// Renders a prompt; mirrors `prompts/get` for clients without prompt
/// support.
struct GetPromptTool {
    /// Immutable prompt catalog.
    prompts: Arc<PromptCatalog>,
}

#[async_trait]
impl ToolHandler for GetPromptTool {
    async fn call(
        &self,
        arguments: Value,
        _context: &AuthContext,
        _info: &AuthInfo,
    ) -> Result<ToolResult, ToolError> {
        let args = decode::<GetPromptArgs>(arguments)?;
        match crate::prompt_methods::rendered_prompt(&self.prompts, &args.name, &args.arguments)
        {
            Ok(result) => {
                let value =
                    serde_json::to_value(&result).map_err(|_| ToolError::Serialization)?;
                Ok(ToolResult::json(&value))
            }
            Err(err) => Ok(ToolResult::error(err.to_string())),
        }
    }
}

fn get_prompt_descriptor(prompts: &Arc<PromptCatalog>) -> ToolDescriptor {
    ToolDescriptor {
        name: "get_prompt".to_string(),
        description: "Render a prompt template with arguments".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "minLength": 1 },
                "arguments": {
                    "type": "object",
                    "additionalProperties": { "type": "string" }
                }
            },
            "required": ["name"],
            "additionalProperties": false
        }),
        visibility: ToolVisibility::Authenticated,
        handler: Arc::new(GetPromptTool {
            prompts: Arc::clone(prompts),
        }),
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Decodes a JSON value into a typed argument payload.
fn decode<T: for<'de> Deserialize<'de>>(payload: Value) -> Result<T, ToolError> {
    serde_json::from_value(payload).map_err(|err| ToolError::InvalidParams(err.to_string()))
}

/// Derives a booking identifier from the offer and the wall clock.
fn new_booking_id(offer_id: &str) -> tripgrid_core::BookingId {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis());
    tripgrid_core::BookingId::new(format!("bk-{offer_id}-{millis}"))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use std::sync::Arc;

    use serde_json::Value;
    use serde_json::json;
    use tripgrid_core::InMemoryTravelStore;
    use tripgrid_core::PromptCatalog;
    use tripgrid_core::StaticCredentialVendor;
    use tripgrid_core::TenantId;
    use tripgrid_core::TenantTier;
    use tripgrid_core::ToolContent;
    use tripgrid_core::UserId;

    use super::ToolDeps;
    use super::build_tool_registry;
    use super::is_public_tool;
    use crate::auth::AuthContext;
    use crate::auth::AuthInfo;
    use crate::auth::AuthReason;

    fn deps() -> ToolDeps {
        ToolDeps {
            store: Some(Arc::new(InMemoryTravelStore::new())),
            vendor: Some(Arc::new(StaticCredentialVendor)),
            prompts: Arc::new(PromptCatalog::travel()),
        }
    }

    fn verified_context(tenant: &str) -> AuthContext {
        AuthContext {
            user_id: UserId::new("user1"),
            tenant_id: TenantId::new(tenant),
            tenant_tier: TenantTier::default(),
            token: "token".to_string(),
            claims: serde_json::Map::new(),
            verified: true,
        }
    }

    fn result_text(result: &tripgrid_core::ToolResult) -> Value {
        let ToolContent::Text {
            text,
        } = &result.content[0]
        else {
            panic!("expected text content");
        };
        serde_json::from_str(text).expect("json payload")
    }

    #[test]
    fn anonymous_registry_contains_only_whoami() {
        let registry =
            build_tool_registry(&AuthContext::anonymous(), &deps()).expect("registry");
        assert_eq!(registry.names(), vec!["whoami"]);
    }

    #[test]
    fn verified_registry_contains_domain_tools() {
        let registry =
            build_tool_registry(&verified_context("ABC123"), &deps()).expect("registry");
        let names = registry.names();
        for expected in
            ["whoami", "list_bookings", "find_hotels", "book_hotel", "loyalty_info", "get_prompt"]
        {
            assert!(names.contains(&expected), "missing tool {expected}");
        }
    }

    #[test]
    fn whoami_is_the_only_public_tool() {
        assert!(is_public_tool("whoami"));
        assert!(!is_public_tool("list_bookings"));
    }

    #[tokio::test]
    async fn whoami_reports_anonymous_state() {
        let registry =
            build_tool_registry(&AuthContext::anonymous(), &deps()).expect("registry");
        let tool = registry.get("whoami").expect("whoami");
        let info = AuthInfo {
            token: String::new(),
            reason: Some(AuthReason::Missing),
        };
        let result = tool
            .handler
            .call(json!({}), &AuthContext::anonymous(), &info)
            .await
            .expect("result");
        let report = result_text(&result);
        assert_eq!(report["authenticated"], json!(false));
        assert_eq!(report["tokenInfo"]["present"], json!(false));
        assert_eq!(report["userInfo"]["userId"], json!("anonymous"));
    }

    #[tokio::test]
    async fn whoami_reports_unsigned_token_claims() {
        let mut claims = serde_json::Map::new();
        claims.insert("sub".to_string(), json!("user1"));
        claims.insert("custom:tenantId".to_string(), json!("ABC123"));
        let context = AuthContext {
            user_id: UserId::new("user1"),
            tenant_id: TenantId::new("ABC123"),
            tenant_tier: TenantTier::default(),
            token: "unsigned-token".to_string(),
            claims,
            verified: false,
        };
        let registry = build_tool_registry(&context, &deps()).expect("registry");
        let tool = registry.get("whoami").expect("whoami");
        let info = AuthInfo {
            token: "unsigned-token".to_string(),
            reason: Some(AuthReason::Unsigned),
        };
        let result = tool.handler.call(json!({}), &context, &info).await.expect("result");
        let report = result_text(&result);
        assert_eq!(report["authenticated"], json!(false));
        assert_eq!(report["userInfo"]["tenantId"], json!("ABC123"));
        assert_eq!(report["tokenInfo"]["isUnsigned"], json!(true));
    }

    #[tokio::test]
    async fn book_then_list_round_trips_through_store() {
        let deps = deps();
        let context = verified_context("ABC123");
        let registry = build_tool_registry(&context, &deps).expect("registry");
        let info = AuthInfo {
            token: "token".to_string(),
            reason: None,
        };
        let book = registry.get("book_hotel").expect("book_hotel");
        let result = book
            .handler
            .call(
                json!({
                    "offer_id": "lis-alma-01",
                    "city": "Lisbon",
                    "check_in": "2025-05-01",
                    "check_out": "2025-05-08",
                    "amount_usd": 1260.0
                }),
                &context,
                &info,
            )
            .await
            .expect("booking result");
        assert!(!result.is_error);

        let list = registry.get("list_bookings").expect("list_bookings");
        let result = list.handler.call(json!({}), &context, &info).await.expect("list result");
        let payload = result_text(&result);
        let bookings = payload["bookings"].as_array().expect("bookings array");
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0]["city"], json!("Lisbon"));
    }

    #[tokio::test]
    async fn zero_amount_booking_is_declined_as_business_error() {
        let deps = deps();
        let context = verified_context("ABC123");
        let registry = build_tool_registry(&context, &deps).expect("registry");
        let info = AuthInfo {
            token: "token".to_string(),
            reason: None,
        };
        let book = registry.get("book_hotel").expect("book_hotel");
        let result = book
            .handler
            .call(
                json!({
                    "offer_id": "lis-alma-01",
                    "city": "Lisbon",
                    "check_in": "2025-05-01",
                    "check_out": "2025-05-08",
                    "amount_usd": 0.0
                }),
                &context,
                &info,
            )
            .await
            .expect("result");
        assert!(result.is_error);
    }
}
