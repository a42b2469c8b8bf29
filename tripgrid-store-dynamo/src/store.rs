// tripgrid-store-dynamo/src/store.rs
// ============================================================================
// Module: DynamoDB Store Implementation
// Description: Item mapping and per-call client construction.
// Purpose: Query one tenant partition under vended credentials only.
// Dependencies: tripgrid-core, aws-sdk-dynamodb
// ============================================================================

//! ## Overview
//! Table layout: partition key `tenantId` (string), sort key `recordId`
//! (string) with prefixes `BOOKING#`, `HOTEL#<city>#`, and `LOYALTY#<user>`.
//! The client is rebuilt per call from the vended credentials; caching a
//! client would outlive the credential expiry and bypass the session tag.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::BehaviorVersion;
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::ProvideErrorMetadata;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::types::AttributeValue;
use tripgrid_core::Booking;
use tripgrid_core::BookingId;
use tripgrid_core::BookingKind;
use tripgrid_core::BookingStatus;
use tripgrid_core::HotelOffer;
use tripgrid_core::HotelQuery;
use tripgrid_core::LoyaltyProfile;
use tripgrid_core::TenantCredentials;
use tripgrid_core::TenantId;
use tripgrid_core::TravelStore;
use tripgrid_core::TravelStoreError;
use tripgrid_core::UserId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Partition key attribute name.
const ATTR_TENANT_ID: &str = "tenantId";
/// Sort key attribute name.
const ATTR_RECORD_ID: &str = "recordId";
/// Sort key prefix for booking records.
const BOOKING_PREFIX: &str = "BOOKING#";
/// Sort key prefix for hotel inventory records.
const HOTEL_PREFIX: &str = "HOTEL#";
/// Sort key prefix for loyalty profiles.
const LOYALTY_PREFIX: &str = "LOYALTY#";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// DynamoDB store configuration.
#[derive(Debug, Clone)]
pub struct DynamoStoreConfig {
    /// Booking table name.
    pub table_name: String,
    /// AWS region of the table.
    pub region: String,
    /// Optional endpoint override for local testing.
    pub endpoint_url: Option<String>,
}

/// DynamoDB-backed travel store.
#[derive(Debug, Clone)]
pub struct DynamoTravelStore {
    /// Store configuration.
    config: DynamoStoreConfig,
}

impl DynamoTravelStore {
    /// Creates a new DynamoDB travel store.
    #[must_use]
    pub fn new(config: DynamoStoreConfig) -> Self {
        Self {
            config,
        }
    }

    /// Builds a client bound to the vended tenant credentials.
    fn client(&self, credentials: &TenantCredentials) -> Client {
        let provider = Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            Some(credentials.session_token.clone()),
            Some(credentials.expires_at),
            "tripgrid-tenant-vendor",
        );
        let mut builder = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.config.region.clone()))
            .credentials_provider(provider);
        if let Some(endpoint) = &self.config.endpoint_url {
            builder = builder.endpoint_url(endpoint.clone());
        }
        Client::from_conf(builder.build())
    }

    /// Queries one tenant partition by sort key prefix.
    async fn query_prefix(
        &self,
        credentials: &TenantCredentials,
        tenant_id: &TenantId,
        prefix: &str,
    ) -> Result<Vec<HashMap<String, AttributeValue>>, TravelStoreError> {
        let output = self
            .client(credentials)
            .query()
            .table_name(&self.config.table_name)
            .key_condition_expression("#t = :tenant AND begins_with(#r, :prefix)")
            .expression_attribute_names("#t", ATTR_TENANT_ID)
            .expression_attribute_names("#r", ATTR_RECORD_ID)
            .expression_attribute_values(":tenant", AttributeValue::S(tenant_id.to_string()))
            .expression_attribute_values(":prefix", AttributeValue::S(prefix.to_string()))
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(output.items().to_vec())
    }
}

// ============================================================================
// SECTION: Store Implementation
// ============================================================================

#[async_trait]
impl TravelStore for DynamoTravelStore {
    async fn list_bookings(
        &self,
        credentials: &TenantCredentials,
        tenant_id: &TenantId,
        user_id: &UserId,
    ) -> Result<Vec<Booking>, TravelStoreError> {
        let items = self.query_prefix(credentials, tenant_id, BOOKING_PREFIX).await?;
        let mut bookings = Vec::with_capacity(items.len());
        for item in &items {
            let booking = item_to_booking(item)?;
            if booking.user_id == *user_id {
                bookings.push(booking);
            }
        }
        Ok(bookings)
    }

    async fn put_booking(
        &self,
        credentials: &TenantCredentials,
        booking: &Booking,
    ) -> Result<(), TravelStoreError> {
        self.client(credentials)
            .put_item()
            .table_name(&self.config.table_name)
            .set_item(Some(booking_to_item(booking)))
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn find_hotels(
        &self,
        credentials: &TenantCredentials,
        query: &HotelQuery,
    ) -> Result<Vec<HotelOffer>, TravelStoreError> {
        if query.city.is_empty() {
            return Err(TravelStoreError::Invalid("city must not be empty".to_string()));
        }
        let prefix = format!("{HOTEL_PREFIX}{}#", query.city.to_ascii_lowercase());
        let items =
            self.query_prefix(credentials, &credentials.tenant_id, &prefix).await?;
        items.iter().map(item_to_offer).collect()
    }

    async fn loyalty_profile(
        &self,
        credentials: &TenantCredentials,
        tenant_id: &TenantId,
        user_id: &UserId,
    ) -> Result<LoyaltyProfile, TravelStoreError> {
        let output = self
            .client(credentials)
            .get_item()
            .table_name(&self.config.table_name)
            .key(ATTR_TENANT_ID, AttributeValue::S(tenant_id.to_string()))
            .key(ATTR_RECORD_ID, AttributeValue::S(format!("{LOYALTY_PREFIX}{user_id}")))
            .send()
            .await
            .map_err(map_sdk_error)?;
        match output.item() {
            Some(item) => item_to_loyalty(item, tenant_id, user_id),
            // Absent profile means the user has not accrued anything yet.
            None => Ok(LoyaltyProfile {
                tenant_id: tenant_id.clone(),
                user_id: user_id.clone(),
                tier: "member".to_string(),
                points: 0,
            }),
        }
    }
}

// ============================================================================
// SECTION: Item Mapping
// ============================================================================

/// Maps an SDK failure to a store error, preserving access denials.
///
/// An access denial here means the vended credentials did not satisfy the
/// table's leading-key condition; that is a tenant-isolation outcome, not an
/// infrastructure fault.
fn map_sdk_error<E, R>(err: SdkError<E, R>) -> TravelStoreError
where
    E: ProvideErrorMetadata,
{
    let code = err.code().map(str::to_string);
    let detail = err
        .message()
        .map(str::to_string)
        .or_else(|| code.clone())
        .unwrap_or_else(|| "request failed".to_string());
    if code.as_deref() == Some("AccessDeniedException") {
        return TravelStoreError::AccessDenied(detail);
    }
    TravelStoreError::Backend(detail)
}

/// Converts a booking record to a DynamoDB item.
fn booking_to_item(booking: &Booking) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();
    item.insert(ATTR_TENANT_ID.to_string(), AttributeValue::S(booking.tenant_id.to_string()));
    item.insert(
        ATTR_RECORD_ID.to_string(),
        AttributeValue::S(format!("{BOOKING_PREFIX}{}", booking.booking_id)),
    );
    item.insert("userId".to_string(), AttributeValue::S(booking.user_id.to_string()));
    item.insert("kind".to_string(), AttributeValue::S(kind_label(booking.kind).to_string()));
    item.insert(
        "status".to_string(),
        AttributeValue::S(status_label(booking.status).to_string()),
    );
    item.insert("city".to_string(), AttributeValue::S(booking.city.clone()));
    item.insert("checkIn".to_string(), AttributeValue::S(booking.check_in.clone()));
    item.insert("checkOut".to_string(), AttributeValue::S(booking.check_out.clone()));
    item.insert("amountUsd".to_string(), AttributeValue::N(booking.amount_usd.to_string()));
    item
}

/// Converts a DynamoDB item to a booking record.
fn item_to_booking(item: &HashMap<String, AttributeValue>) -> Result<Booking, TravelStoreError> {
    let record_id = string_attr(item, ATTR_RECORD_ID)?;
    let booking_id = record_id
        .strip_prefix(BOOKING_PREFIX)
        .ok_or_else(|| TravelStoreError::Backend(format!("unexpected record id: {record_id}")))?;
    Ok(Booking {
        booking_id: BookingId::new(booking_id),
        tenant_id: TenantId::new(string_attr(item, ATTR_TENANT_ID)?),
        user_id: UserId::new(string_attr(item, "userId")?),
        kind: parse_kind(&string_attr(item, "kind")?)?,
        status: parse_status(&string_attr(item, "status")?)?,
        city: string_attr(item, "city")?,
        check_in: string_attr(item, "checkIn")?,
        check_out: string_attr(item, "checkOut")?,
        amount_usd: number_attr(item, "amountUsd")?,
    })
}

/// Converts a DynamoDB item to a hotel offer.
fn item_to_offer(item: &HashMap<String, AttributeValue>) -> Result<HotelOffer, TravelStoreError> {
    Ok(HotelOffer {
        offer_id: string_attr(item, "offerId")?,
        hotel_name: string_attr(item, "hotelName")?,
        city: string_attr(item, "city")?,
        nightly_rate_usd: number_attr(item, "nightlyRateUsd")?,
        rating: number_attr(item, "rating")? as u8,
    })
}

/// Converts a DynamoDB item to a loyalty profile.
fn item_to_loyalty(
    item: &HashMap<String, AttributeValue>,
    tenant_id: &TenantId,
    user_id: &UserId,
) -> Result<LoyaltyProfile, TravelStoreError> {
    Ok(LoyaltyProfile {
        tenant_id: tenant_id.clone(),
        user_id: user_id.clone(),
        tier: string_attr(item, "tier")?,
        points: number_attr(item, "points")? as u64,
    })
}

/// Reads a required string attribute.
fn string_attr(
    item: &HashMap<String, AttributeValue>,
    name: &str,
) -> Result<String, TravelStoreError> {
    item.get(name)
        .and_then(|value| value.as_s().ok())
        .cloned()
        .ok_or_else(|| TravelStoreError::Backend(format!("missing string attribute: {name}")))
}

/// Reads a required numeric attribute.
fn number_attr(
    item: &HashMap<String, AttributeValue>,
    name: &str,
) -> Result<f64, TravelStoreError> {
    item.get(name)
        .and_then(|value| value.as_n().ok())
        .and_then(|value| value.parse::<f64>().ok())
        .ok_or_else(|| TravelStoreError::Backend(format!("missing numeric attribute: {name}")))
}

/// Stable storage label for a booking kind.
const fn kind_label(kind: BookingKind) -> &'static str {
    match kind {
        BookingKind::Hotel => "hotel",
        BookingKind::Flight => "flight",
    }
}

/// Stable storage label for a booking status.
const fn status_label(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Confirmed => "confirmed",
        BookingStatus::Pending => "pending",
        BookingStatus::Cancelled => "cancelled",
    }
}

/// Parses a storage label into a booking kind.
fn parse_kind(label: &str) -> Result<BookingKind, TravelStoreError> {
    match label {
        "hotel" => Ok(BookingKind::Hotel),
        "flight" => Ok(BookingKind::Flight),
        other => Err(TravelStoreError::Backend(format!("unknown booking kind: {other}"))),
    }
}

/// Parses a storage label into a booking status.
fn parse_status(label: &str) -> Result<BookingStatus, TravelStoreError> {
    match label {
        "confirmed" => Ok(BookingStatus::Confirmed),
        "pending" => Ok(BookingStatus::Pending),
        "cancelled" => Ok(BookingStatus::Cancelled),
        other => Err(TravelStoreError::Backend(format!("unknown booking status: {other}"))),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use tripgrid_core::Booking;
    use tripgrid_core::BookingId;
    use tripgrid_core::BookingKind;
    use tripgrid_core::BookingStatus;
    use tripgrid_core::TenantId;
    use tripgrid_core::UserId;

    use super::booking_to_item;
    use super::item_to_booking;
    use super::parse_kind;
    use super::parse_status;

    fn sample_booking() -> Booking {
        Booking {
            booking_id: BookingId::new("bk-1"),
            tenant_id: TenantId::new("ABC123"),
            user_id: UserId::new("user1"),
            kind: BookingKind::Hotel,
            status: BookingStatus::Confirmed,
            city: "Lisbon".to_string(),
            check_in: "2025-05-01".to_string(),
            check_out: "2025-05-08".to_string(),
            amount_usd: 1260.0,
        }
    }

    #[test]
    fn booking_item_mapping_round_trips() {
        let booking = sample_booking();
        let item = booking_to_item(&booking);
        let back = item_to_booking(&item).expect("booking");
        assert_eq!(back, booking);
    }

    #[test]
    fn booking_item_uses_tenant_leading_key() {
        let item = booking_to_item(&sample_booking());
        let tenant = item.get("tenantId").and_then(|value| value.as_s().ok()).expect("tenant key");
        assert_eq!(tenant, "ABC123");
        let record = item.get("recordId").and_then(|value| value.as_s().ok()).expect("record key");
        assert!(record.starts_with("BOOKING#"));
    }

    #[test]
    fn unknown_labels_are_rejected() {
        assert!(parse_kind("cruise").is_err());
        assert!(parse_status("waitlisted").is_err());
    }
}
