// tripgrid-core/src/travel.rs
// ============================================================================
// Module: Travel Domain
// Description: Booking, hotel, and loyalty records plus the store seam.
// Purpose: Provide typed travel data and the tenant-partitioned store trait.
// Dependencies: serde, thiserror, async-trait
// ============================================================================

//! ## Overview
//! The travel domain records are partitioned by tenant: every store operation
//! takes the vended [`TenantCredentials`] and the store acts under that
//! identity. Implementations must enforce the tenant-leading-key condition;
//! the in-memory store mirrors it by rejecting credentials vended for a
//! different tenant, which keeps the isolation property testable offline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::credentials::TenantCredentials;
use crate::identifiers::BookingId;
use crate::identifiers::TenantId;
use crate::identifiers::UserId;

// ============================================================================
// SECTION: Domain Records
// ============================================================================

/// Booking category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingKind {
    /// Hotel stay booking.
    Hotel,
    /// Flight segment booking.
    Flight,
}

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Booking confirmed by the supplier.
    Confirmed,
    /// Booking awaiting supplier confirmation.
    Pending,
    /// Booking cancelled.
    Cancelled,
}

/// Booking record stored in the tenant-partitioned table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking identifier, unique within the tenant partition.
    pub booking_id: BookingId,
    /// Owning tenant; the partition leading key.
    pub tenant_id: TenantId,
    /// User who placed the booking.
    pub user_id: UserId,
    /// Booking category.
    pub kind: BookingKind,
    /// Lifecycle status.
    pub status: BookingStatus,
    /// Destination city.
    pub city: String,
    /// Check-in or departure date (YYYY-MM-DD).
    pub check_in: String,
    /// Check-out or return date (YYYY-MM-DD).
    pub check_out: String,
    /// Total amount in USD.
    pub amount_usd: f64,
}

/// Hotel availability query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelQuery {
    /// Destination city.
    pub city: String,
    /// Check-in date (YYYY-MM-DD).
    pub check_in: String,
    /// Check-out date (YYYY-MM-DD).
    pub check_out: String,
    /// Number of guests.
    pub guests: u8,
}

/// Hotel offer returned by availability search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelOffer {
    /// Offer identifier used by `book_hotel`.
    pub offer_id: String,
    /// Hotel display name.
    pub hotel_name: String,
    /// City of the property.
    pub city: String,
    /// Nightly rate in USD.
    pub nightly_rate_usd: f64,
    /// Star rating, 1 to 5.
    pub rating: u8,
}

/// Loyalty profile for a tenant user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyProfile {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Profile owner.
    pub user_id: UserId,
    /// Loyalty program tier label.
    pub tier: String,
    /// Accumulated points balance.
    pub points: u64,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Travel store errors.
#[derive(Debug, Error)]
pub enum TravelStoreError {
    /// Record not present in the tenant partition.
    #[error("not found: {0}")]
    NotFound(String),
    /// Credentials do not permit the requested partition.
    #[error("access denied: {0}")]
    AccessDenied(String),
    /// Invalid query or record input.
    #[error("invalid input: {0}")]
    Invalid(String),
    /// Backend I/O or service failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

// ============================================================================
// SECTION: Store Seam
// ============================================================================

/// Tenant-partitioned travel data store.
///
/// All operations act under the vended credentials; implementations must not
/// return rows outside the credentials' tenant partition.
#[async_trait]
pub trait TravelStore: Send + Sync {
    /// Lists bookings for a user within the tenant partition.
    async fn list_bookings(
        &self,
        credentials: &TenantCredentials,
        tenant_id: &TenantId,
        user_id: &UserId,
    ) -> Result<Vec<Booking>, TravelStoreError>;

    /// Writes a booking into the tenant partition.
    async fn put_booking(
        &self,
        credentials: &TenantCredentials,
        booking: &Booking,
    ) -> Result<(), TravelStoreError>;

    /// Searches hotel availability for a query.
    async fn find_hotels(
        &self,
        credentials: &TenantCredentials,
        query: &HotelQuery,
    ) -> Result<Vec<HotelOffer>, TravelStoreError>;

    /// Reads the loyalty profile for a user within the tenant partition.
    async fn loyalty_profile(
        &self,
        credentials: &TenantCredentials,
        tenant_id: &TenantId,
        user_id: &UserId,
    ) -> Result<LoyaltyProfile, TravelStoreError>;
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory travel store for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryTravelStore {
    /// Bookings keyed by tenant then booking id.
    bookings: Mutex<BTreeMap<TenantId, BTreeMap<BookingId, Booking>>>,
}

impl InMemoryTravelStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with a booking, bypassing credential checks.
    pub fn seed(&self, booking: Booking) {
        let Ok(mut bookings) = self.bookings.lock() else {
            return;
        };
        bookings
            .entry(booking.tenant_id.clone())
            .or_default()
            .insert(booking.booking_id.clone(), booking);
    }

    /// Enforces the leading-key condition the data plane applies.
    fn check_partition(
        credentials: &TenantCredentials,
        tenant_id: &TenantId,
    ) -> Result<(), TravelStoreError> {
        if credentials.tenant_id != *tenant_id {
            return Err(TravelStoreError::AccessDenied(format!(
                "credentials scoped to tenant {} cannot access tenant {}",
                credentials.tenant_id, tenant_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TravelStore for InMemoryTravelStore {
    async fn list_bookings(
        &self,
        credentials: &TenantCredentials,
        tenant_id: &TenantId,
        user_id: &UserId,
    ) -> Result<Vec<Booking>, TravelStoreError> {
        Self::check_partition(credentials, tenant_id)?;
        let bookings = self
            .bookings
            .lock()
            .map_err(|_| TravelStoreError::Backend("store lock poisoned".to_string()))?;
        Ok(bookings
            .get(tenant_id)
            .map(|partition| {
                partition.values().filter(|booking| booking.user_id == *user_id).cloned().collect()
            })
            .unwrap_or_default())
    }

    async fn put_booking(
        &self,
        credentials: &TenantCredentials,
        booking: &Booking,
    ) -> Result<(), TravelStoreError> {
        Self::check_partition(credentials, &booking.tenant_id)?;
        let mut bookings = self
            .bookings
            .lock()
            .map_err(|_| TravelStoreError::Backend("store lock poisoned".to_string()))?;
        bookings
            .entry(booking.tenant_id.clone())
            .or_default()
            .insert(booking.booking_id.clone(), booking.clone());
        Ok(())
    }

    async fn find_hotels(
        &self,
        credentials: &TenantCredentials,
        query: &HotelQuery,
    ) -> Result<Vec<HotelOffer>, TravelStoreError> {
        if credentials.is_expired() {
            return Err(TravelStoreError::AccessDenied("credentials expired".to_string()));
        }
        if query.city.is_empty() {
            return Err(TravelStoreError::Invalid("city must not be empty".to_string()));
        }
        Ok(sample_offers()
            .into_iter()
            .filter(|offer| offer.city.eq_ignore_ascii_case(&query.city))
            .collect())
    }

    async fn loyalty_profile(
        &self,
        credentials: &TenantCredentials,
        tenant_id: &TenantId,
        user_id: &UserId,
    ) -> Result<LoyaltyProfile, TravelStoreError> {
        Self::check_partition(credentials, tenant_id)?;
        let bookings = self.list_bookings(credentials, tenant_id, user_id).await?;
        let points = bookings
            .iter()
            .filter(|booking| booking.status == BookingStatus::Confirmed)
            .map(|booking| booking.amount_usd as u64)
            .sum::<u64>();
        let tier = match points {
            0..=999 => "member",
            1000..=4999 => "silver",
            _ => "gold",
        };
        Ok(LoyaltyProfile {
            tenant_id: tenant_id.clone(),
            user_id: user_id.clone(),
            tier: tier.to_string(),
            points,
        })
    }
}

/// Static hotel inventory used by the in-memory store.
fn sample_offers() -> Vec<HotelOffer> {
    vec![
        HotelOffer {
            offer_id: "lis-alma-01".to_string(),
            hotel_name: "Alma do Tejo".to_string(),
            city: "Lisbon".to_string(),
            nightly_rate_usd: 180.0,
            rating: 4,
        },
        HotelOffer {
            offer_id: "lis-mira-02".to_string(),
            hotel_name: "Miradouro Suites".to_string(),
            city: "Lisbon".to_string(),
            nightly_rate_usd: 240.0,
            rating: 5,
        },
        HotelOffer {
            offer_id: "kyo-kamo-01".to_string(),
            hotel_name: "Kamogawa Ryokan".to_string(),
            city: "Kyoto".to_string(),
            nightly_rate_usd: 210.0,
            rating: 4,
        },
    ]
}

// ============================================================================
// SECTION: Tests
// ============================================================================
