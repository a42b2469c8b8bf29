// tripgrid-core/src/lib.rs
// ============================================================================
// Module: Tripgrid Core
// Description: Core domain types and seams for the Tripgrid MCP server.
// Purpose: Provide identifiers, tool content, prompts, and store interfaces.
// Dependencies: serde, serde_json, thiserror, async-trait
// ============================================================================

//! ## Overview
//! Tripgrid core defines the shared vocabulary of the server: strongly typed
//! identifiers, the MCP tool content model, the prompt catalog, the travel
//! domain records, and the seams (`TravelStore`, `CredentialVendor`) that the
//! data-plane crates implement. Everything here is transport-agnostic and
//! carries no AWS or HTTP dependencies.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod content;
pub mod credentials;
pub mod identifiers;
pub mod prompts;
pub mod travel;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use content::ToolContent;
pub use content::ToolResult;
pub use credentials::CredentialError;
pub use credentials::CredentialVendor;
pub use credentials::StaticCredentialVendor;
pub use credentials::TenantCredentials;
pub use identifiers::BookingId;
pub use identifiers::TenantId;
pub use identifiers::TenantTier;
pub use identifiers::UserId;
pub use prompts::PromptArgument;
pub use prompts::PromptCatalog;
pub use prompts::PromptDescriptor;
pub use prompts::PromptError;
pub use prompts::PromptMessage;
pub use travel::Booking;
pub use travel::BookingKind;
pub use travel::BookingStatus;
pub use travel::HotelOffer;
pub use travel::HotelQuery;
pub use travel::InMemoryTravelStore;
pub use travel::LoyaltyProfile;
pub use travel::TravelStore;
pub use travel::TravelStoreError;
