// tripgrid-store-dynamo/src/lib.rs
// ============================================================================
// Module: DynamoDB Travel Store
// Description: Tenant-partitioned TravelStore backend using DynamoDB.
// Purpose: Provide production persistence with leading-key tenant isolation.
// Dependencies: tripgrid-core, aws-sdk-dynamodb
// ============================================================================

//! ## Overview
//! This crate provides a DynamoDB-backed [`tripgrid_core::TravelStore`]. Every
//! call builds a client from the vended tenant credentials, so the table
//! policy's leading-key condition on the `tenantId` principal tag applies to
//! each request. The store never widens a query beyond one tenant partition.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::DynamoStoreConfig;
pub use store::DynamoTravelStore;
