// tripgrid-mcp/src/jwks.rs
// ============================================================================
// Module: JWKS Cache
// Description: Signing-key retrieval and bounded caching for the verifier.
// Purpose: Resolve `kid` values to decoding keys with per-kid single-flight.
// Dependencies: reqwest, jsonwebtoken, tokio
// ============================================================================

//! ## Overview
//! Signing keys are fetched from the identity provider's JWKS document and
//! cached by `kid`. The cache is bounded to [`MAX_CACHE_ENTRIES`] entries with
//! a [`ENTRY_TTL`] lifetime and refreshes lazily on miss. Concurrent misses
//! for the same `kid` coalesce behind a per-kid flight lock; a stampede across
//! different kids is tolerated but never corrupts the map.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of cached signing keys.
pub const MAX_CACHE_ENTRIES: usize = 5;
/// Lifetime of a cached signing key.
pub const ENTRY_TTL: Duration = Duration::from_secs(600);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// JWKS retrieval errors.
#[derive(Debug, Error)]
pub enum JwksError {
    /// The JWKS endpoint could not be reached.
    #[error("jwks fetch failed: {0}")]
    Fetch(String),
    /// The JWKS document could not be parsed.
    #[error("jwks parse failed: {0}")]
    Parse(String),
    /// No key with the requested `kid` exists in the document.
    #[error("unknown signing key: {0}")]
    UnknownKid(String),
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// JWKS document as published by the identity provider.
#[derive(Debug, Deserialize)]
struct JwksDocument {
    /// Published signing keys.
    keys: Vec<Jwk>,
}

/// Single JSON Web Key entry.
#[derive(Debug, Deserialize)]
struct Jwk {
    /// Key identifier.
    kid: Option<String>,
    /// Key type; only RSA keys are used.
    kty: String,
    /// RSA modulus, base64url.
    n: Option<String>,
    /// RSA exponent, base64url.
    e: Option<String>,
}

// ============================================================================
// SECTION: Cache
// ============================================================================

/// Cached signing key with its insertion instant.
struct CacheEntry {
    /// Decoded verification key.
    key: DecodingKey,
    /// Instant the entry was inserted.
    inserted_at: Instant,
}

/// Bounded JWKS cache with per-kid single-flight refresh.
pub struct JwksCache {
    /// JWKS document URI.
    uri: String,
    /// HTTP client with the configured fetch timeout.
    client: reqwest::Client,
    /// Cached keys by `kid`.
    entries: Mutex<HashMap<String, CacheEntry>>,
    /// Per-kid flight locks serializing concurrent fetches.
    flights: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl JwksCache {
    /// Creates a new cache bound to a JWKS URI.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::Fetch`] when the HTTP client cannot be built.
    pub fn new(uri: impl Into<String>, timeout: Duration) -> Result<Self, JwksError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| JwksError::Fetch(err.to_string()))?;
        Ok(Self {
            uri: uri.into(),
            client,
            entries: Mutex::new(HashMap::new()),
            flights: Mutex::new(HashMap::new()),
        })
    }

    /// Resolves a `kid` to a decoding key, fetching on miss.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError`] when the fetch fails or the kid is unknown.
    pub async fn key_for(&self, kid: &str) -> Result<DecodingKey, JwksError> {
        if let Some(key) = self.cached(kid) {
            return Ok(key);
        }
        let flight = self.flight_lock(kid);
        let _guard = flight.lock().await;
        // Another flight may have refreshed the cache while we waited.
        if let Some(key) = self.cached(kid) {
            return Ok(key);
        }
        let document = self.fetch().await?;
        self.insert_document(&document)?;
        self.cached(kid).ok_or_else(|| JwksError::UnknownKid(kid.to_string()))
    }

    /// Returns a fresh cached key, dropping expired entries on the way.
    fn cached(&self, kid: &str) -> Option<DecodingKey> {
        let Ok(mut entries) = self.entries.lock() else {
            return None;
        };
        let now = Instant::now();
        entries.retain(|_, entry| now.duration_since(entry.inserted_at) < ENTRY_TTL);
        entries.get(kid).map(|entry| entry.key.clone())
    }

    /// Returns the flight lock for a `kid`, creating it on first use.
    fn flight_lock(&self, kid: &str) -> Arc<tokio::sync::Mutex<()>> {
        let Ok(mut flights) = self.flights.lock() else {
            return Arc::new(tokio::sync::Mutex::new(()));
        };
        Arc::clone(
            flights.entry(kid.to_string()).or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    /// Fetches and parses the JWKS document.
    async fn fetch(&self) -> Result<JwksDocument, JwksError> {
        let response = self
            .client
            .get(&self.uri)
            .send()
            .await
            .map_err(|err| JwksError::Fetch(err.to_string()))?;
        if !response.status().is_success() {
            return Err(JwksError::Fetch(format!("jwks endpoint returned {}", response.status())));
        }
        response.json::<JwksDocument>().await.map_err(|err| JwksError::Parse(err.to_string()))
    }

    /// Inserts RSA keys from a document, evicting beyond the bound.
    fn insert_document(&self, document: &JwksDocument) -> Result<(), JwksError> {
        let mut parsed = Vec::new();
        for jwk in &document.keys {
            if jwk.kty != "RSA" {
                continue;
            }
            let (Some(kid), Some(n), Some(e)) = (&jwk.kid, &jwk.n, &jwk.e) else {
                continue;
            };
            let key = DecodingKey::from_rsa_components(n, e)
                .map_err(|err| JwksError::Parse(err.to_string()))?;
            parsed.push((kid.clone(), key));
        }
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| JwksError::Parse("jwks cache lock poisoned".to_string()))?;
        let now = Instant::now();
        for (kid, key) in parsed {
            entries.insert(kid, CacheEntry {
                key,
                inserted_at: now,
            });
        }
        entries.retain(|_, entry| now.duration_since(entry.inserted_at) < ENTRY_TTL);
        while entries.len() > MAX_CACHE_ENTRIES {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(kid, _)| kid.clone());
            match oldest {
                Some(kid) => {
                    entries.remove(&kid);
                }
                None => break,
            }
        }
        Ok(())
    }

    /// Returns the number of live cache entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Returns true when the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use std::time::Duration;
    use std::time::Instant;

    use jsonwebtoken::DecodingKey;

    use super::CacheEntry;
    use super::JwksCache;
    use super::MAX_CACHE_ENTRIES;

    fn test_cache() -> JwksCache {
        JwksCache::new("http://127.0.0.1:1/jwks.json", Duration::from_secs(1)).expect("cache")
    }

    fn secret_entry(age: Duration) -> CacheEntry {
        CacheEntry {
            key: DecodingKey::from_secret(b"test"),
            inserted_at: Instant::now() - age,
        }
    }

    #[test]
    fn cache_is_bounded_to_max_entries() {
        let cache = test_cache();
        {
            let mut entries = cache.entries.lock().unwrap();
            for index in 0..(MAX_CACHE_ENTRIES + 3) {
                entries.insert(format!("kid-{index}"), secret_entry(Duration::ZERO));
            }
        }
        cache
            .insert_document(&super::JwksDocument {
                keys: Vec::new(),
            })
            .expect("insert");
        assert!(cache.len() <= MAX_CACHE_ENTRIES);
    }

    #[test]
    fn expired_entries_are_never_returned() {
        let cache = test_cache();
        {
            let mut entries = cache.entries.lock().unwrap();
            entries.insert("stale".to_string(), secret_entry(Duration::from_secs(601)));
        }
        assert!(cache.cached("stale").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn fresh_entries_are_returned() {
        let cache = test_cache();
        {
            let mut entries = cache.entries.lock().unwrap();
            entries.insert("fresh".to_string(), secret_entry(Duration::from_secs(10)));
        }
        assert!(cache.cached("fresh").is_some());
    }
}
