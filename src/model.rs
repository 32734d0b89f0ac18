// src/model.rs

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Represents a single JSON Web Key (JWK) as defined in RFC 7517.
///
/// Only the members needed for RS256 verification are typed; everything else
/// the provider publishes (`x5c`, `x5t`, ...) is kept in `other`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JsonWebKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    pub kty: String,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// Represents a JSON Web Key Set (JWKS), which is a collection of JWKs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonWebKeySet {
    pub keys: Vec<JsonWebKey>,
}

/// The provider's key set as of one successful fetch.
///
/// A snapshot is never mutated; a refresh builds a new one.
#[derive(Debug)]
pub struct KeySet {
    keys: Vec<JsonWebKey>,
    fetched_at: Instant,
}

impl KeySet {
    pub fn new(keys: Vec<JsonWebKey>, fetched_at: Instant) -> Self {
        Self { keys, fetched_at }
    }

    pub fn keys(&self) -> &[JsonWebKey] {
        &self.keys
    }

    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    /// Returns the first key whose `kid` equals `kid` exactly.
    pub fn find(&self, kid: &str) -> Option<&JsonWebKey> {
        self.keys.iter().find(|key| key.kid.as_deref() == Some(kid))
    }

    /// Whether the snapshot is older than `ttl` at `now`.
    pub fn is_stale(&self, now: Instant, ttl: std::time::Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) > ttl
    }
}
