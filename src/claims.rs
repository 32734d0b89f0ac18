// src/claims.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The verified payload of a token.
///
/// Produced only by [`TokenVerifier`](crate::validator::TokenVerifier) after
/// signature and claim checks pass, so `sub`, `iss`, `aud` and `exp` are
/// always present. Any other claim the provider adds is kept as-is.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TokenClaims(Map<String, Value>);

impl TokenClaims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn sub(&self) -> Option<&str> {
        self.str_claim("sub")
    }

    pub fn iss(&self) -> Option<&str> {
        self.str_claim("iss")
    }

    pub fn preferred_username(&self) -> Option<&str> {
        self.str_claim("preferred_username")
    }

    pub fn email(&self) -> Option<&str> {
        self.str_claim("email")
    }

    /// The `aud` claim as presented: a string or an array of strings.
    pub fn aud(&self) -> Option<&Value> {
        self.0.get("aud")
    }

    pub fn exp(&self) -> Option<u64> {
        self.0.get("exp").and_then(Value::as_u64)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    fn str_claim(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for TokenClaims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Identity fields exposed to the caller of a user-identity endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserIdentity {
    pub sub: Option<String>,
    pub preferred_username: Option<String>,
    pub email: Option<String>,
    pub aud: Option<Value>,
}

impl From<&TokenClaims> for UserIdentity {
    fn from(claims: &TokenClaims) -> Self {
        Self {
            sub: claims.sub().map(str::to_string),
            preferred_username: claims.preferred_username().map(str::to_string),
            email: claims.email().map(str::to_string),
            aud: claims.aud().cloned(),
        }
    }
}
