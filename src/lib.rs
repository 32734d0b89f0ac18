// src/lib.rs

//! JWKS-backed bearer token verification.
//!
//! A [`KeySetCache`](client::KeySetCache) keeps the identity provider's
//! signing keys for a fixed TTL; a [`TokenVerifier`](validator::TokenVerifier)
//! checks a raw bearer token against them and returns its claims or a typed
//! [`AuthError`](error::AuthError).

pub mod claims;
pub mod client;
pub mod config;
pub mod error;
pub mod header;
pub mod model;
#[cfg(feature = "server")]
pub mod server;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

/// The public prelude for the `portal-auth` crate.
///
/// This module re-exports the most commonly used types for convenience.
pub mod prelude {
    pub use crate::claims::{TokenClaims, UserIdentity};
    pub use crate::client::{HttpKeySource, KeySetCache, KeySource};
    pub use crate::config::{Config, ConfigBuilder};
    pub use crate::error::{AuthError, AuthFailureKind, ConfigError, FetchError};
    pub use crate::model::{JsonWebKey, KeySet};
    pub use crate::validator::TokenVerifier;
}
