// src/validator.rs

use crate::claims::TokenClaims;
use crate::client::{HttpKeySource, KeySetCache, KeySource};
use crate::config::{Config, MAX_LEEWAY};
use crate::error::{AuthError, FetchError};
use crate::header::decode_unverified_header;
use crate::model::{JsonWebKey, KeySet};
use jsonwebtoken::{decode, get_current_timestamp, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// The only signing algorithm accepted, whatever the token header claims.
const PINNED_ALGORITHM: &str = "RS256";

/// The bearer token verifier.
///
/// This struct is created once with a shared [`KeySetCache`] and reused for
/// all requests. Verification runs these steps in order, stopping at the
/// first failure:
///
/// 1. Obtain the current key set (fetching it on a miss or after the TTL).
/// 2. Decode the header without trusting it, to read `kid` and `alg`.
/// 3. Find the key whose `kid` matches exactly.
/// 4. Require `alg` to be RS256 and verify the signature with that key.
/// 5. Check `iss`, `aud` and `exp` against the configuration.
pub struct TokenVerifier<S = HttpKeySource> {
    cache: Arc<KeySetCache<S>>,
    issuer: String,
    audience: String,
    leeway: Duration,
}

impl TokenVerifier<HttpKeySource> {
    /// Creates a verifier with its own HTTP-backed key cache.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let cache = Arc::new(KeySetCache::from_config(config)?);
        Ok(Self::new(cache, config))
    }
}

impl<S: KeySource> TokenVerifier<S> {
    /// Creates a verifier over an existing cache, taking issuer, audience and
    /// leeway from `config`.
    pub fn new(cache: Arc<KeySetCache<S>>, config: &Config) -> Self {
        Self {
            cache,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            leeway: config.leeway.min(MAX_LEEWAY),
        }
    }

    pub fn cache(&self) -> &Arc<KeySetCache<S>> {
        &self.cache
    }

    /// Verifies `token` against the current key set and returns its claims.
    ///
    /// A key set fetch failure is reported as
    /// [`AuthError::UpstreamUnavailable`]; nothing is retried here.
    #[instrument(skip(self, token), err(Display))]
    pub async fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let key_set = self.cache.get_key_set().await?;
        self.verify_with_key_set(token, &key_set)
    }

    /// Runs every check after key retrieval against the given snapshot.
    pub fn verify_with_key_set(&self, token: &str, key_set: &KeySet) -> Result<TokenClaims, AuthError> {
        let header = decode_unverified_header(token)?;

        let kid = header
            .kid
            .as_deref()
            .ok_or(AuthError::UnknownKeyId(None))?;
        let jwk = key_set
            .find(kid)
            .ok_or_else(|| AuthError::UnknownKeyId(Some(kid.to_string())))?;

        if header.alg != PINNED_ALGORITHM {
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }

        let decoding_key = rs256_key(jwk)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = self.leeway.as_secs();
        validation.validate_nbf = false;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let token_data = decode::<TokenClaims>(token, &decoding_key, &validation)
            .map_err(AuthError::from_jwt)?;

        // jsonwebtoken still accepts `exp == now`; a token must expire in the future.
        let exp = token_data.claims.exp().unwrap_or_default();
        if exp <= get_current_timestamp().saturating_sub(self.leeway.as_secs()) {
            return Err(AuthError::InvalidClaims("ExpiredSignature".to_string()));
        }

        debug!(kid, sub = token_data.claims.sub(), "Token verified");
        Ok(token_data.claims)
    }
}

/// Builds an RS256 verification key from a matched JWK.
fn rs256_key(jwk: &JsonWebKey) -> Result<DecodingKey, AuthError> {
    if jwk.kty != "RSA" {
        return Err(AuthError::SignatureInvalid(format!(
            "key type {} cannot verify RS256",
            jwk.kty
        )));
    }
    let n = jwk
        .n
        .as_deref()
        .ok_or_else(|| AuthError::SignatureInvalid("RSA key missing 'n' component".to_string()))?;
    let e = jwk
        .e
        .as_deref()
        .ok_or_else(|| AuthError::SignatureInvalid("RSA key missing 'e' component".to_string()))?;

    DecodingKey::from_rsa_components(n, e)
        .map_err(|err| AuthError::SignatureInvalid(format!("unusable RSA key: {err}")))
}
