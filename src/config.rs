// src/config.rs

use crate::error::ConfigError;
use std::time::Duration;
use url::Url;

/// Default lifetime of a fetched key set.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Default timeout for one JWKS request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest accepted clock skew tolerance.
pub const MAX_LEEWAY: Duration = Duration::from_secs(5 * 60);

/// The verification settings for the bearer-token gate.
///
/// Built once at process start, either through [`ConfigBuilder`] or from the
/// environment with [`Config::from_env`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Expected `iss` claim. Compared to the token verbatim, so no trailing
    /// slash is added or removed.
    pub issuer: String,
    /// Where the provider publishes its signing keys.
    pub jwks_url: Url,
    /// Value that must appear in the token's `aud` claim.
    pub audience: String,
    /// How long a fetched key set is served before it is fetched again.
    pub cache_ttl: Duration,
    /// Bound on a single JWKS request.
    pub fetch_timeout: Duration,
    /// Clock skew tolerance applied to `exp`. Defaults to zero.
    pub leeway: Duration,
}

impl Config {
    /// Reads the configuration from process environment variables.
    ///
    /// | Variable | |
    /// |---|---|
    /// | `KEYCLOAK_ISSUER` | issuer; otherwise derived from `KEYCLOAK_BASE_URL` and `KEYCLOAK_REALM` |
    /// | `KEYCLOAK_JWKS_URL` | JWKS URL; otherwise derived from the issuer |
    /// | `KEYCLOAK_AUDIENCE` | required |
    /// | `JWKS_CACHE_TTL_SECS` | optional |
    /// | `JWKS_FETCH_TIMEOUT_SECS` | optional |
    /// | `JWT_LEEWAY_SECS` | optional |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`] but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut builder = ConfigBuilder::new();

        if let Some(jwks_url) = var("KEYCLOAK_JWKS_URL") {
            builder = builder.jwks_url(&jwks_url)?;
        }

        builder = match (var("KEYCLOAK_ISSUER"), var("KEYCLOAK_BASE_URL"), var("KEYCLOAK_REALM")) {
            (Some(issuer), _, _) => builder.issuer_with_keycloak_certs(&issuer)?,
            (None, Some(base_url), Some(realm)) => builder.keycloak_realm(&base_url, &realm)?,
            (None, _, _) => {
                return Err(ConfigError::MissingField(
                    "KEYCLOAK_ISSUER (or KEYCLOAK_BASE_URL and KEYCLOAK_REALM)".to_string(),
                ))
            }
        };
        if let Some(audience) = var("KEYCLOAK_AUDIENCE") {
            builder = builder.audience(audience);
        }
        if let Some(ttl) = var("JWKS_CACHE_TTL_SECS") {
            builder = builder.cache_ttl(parse_secs("JWKS_CACHE_TTL_SECS", &ttl)?);
        }
        if let Some(timeout) = var("JWKS_FETCH_TIMEOUT_SECS") {
            builder = builder.fetch_timeout(parse_secs("JWKS_FETCH_TIMEOUT_SECS", &timeout)?);
        }
        if let Some(leeway) = var("JWT_LEEWAY_SECS") {
            builder = builder.leeway(parse_secs("JWT_LEEWAY_SECS", &leeway)?);
        }

        builder.build()
    }
}

fn parse_secs(field: &str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidValue {
            field: field.to_string(),
            reason: e.to_string(),
        })
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

/// A builder for creating a `Config` instance.
///
/// `issuer`, `jwks_url` and `audience` are required; the JWKS URL may also be
/// derived through [`ConfigBuilder::keycloak_realm`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    issuer: Option<String>,
    jwks_url: Option<Url>,
    audience: Option<String>,
    cache_ttl: Option<Duration>,
    fetch_timeout: Option<Duration>,
    leeway: Option<Duration>,
}

impl ConfigBuilder {
    /// Creates a new `ConfigBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the expected issuer, e.g. `https://idp.example/realms/portal`.
    ///
    /// The value must be a URL but is stored exactly as given.
    pub fn issuer(mut self, issuer: &str) -> Result<Self, ConfigError> {
        parse_url("issuer", issuer)?;
        self.issuer = Some(issuer.to_string());
        Ok(self)
    }

    /// Sets the JWKS endpoint.
    pub fn jwks_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.jwks_url = Some(parse_url("jwks_url", url)?);
        Ok(self)
    }

    /// Derives issuer and JWKS URL from a Keycloak base URL and realm name.
    ///
    /// An explicit `jwks_url` set before or after this call wins.
    pub fn keycloak_realm(self, base_url: &str, realm: &str) -> Result<Self, ConfigError> {
        let issuer = format!("{}/realms/{}", base_url.trim_end_matches('/'), realm);
        self.issuer_with_keycloak_certs(&issuer)
    }

    /// Sets the issuer and, unless already set, the realm's
    /// `protocol/openid-connect/certs` endpoint below it.
    pub fn issuer_with_keycloak_certs(mut self, issuer: &str) -> Result<Self, ConfigError> {
        self = self.issuer(issuer)?;
        if self.jwks_url.is_none() {
            let certs = format!("{}/protocol/openid-connect/certs", issuer.trim_end_matches('/'));
            self.jwks_url = Some(parse_url("jwks_url", &certs)?);
        }
        Ok(self)
    }

    /// Sets the expected audience.
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Sets the key set lifetime. Defaults to one hour.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Sets the JWKS request timeout. Defaults to 10 seconds.
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Sets the clock skew tolerance. Defaults to zero.
    pub fn leeway(mut self, leeway: Duration) -> Self {
        self.leeway = Some(leeway);
        self
    }

    /// Consumes the builder and returns a `Config` object.
    ///
    /// # Errors
    ///
    /// Returns an error if `issuer`, `jwks_url` or `audience` is missing, if
    /// the audience is empty, or if the leeway exceeds [`MAX_LEEWAY`].
    pub fn build(self) -> Result<Config, ConfigError> {
        let issuer = self
            .issuer
            .ok_or_else(|| ConfigError::MissingField("issuer".to_string()))?;
        let jwks_url = self
            .jwks_url
            .ok_or_else(|| ConfigError::MissingField("jwks_url".to_string()))?;
        let audience = self
            .audience
            .ok_or_else(|| ConfigError::MissingField("audience".to_string()))?;
        if audience.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "audience".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        let leeway = self.leeway.unwrap_or(Duration::ZERO);
        if leeway > MAX_LEEWAY {
            return Err(ConfigError::InvalidValue {
                field: "leeway".to_string(),
                reason: format!("must be at most {} seconds", MAX_LEEWAY.as_secs()),
            });
        }

        Ok(Config {
            issuer,
            jwks_url,
            audience,
            cache_ttl: self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL),
            fetch_timeout: self.fetch_timeout.unwrap_or(DEFAULT_FETCH_TIMEOUT),
            leeway,
        })
    }
}
