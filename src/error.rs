// src/error.rs

use thiserror::Error;

/// Errors raised while building a [`Config`](crate::config::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required configuration field is missing.
    #[error("A required configuration field is missing: {0}")]
    MissingField(String),

    /// A provided URL could not be parsed.
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl { field: String, reason: String },

    /// A configuration value is present but cannot be used.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Errors raised while retrieving the JSON Web Key Set.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure, including the request timeout.
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The JWKS endpoint answered with a non-success status.
    #[error("JWKS endpoint returned status {0}")]
    Status(reqwest::StatusCode),

    /// The response body is not a JSON Web Key Set.
    #[error("Invalid JWKS document: {0}")]
    InvalidBody(String),

    /// A refresh this caller waited on failed; holds that failure's message.
    #[error("JWKS refresh failed: {0}")]
    RefreshFailed(String),
}

/// The reason a token was rejected, without the attached detail.
///
/// Callers that flatten every failure into one "invalid token" response can
/// still branch, log or count on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthFailureKind {
    UpstreamUnavailable,
    MalformedToken,
    UnknownKeyId,
    UnsupportedAlgorithm,
    SignatureInvalid,
    InvalidClaims,
}

impl AuthFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::MalformedToken => "malformed_token",
            Self::UnknownKeyId => "unknown_key_id",
            Self::UnsupportedAlgorithm => "unsupported_algorithm",
            Self::SignatureInvalid => "signature_invalid",
            Self::InvalidClaims => "invalid_claims",
        }
    }
}

impl std::fmt::Display for AuthFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The primary error type returned by token verification.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The signing keys could not be fetched.
    #[error("Signing keys unavailable: {0}")]
    UpstreamUnavailable(#[from] FetchError),

    /// The token could not be split or its header could not be decoded.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// The header `kid` does not name a key in the current key set.
    /// Holds the declared `kid`, or `None` when the header has none.
    #[error("Unknown token key (kid): {}", .0.as_deref().unwrap_or("<none>"))]
    UnknownKeyId(Option<String>),

    /// The header declares an algorithm other than RS256.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The signature does not verify against the matched key.
    #[error("Signature verification failed: {0}")]
    SignatureInvalid(String),

    /// Issuer, audience, expiry or a required claim failed validation.
    #[error("Invalid claims: {0}")]
    InvalidClaims(String),
}

impl AuthError {
    pub fn kind(&self) -> AuthFailureKind {
        match self {
            Self::UpstreamUnavailable(_) => AuthFailureKind::UpstreamUnavailable,
            Self::MalformedToken(_) => AuthFailureKind::MalformedToken,
            Self::UnknownKeyId(_) => AuthFailureKind::UnknownKeyId,
            Self::UnsupportedAlgorithm(_) => AuthFailureKind::UnsupportedAlgorithm,
            Self::SignatureInvalid(_) => AuthFailureKind::SignatureInvalid,
            Self::InvalidClaims(_) => AuthFailureKind::InvalidClaims,
        }
    }

    /// HTTP status a caller should answer with. Every failure is a 401.
    pub fn status_code(&self) -> u16 {
        401
    }

    /// Human-readable detail for the response body.
    pub fn detail(&self) -> String {
        format!("Invalid token: {self}")
    }

    /// Maps a `jsonwebtoken` failure raised after the key was matched.
    pub(crate) fn from_jwt(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::Crypto(_) => Self::SignatureInvalid(err.to_string()),
            ErrorKind::InvalidAlgorithm => Self::UnsupportedAlgorithm(err.to_string()),
            ErrorKind::ExpiredSignature
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_) => Self::InvalidClaims(err.to_string()),
            _ => Self::MalformedToken(err.to_string()),
        }
    }
}
