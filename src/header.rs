// src/header.rs

use crate::error::AuthError;
use base64::engine::{general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use tracing::debug;

/// Upper bound on the size of a token accepted for parsing.
///
/// Tokens from realms that embed many groups or roles routinely pass 8 KiB.
pub const MAX_TOKEN_SIZE_BYTES: usize = 64 * 1024;

/// The token header as declared by the sender.
///
/// Nothing here is trusted until the signature has been verified; it only
/// selects the key and lets the algorithm be pinned.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnverifiedHeader {
    pub alg: String,
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub typ: Option<String>,
}

/// Decodes the header segment of a compact JWS without checking the signature.
///
/// Unlike `jsonwebtoken::decode_header`, any `alg` string is accepted here
/// (including `none`), so that algorithm pinning can report it precisely.
pub fn decode_unverified_header(token: &str) -> Result<UnverifiedHeader, AuthError> {
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        debug!(token_size = token.len(), max_size = MAX_TOKEN_SIZE_BYTES, "Token rejected: too large");
        return Err(AuthError::MalformedToken(format!(
            "token exceeds {MAX_TOKEN_SIZE_BYTES} bytes"
        )));
    }

    let mut segments = token.split('.');
    let (Some(header_segment), Some(_payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(AuthError::MalformedToken(
            "expected three dot-separated segments".to_string(),
        ));
    };

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_segment)
        .map_err(|e| AuthError::MalformedToken(format!("header is not base64url: {e}")))?;

    serde_json::from_slice(&header_bytes)
        .map_err(|e| AuthError::MalformedToken(format!("header is not a JWS header: {e}")))
}
