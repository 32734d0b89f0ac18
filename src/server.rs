// src/server.rs

//! HTTP surface of the service.
//!
//! - `GET /health` answers `{"status":"ok"}` and never touches the verifier.
//! - `GET /me` verifies the `Authorization: Bearer` token and returns the
//!   caller's identity claims.
//!
//! Every authentication failure is answered with 401, a `{"detail": ...}`
//! body and a `WWW-Authenticate: Bearer` header.

use crate::claims::UserIdentity;
use crate::client::KeySource;
use crate::error::AuthError;
use crate::validator::TokenVerifier;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Builds the application router around a shared verifier.
pub fn router<S: KeySource>(verifier: Arc<TokenVerifier<S>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/me", get(me::<S>))
        .with_state(verifier)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[instrument(skip_all, name = "portal_auth.me")]
async fn me<S: KeySource>(
    State(verifier): State<Arc<TokenVerifier<S>>>,
    headers: HeaderMap,
) -> Result<Json<UserIdentity>, ApiError> {
    let token = bearer_token(&headers).ok_or(ApiError::NotAuthenticated)?;

    let claims = verifier.verify(token).await.map_err(|e| {
        debug!(kind = %e.kind(), error = %e, "Bearer token rejected");
        ApiError::InvalidToken(e)
    })?;

    Ok(Json(UserIdentity::from(&claims)))
}

/// Extracts the credentials of an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Errors returned to HTTP clients.
#[derive(Debug)]
pub enum ApiError {
    /// No usable bearer credentials were presented.
    NotAuthenticated,
    /// Credentials were presented but failed verification.
    InvalidToken(AuthError),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = match &self {
            ApiError::NotAuthenticated => "Not authenticated".to_string(),
            ApiError::InvalidToken(err) => err.detail(),
        };

        let mut response = (StatusCode::UNAUTHORIZED, Json(ErrorBody { detail })).into_response();
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        response
    }
}
