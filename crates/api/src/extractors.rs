//! Request extractors.

use axum::{extract::FromRequestParts, http::HeaderMap, http::request::Parts};
use haven_common::AppError;

use crate::middleware::AppState;

/// Extractor that rejects requests without a valid admin bearer token.
///
/// Admin authentication policy is externally supplied; this is only the
/// thin token check guarding admin and polling routes. When no token is
/// configured, all admin access is rejected.
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if is_admin(&parts.headers, state) {
            Ok(Self)
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

/// Whether the request carries the configured admin bearer token.
#[must_use]
pub fn is_admin(headers: &HeaderMap, state: &AppState) -> bool {
    let Some(expected) = state.admin_token.as_deref() else {
        return false;
    };

    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected)
}

/// Whether a raw token value matches the configured admin token.
#[must_use]
pub fn token_matches(token: Option<&str>, state: &AppState) -> bool {
    match (token, state.admin_token.as_deref()) {
        (Some(provided), Some(expected)) => provided == expected,
        _ => false,
    }
}
