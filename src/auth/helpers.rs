use axum::http::{HeaderMap, header::AUTHORIZATION};

use super::{AuthError, Identity};
use crate::server::AppState;

/// Extracts the token from an `Authorization` header value.
///
/// Only the exact shape `Bearer <token>` is accepted: one scheme, one
/// token, separated by a single space.
#[must_use]
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    let (Some("Bearer"), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    (!token.is_empty()).then_some(token)
}

/// Validates the bearer token in `headers` against the state's token
/// service and clock.
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Identity, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?;

    let token = header
        .to_str()
        .ok()
        .and_then(extract_bearer_token)
        .ok_or(AuthError::InvalidScheme)?;

    state
        .tokens
        .validate(token, state.clock.now())
        .map_err(AuthError::InvalidToken)
}
