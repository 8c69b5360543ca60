//! Bearer-token gate for authenticated routes.
//!
//! [`require_bearer`] runs as route middleware: it reads `Authorization: Bearer <token>`,
//! verifies the token and stores an [`AuthUser`] in the request extensions. Requests
//! that fail never reach a handler and never touch the store.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

/// Identity attached to an authenticated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(ApiError::MissingHeader)?
        .to_str()
        .map_err(|_| ApiError::MalformedHeader)?;
    if value.is_empty() {
        return Err(ApiError::MissingHeader);
    }

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(ApiError::MalformedHeader),
    }
}

pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;
    let user_id = state.tokens.verify(token).map_err(|e| {
        tracing::warn!(error = %e, path = %request.uri().path(), "rejected bearer token");
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(request).await)
}
