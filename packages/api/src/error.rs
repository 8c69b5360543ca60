//! Error taxonomy for the HTTP API.
//!
//! Every handler returns [`ApiResult`]; the [`IntoResponse`] impl below is the single
//! place where domain errors become a status code and a `{"error": "..."}` body.
//! Internal failures are logged in full and reported to the client generically.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::auth::TokenError;
use crate::mail::MailError;
use crate::store::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed body, weak password, invalid id.
    #[error("{0}")]
    BadRequest(String),

    /// Unknown email or wrong password. Both cases share this message.
    #[error("Invalid email or password")]
    Unauthenticated,

    #[error("Authorization header is missing")]
    MissingHeader,

    #[error("Authorization header must have the form 'Bearer <token>'")]
    MalformedHeader,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Account is not verified")]
    NotVerified,

    #[error("Account is already verified")]
    AlreadyVerified,

    #[error("Invalid verification code")]
    CodeMismatch,

    #[error("Verification code has expired")]
    CodeExpired,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::AlreadyVerified => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated
            | ApiError::MissingHeader
            | ApiError::MalformedHeader
            | ApiError::CodeMismatch
            | ApiError::CodeExpired => StatusCode::UNAUTHORIZED,
            ApiError::Token(TokenError::Signing(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Token(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotVerified => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
