//! # Account flows: register, login, verify, resend
//!
//! Each flow takes the shared [`AppState`] and the current time, so the expiry rules
//! can be exercised deterministically. HTTP handlers pass `Utc::now()`.
//!
//! | Flow | Success | Failures |
//! |------|---------|----------|
//! | [`register`] | unverified user + emailed code (15 min) | `BadRequest`, `Conflict`, `Internal` |
//! | [`login`] | bearer token | `Unauthenticated`, `NotVerified` |
//! | [`verify`] | account verified + bearer token | `NotFound`, `AlreadyVerified`, `CodeMismatch`, `CodeExpired` |
//! | [`resend_code`] | new emailed code (5 min) | `NotFound`, `AlreadyVerified`, `Internal` |
//!
//! Unknown email and wrong password are indistinguishable on login. On registration,
//! a failed email leaves the unverified row in place; `/resend-code` recovers it.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::{self, PendingCode};
use crate::error::{ApiError, ApiResult};
use crate::models::{NewUser, User};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResendRequest {
    pub email: String,
}

/// Emails are compared trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn find_user(state: &AppState, email: &str) -> ApiResult<User> {
    state
        .users
        .find_by_email(email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

pub async fn register(state: &AppState, req: RegisterRequest, now: DateTime<Utc>) -> ApiResult<User> {
    let username = req.username.trim().to_string();
    let email = normalize_email(&req.email);

    if username.is_empty() {
        return Err(ApiError::BadRequest("Username is required".to_string()));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if !auth::is_acceptable(&req.password) {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least 8 characters and contain a lowercase letter, \
             an uppercase letter, a digit and one of {}",
            auth::SPECIAL_CHARACTERS
        )));
    }

    let password_hash = auth::hash_password(&req.password)?;
    let pending = PendingCode::for_registration(now);

    let user = state
        .users
        .create_user(NewUser {
            username,
            email,
            password_hash,
            verification_code: pending.code.clone(),
            code_expiry_time: pending.expires_at,
        })
        .await?;
    tracing::info!(user_id = user.id, "user registered");

    state
        .mailer
        .send_verification(&user.email, &pending.code)
        .await
        .map_err(|e| {
            tracing::error!(user_id = user.id, error = %e, "registered user did not receive a code");
            ApiError::Internal(format!("Failed to send verification email: {e}"))
        })?;

    Ok(user)
}

pub async fn login(state: &AppState, req: LoginRequest, now: DateTime<Utc>) -> ApiResult<String> {
    let email = normalize_email(&req.email);

    let Some(user) = state.users.find_by_email(&email).await? else {
        auth::verify_against_dummy(&req.password);
        tracing::warn!("login rejected");
        return Err(ApiError::Unauthenticated);
    };

    if !auth::verify_password(&req.password, &user.password_hash)? {
        tracing::warn!(user_id = user.id, "login rejected");
        return Err(ApiError::Unauthenticated);
    }

    if state.require_verification && !user.is_verified {
        return Err(ApiError::NotVerified);
    }

    let token = state.tokens.issue_at(user.id, now)?;
    tracing::info!(user_id = user.id, "user logged in");
    Ok(token)
}

pub async fn verify(state: &AppState, req: VerificationRequest, now: DateTime<Utc>) -> ApiResult<String> {
    let email = normalize_email(&req.email);
    let user = find_user(state, &email).await?;

    auth::check_code(&user, &req.code, now)?;

    if !state.users.mark_verified(user.id, &req.code).await? {
        // Lost a race with a concurrent verify or resend.
        let current = find_user(state, &email).await?;
        return Err(if current.is_verified {
            ApiError::AlreadyVerified
        } else {
            ApiError::CodeMismatch
        });
    }

    let token = state.tokens.issue_at(user.id, now)?;
    tracing::info!(user_id = user.id, "account verified");
    Ok(token)
}

pub async fn resend_code(state: &AppState, req: ResendRequest, now: DateTime<Utc>) -> ApiResult<()> {
    let email = normalize_email(&req.email);
    let user = find_user(state, &email).await?;

    if user.is_verified {
        return Err(ApiError::AlreadyVerified);
    }

    let pending = PendingCode::for_resend(now);
    if !state.users.replace_code(user.id, &pending).await? {
        return Err(ApiError::AlreadyVerified);
    }

    state
        .mailer
        .send_verification(&user.email, &pending.code)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to send email, code was updated: {e}")))?;

    tracing::info!(user_id = user.id, "verification code resent");
    Ok(())
}
