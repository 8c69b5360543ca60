//! # HTTP surface
//!
//! | Method | Path | Auth | Handler |
//! |--------|------|------|---------|
//! | POST | `/register` | none | [`register`] |
//! | POST | `/login` | none | [`login`] |
//! | POST | `/verify` | none | [`verify`] |
//! | POST | `/resend-code` | none | [`resend_code`] |
//! | GET, POST | `/notes` | bearer | [`list_notes`], [`create_note`] |
//! | GET, PUT, DELETE | `/notes/{id}` | bearer | [`get_note`], [`update_note`], [`delete_note`] |
//!
//! Handlers only translate between JSON and the account flows or the note store;
//! every failure leaves as an [`ApiError`] rendered to `{"error": "..."}`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

use crate::accounts::{self, LoginRequest, RegisterRequest, ResendRequest, VerificationRequest};
use crate::auth::{require_bearer, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::models::{Note, NoteInput, UserInfo};
use crate::state::AppState;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

const NOTE_NOT_FOUND: &str = "Note not found";

pub fn router(state: AppState) -> Router {
    let notes = Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route(
            "/notes/{id}",
            get(get_note).put(update_note).delete(delete_note),
        )
        .route_layer(from_fn_with_state(state.clone(), require_bearer));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/verify", post(verify))
        .route("/resend-code", post(resend_code))
        .merge(notes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected request body");
        ApiError::BadRequest("Invalid request body".to_string())
    })
}

fn note_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::BadRequest("Invalid note id".to_string()))
}

#[derive(Debug, Serialize)]
struct Registered {
    #[serde(flatten)]
    user: UserInfo,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct Issued {
    token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Registered>)> {
    let user = accounts::register(&state, body(payload)?, Utc::now()).await?;
    let registered = Registered {
        user: user.to_info(),
        status: "verification_pending",
    };
    Ok((StatusCode::CREATED, Json(registered)))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<Issued>> {
    let token = accounts::login(&state, body(payload)?, Utc::now()).await?;
    Ok(Json(Issued { token, message: None }))
}

async fn verify(
    State(state): State<AppState>,
    payload: Result<Json<VerificationRequest>, JsonRejection>,
) -> ApiResult<Json<Issued>> {
    let token = accounts::verify(&state, body(payload)?, Utc::now()).await?;
    Ok(Json(Issued {
        token,
        message: Some("Account verified"),
    }))
}

async fn resend_code(
    State(state): State<AppState>,
    payload: Result<Json<ResendRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    accounts::resend_code(&state, body(payload)?, Utc::now()).await?;
    Ok(Json(json!({ "message": "A new verification code has been sent" })))
}

async fn list_notes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Note>>> {
    Ok(Json(state.notes.list_notes(user.user_id).await?))
}

async fn create_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NoteInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    let input = body(payload)?;
    let note = state.notes.create_note(user.user_id, &input).await?;
    tracing::info!(user_id = user.user_id, note_id = note.id, "note created");
    Ok((StatusCode::CREATED, Json(note)))
}

async fn get_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Note>> {
    let id = note_id(&id)?;
    state
        .notes
        .get_note(user.user_id, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(NOTE_NOT_FOUND.to_string()))
}

async fn update_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<NoteInput>, JsonRejection>,
) -> ApiResult<Json<Note>> {
    let id = note_id(&id)?;
    let input = body(payload)?;
    state
        .notes
        .update_note(user.user_id, id, &input)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(NOTE_NOT_FOUND.to_string()))
}

async fn delete_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = note_id(&id)?;
    if !state.notes.delete_note(user.user_id, id).await? {
        return Err(ApiError::NotFound(NOTE_NOT_FOUND.to_string()));
    }
    tracing::info!(user_id = user.user_id, note_id = id, "note deleted");
    Ok(StatusCode::NO_CONTENT)
}
