// src/captions/handlers/sessions.rs

use axum::extract::{Extension, Json, Path};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::super::models::{CaptionSession, CreateSessionRequest, SaveTranscriptRequest};
use super::super::services::TranscriptService;
use super::super::validators::{self, SessionValidator};
use crate::auth::AuthedUser;
use crate::common::{generate_session_id, ApiError, AppState, Validator};

/// Fetch a session only if it belongs to the caller. Scoping every query by
/// the owner's id is the application-level stand-in for the row-level
/// security policy on the hosted backend.
pub async fn fetch_owned_session(
    pool: &SqlitePool,
    session_id: &str,
    user_id: &str,
) -> Result<CaptionSession, ApiError> {
    sqlx::query_as::<_, CaptionSession>(
        "SELECT * FROM caption_sessions WHERE id = ? AND user_id = ?",
    )
    .bind(session_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(ApiError::DatabaseError)?
    .ok_or_else(|| ApiError::NotFound("caption session not found".to_string()))
}

/// POST /api/captions/sessions - Start a captioning session
pub async fn create_session(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CaptionSession>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation = SessionValidator.validate(&request);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let session_id = generate_session_id();
    let language = match request.language {
        Some(language) => language,
        None => state
            .settings_service
            .get_setting("default_caption_language")
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| "en-US".to_string()),
    };

    sqlx::query(
        "INSERT INTO caption_sessions (id, user_id, title, language) VALUES (?, ?, ?, ?)",
    )
    .bind(&session_id)
    .bind(&authed.id)
    .bind(request.title.trim())
    .bind(&language)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(
            error = %e,
            user_id = %authed.id,
            "Database error creating caption session"
        );
        ApiError::DatabaseError(e)
    })?;

    let session = fetch_owned_session(&state.db, &session_id, &authed.id).await?;

    info!(
        user_id = %authed.id,
        session_id = %session.id,
        language = %session.language,
        "Caption session created"
    );

    Ok(Json(session))
}

/// GET /api/captions/sessions - List the caller's sessions, newest first
pub async fn list_sessions(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Vec<CaptionSession>>, ApiError> {
    let state = state_lock.read().await.clone();

    let sessions = sqlx::query_as::<_, CaptionSession>(
        "SELECT * FROM caption_sessions WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(&authed.id)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    Ok(Json(sessions))
}

/// GET /api/captions/sessions/:id - One session plus its stored segments
pub async fn get_session(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let session = fetch_owned_session(&state.db, &session_id, &authed.id).await?;
    let segments = TranscriptService::new(state.db.clone())
        .get_segments(&session.id)
        .await?;

    let resp = serde_json::json!({
        "session": session,
        "segments": segments,
    });

    Ok(Json(resp))
}

/// PUT /api/captions/sessions/:id/transcript - Auto-save snapshot
///
/// The client debounces while the user edits or recognition runs; the server
/// just replaces the snapshot.
pub async fn save_transcript(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(session_id): Path<String>,
    Json(request): Json<SaveTranscriptRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    validators::validate_transcript(&request.transcript)?;
    let session = fetch_owned_session(&state.db, &session_id, &authed.id).await?;

    TranscriptService::new(state.db.clone())
        .save_snapshot(&session.id, &request.transcript)
        .await?;

    Ok(Json(serde_json::json!({ "message": "Transcript saved" })))
}

/// POST /api/captions/sessions/:id/end - End a session
pub async fn end_session(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(session_id): Path<String>,
) -> Result<Json<CaptionSession>, ApiError> {
    let state = state_lock.read().await.clone();

    let session = fetch_owned_session(&state.db, &session_id, &authed.id).await?;
    if session.status == "ended" {
        return Ok(Json(session));
    }

    TranscriptService::new(state.db.clone())
        .finalize(&session.id)
        .await?;

    let session = fetch_owned_session(&state.db, &session_id, &authed.id).await?;
    Ok(Json(session))
}

/// DELETE /api/captions/sessions/:id - Delete a session and its segments
pub async fn delete_session(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    // Ownership check before the delete
    let session = fetch_owned_session(&state.db, &session_id, &authed.id).await?;

    sqlx::query("DELETE FROM caption_sessions WHERE id = ? AND user_id = ?")
        .bind(&session.id)
        .bind(&authed.id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(
        user_id = %authed.id,
        session_id = %session.id,
        "Caption session deleted"
    );

    Ok(Json(serde_json::json!({ "message": "Session deleted" })))
}
