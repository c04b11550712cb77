// src/captions/handlers/export.rs

use axum::extract::{Extension, Path};
use axum::http::header;
use axum::response::IntoResponse;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::sessions::fetch_owned_session;
use super::super::services::TranscriptService;
use crate::auth::AuthedUser;
use crate::common::helpers::sanitize_filename;
use crate::common::{ApiError, AppState};

/// GET /api/captions/sessions/:id/export - Download the transcript
///
/// Serves the transcript as a text attachment, replacing the original's
/// client-side blob + anchor-click download. The snapshot wins when present;
/// otherwise the stored segments are assembled on the fly.
pub async fn export_transcript(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();

    let session = fetch_owned_session(&state.db, &session_id, &authed.id).await?;

    let transcript = if session.transcript.trim().is_empty() {
        TranscriptService::new(state.db.clone())
            .assemble_transcript(&session.id)
            .await?
    } else {
        session.transcript.clone()
    };

    if transcript.trim().is_empty() {
        return Err(ApiError::ExportError(
            "session has no transcript to export".to_string(),
        ));
    }

    let filename = format!("{}-{}.txt", sanitize_filename(&session.title), session.id);

    info!(
        user_id = %authed.id,
        session_id = %session.id,
        filename = %filename,
        "Transcript exported"
    );

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "text/plain; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        transcript,
    ))
}
