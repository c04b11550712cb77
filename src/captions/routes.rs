// src/captions/routes.rs

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{export, sessions, websocket};

pub fn captions_routes() -> Router {
    Router::new()
        // Session routes
        .route(
            "/api/captions/sessions",
            get(sessions::list_sessions).post(sessions::create_session),
        )
        .route(
            "/api/captions/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route(
            "/api/captions/sessions/:id/transcript",
            put(sessions::save_transcript),
        )
        .route("/api/captions/sessions/:id/end", post(sessions::end_session))
        // Transcript download
        .route(
            "/api/captions/sessions/:id/export",
            get(export::export_transcript),
        )
        // Live captioning stream
        .route("/api/captions/ws", get(websocket::websocket_handler))
}
