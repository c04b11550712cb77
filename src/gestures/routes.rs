// src/gestures/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

pub fn gestures_routes() -> Router {
    Router::new()
        .route("/api/gestures/classify", post(handlers::classify_handler))
        .route("/api/gestures/translate", post(handlers::translate_handler))
        .route("/api/gestures/ws", get(handlers::websocket_handler))
}
