// src/profile/routes.rs

use axum::{routing::get, Router};

use super::handlers;

pub fn profile_routes() -> Router {
    Router::new().route(
        "/api/profile",
        get(handlers::profile_handler).put(handlers::update_profile_handler),
    )
}
