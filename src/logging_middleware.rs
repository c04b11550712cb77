// src/logging_middleware.rs
//! Middleware for logging request and response bodies in debug mode

use axum::body::to_bytes;
use axum::{
    body::Body,
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Bodies above this size are passed through without logging
const MAX_LOGGED_BODY_BYTES: usize = 64 * 1024;

/// Middleware to log request and response bodies in debug mode
///
/// WebSocket upgrade requests are passed through untouched: buffering an
/// upgrade would break the handshake.
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    if request.headers().contains_key(header::UPGRADE) {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();

    // Read request body
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    // Log request body if not empty
    if !bytes.is_empty() && bytes.len() <= MAX_LOGGED_BODY_BYTES {
        if let Ok(body_str) = std::str::from_utf8(&bytes) {
            // Try to parse as JSON for pretty printing
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(body_str) {
                debug!(
                    method = %parts.method,
                    uri = %parts.uri,
                    request_body = %serde_json::to_string_pretty(&json).unwrap_or_else(|_| body_str.to_string()),
                    "📥 Request"
                );
            } else {
                debug!(
                    method = %parts.method,
                    uri = %parts.uri,
                    request_body = %body_str,
                    "📥 Request"
                );
            }
        }
    }

    // Reconstruct request
    let request = Request::from_parts(parts, Body::from(bytes));

    // Call next middleware/handler
    let response = next.run(request).await;

    // Switching-protocols responses have no body to log
    if response.status() == StatusCode::SWITCHING_PROTOCOLS {
        return Ok(response);
    }

    let (parts, body) = response.into_parts();

    // Read response body
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    // Log response body if not empty
    if !bytes.is_empty() && bytes.len() <= MAX_LOGGED_BODY_BYTES {
        if let Ok(body_str) = std::str::from_utf8(&bytes) {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(body_str) {
                debug!(
                    status = %parts.status,
                    response_body = %serde_json::to_string_pretty(&json).unwrap_or_else(|_| body_str.to_string()),
                    "📤 Response"
                );
            } else {
                debug!(
                    status = %parts.status,
                    response_body = %body_str,
                    "📤 Response"
                );
            }
        }
    }

    // Reconstruct response
    let response = Response::from_parts(parts, Body::from(bytes));

    Ok(response)
}
