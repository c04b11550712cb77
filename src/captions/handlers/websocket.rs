// src/captions/handlers/websocket.rs

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, WebSocketUpgrade,
    },
    response::IntoResponse,
    Extension,
};
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, warn};

use super::super::models::CaptionWsMessage;
use super::super::services::{ConnectionManager, TranscriptService};
use super::super::validators::validate_segment_text;
use super::sessions::fetch_owned_session;
use crate::common::helpers::safe_token_log;
use crate::common::{generate_connection_id, ApiError, AppState};

/// WebSocket upgrade handler for live captioning
///
/// Browsers cannot set an Authorization header on a WebSocket handshake, so
/// the JWT rides in the query string along with the target session id.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let token = params
        .get("token")
        .ok_or_else(|| ApiError::Unauthorized("Missing authentication token".to_string()))?;
    let session_id = params
        .get("session_id")
        .cloned()
        .ok_or_else(|| ApiError::BadRequest("Missing session_id".to_string()))?;

    let state = state_lock.read().await.clone();
    let claims = crate::auth::handlers::validate_jwt(token, &state.jwt_secret)?;

    debug!(
        token = %safe_token_log(token),
        session_id = %session_id,
        "Caption WebSocket token validated"
    );

    // The session must exist, belong to the caller, and still be open
    let session = fetch_owned_session(&state.db, &session_id, &claims.sub).await?;
    if session.status != "active" {
        return Err(ApiError::BadRequest(
            "caption session already ended".to_string(),
        ));
    }

    info!(
        user_id = %claims.sub,
        session_id = %session.id,
        "Caption WebSocket connection authenticated"
    );

    let user_id = claims.sub;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, user_id, session.id, state_lock)))
}

/// Handle WebSocket connection
async fn handle_socket(
    socket: WebSocket,
    user_id: String,
    session_id: String,
    state_lock: Arc<RwLock<AppState>>,
) {
    let connection_id = generate_connection_id();

    info!(
        user_id = %user_id,
        session_id = %session_id,
        connection_id = %connection_id,
        "Caption WebSocket connection established"
    );

    let state = state_lock.read().await.clone();
    let connection_manager = state.connection_manager.clone();
    let transcript_service = TranscriptService::new(state.db.clone());

    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    // Create a channel for sending messages to this connection
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    // Register the connection
    connection_manager
        .register(
            user_id.clone(),
            session_id.clone(),
            connection_id.clone(),
            tx.clone(),
        )
        .await;

    // Send connected message
    let connected_msg = CaptionWsMessage::Connected {
        session_id: session_id.clone(),
    };
    if let Ok(json) = serde_json::to_string(&connected_msg) {
        let _ = sender.send(Message::Text(json)).await;
    }

    // Spawn task to send messages from the channel to the WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Spawn task to receive messages from the WebSocket
    let session_id_clone = session_id.clone();
    let connection_id_clone = connection_id.clone();
    let connection_manager_clone = connection_manager.clone();

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Err(e) = handle_message(
                msg,
                &session_id_clone,
                &connection_id_clone,
                &connection_manager_clone,
                &transcript_service,
            )
            .await
            {
                error!(
                    session_id = %session_id_clone,
                    connection_id = %connection_id_clone,
                    error = %e,
                    "Error handling caption WebSocket message"
                );

                let error_msg = CaptionWsMessage::Error {
                    code: "SEGMENT_ERROR".to_string(),
                    message: e.to_string(),
                };
                let _ = connection_manager_clone
                    .send_to_connection(&connection_id_clone, error_msg)
                    .await;
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    // Cleanup: unregister connection
    connection_manager.unregister(&connection_id).await;

    info!(
        user_id = %user_id,
        session_id = %session_id,
        connection_id = %connection_id,
        "Caption WebSocket connection closed"
    );
}

/// Handle individual WebSocket messages
async fn handle_message(
    msg: Message,
    session_id: &str,
    connection_id: &str,
    connection_manager: &ConnectionManager,
    transcript_service: &TranscriptService,
) -> Result<(), ApiError> {
    match msg {
        Message::Text(text) => {
            let ws_msg: CaptionWsMessage = serde_json::from_str(&text)
                .map_err(|e| ApiError::BadRequest(format!("Invalid message format: {}", e)))?;

            handle_caption_message(
                ws_msg,
                session_id,
                connection_id,
                connection_manager,
                transcript_service,
            )
            .await?;
        }
        Message::Binary(_) => {
            warn!(
                connection_id = %connection_id,
                "Received unsupported binary message"
            );
            return Err(ApiError::BadRequest(
                "Binary messages not supported".to_string(),
            ));
        }
        Message::Ping(_) | Message::Pong(_) => {
            connection_manager.update_heartbeat(connection_id).await;
        }
        Message::Close(_) => {
            debug!(connection_id = %connection_id, "Received close message");
        }
    }

    Ok(())
}

/// Handle parsed caption messages
async fn handle_caption_message(
    msg: CaptionWsMessage,
    session_id: &str,
    connection_id: &str,
    connection_manager: &ConnectionManager,
    transcript_service: &TranscriptService,
) -> Result<(), ApiError> {
    match msg {
        CaptionWsMessage::Segment { text, is_final } => {
            validate_segment_text(&text)?;

            if is_final {
                // Persist and acknowledge to every client on the session
                let segment = transcript_service.append_segment(session_id, &text).await?;
                let _ = connection_manager
                    .send_to_session(session_id, CaptionWsMessage::SegmentSaved { segment })
                    .await;
            } else {
                // Interim results are display-only; echo without storing
                let _ = connection_manager
                    .send_to_session(session_id, CaptionWsMessage::Interim { text })
                    .await;
            }
        }
        CaptionWsMessage::Ping => {
            connection_manager.update_heartbeat(connection_id).await;
            connection_manager
                .send_to_connection(connection_id, CaptionWsMessage::Pong)
                .await
                .map_err(ApiError::InternalServer)?;
        }
        _ => {
            warn!(
                connection_id = %connection_id,
                message_type = ?msg,
                "Received unsupported message type from client"
            );
        }
    }

    Ok(())
}
