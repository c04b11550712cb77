// src/gestures/handlers.rs

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Extension, Json, Query, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::classifier::{
    self, ClassifierError, FingerDistances, GestureSmoother, LETTER_CODES,
};
use super::models::{
    ClassifyRequest, ClassifyResponse, GestureWsMessage, Landmark, TranslateRequest,
    TranslateResponse,
};
use super::phrases::phrase_for_sequence;
use crate::auth::AuthedUser;
use crate::common::helpers::safe_token_log;
use crate::common::{ApiError, AppState};

impl From<ClassifierError> for ApiError {
    fn from(e: ClassifierError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

/// POST /api/gestures/classify - Classify one frame of hand landmarks
///
/// # Request Body
/// ```json
/// { "landmarks": [ { "x": 0.1, "y": 0.2, "z": 0.0 }, ... ] }
/// ```
///
/// # Response
/// ```json
/// { "code": "A", "distances": { "thumb_index": 0.05, ... } }
/// ```
pub async fn classify_handler(
    authed: AuthedUser,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let distances = FingerDistances::from_frame(&request.landmarks)?;
    let code = classifier::classify(&distances);

    debug!(
        user_id = %authed.id,
        code = ?code,
        "Gesture frame classified"
    );

    Ok(Json(ClassifyResponse {
        code: code.map(str::to_string),
        distances,
    }))
}

/// POST /api/gestures/translate - Translate a committed code sequence
///
/// An empty sequence translates to "Unknown gesture"; a sequence with no
/// table entry is spelled out letter-by-letter.
pub async fn translate_handler(
    authed: AuthedUser,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, ApiError> {
    for code in &request.codes {
        if !LETTER_CODES.contains(&code.as_str()) {
            return Err(ApiError::ValidationError(format!(
                "unknown gesture code: {}",
                code
            )));
        }
    }

    let phrase = phrase_for_sequence(&request.codes);

    info!(
        user_id = %authed.id,
        codes = ?request.codes,
        phrase = %phrase,
        "Gesture sequence translated"
    );

    Ok(Json(TranslateResponse { phrase }))
}

/// WebSocket upgrade handler for frame streaming
///
/// The client sends one frame per animation frame; the smoother runs server
/// side so every connected tab sees the same committed sequence.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let token = params
        .get("token")
        .ok_or_else(|| ApiError::Unauthorized("Missing authentication token".to_string()))?;

    let state = state_lock.read().await.clone();
    let claims = crate::auth::handlers::validate_jwt(token, &state.jwt_secret)?;

    debug!(
        token = %safe_token_log(token),
        user_id = %claims.sub,
        "Gesture WebSocket token validated"
    );

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, claims.sub)))
}

/// Per-connection stream loop
///
/// All state is connection-local (one smoother, one committed sequence), so
/// no connection registry is involved: replies only ever go back to the
/// sending client.
async fn handle_socket(socket: WebSocket, user_id: String) {
    info!(user_id = %user_id, "Gesture WebSocket connection established");

    let (mut sender, mut receiver) = socket.split();

    if let Ok(json) = serde_json::to_string(&GestureWsMessage::Connected) {
        let _ = sender.send(Message::Text(json)).await;
    }

    let mut smoother = GestureSmoother::default();
    let mut committed: Vec<String> = Vec::new();

    while let Some(Ok(msg)) = receiver.next().await {
        let reply = match msg {
            Message::Text(text) => match serde_json::from_str::<GestureWsMessage>(&text) {
                Ok(ws_msg) => handle_gesture_message(ws_msg, &mut smoother, &mut committed),
                Err(e) => Some(GestureWsMessage::Error {
                    code: "BAD_MESSAGE".to_string(),
                    message: format!("Invalid message format: {}", e),
                }),
            },
            Message::Close(_) => break,
            _ => None,
        };

        if let Some(reply) = reply {
            if let Ok(json) = serde_json::to_string(&reply) {
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    }

    info!(user_id = %user_id, "Gesture WebSocket connection closed");
}

/// Handle one parsed client message; returns the reply to send, if any
fn handle_gesture_message(
    msg: GestureWsMessage,
    smoother: &mut GestureSmoother,
    committed: &mut Vec<String>,
) -> Option<GestureWsMessage> {
    match msg {
        GestureWsMessage::Frame { landmarks } => handle_frame(&landmarks, smoother, committed),
        GestureWsMessage::Finish => {
            let phrase = phrase_for_sequence(committed);
            smoother.reset();
            committed.clear();
            Some(GestureWsMessage::Phrase { text: phrase })
        }
        GestureWsMessage::Reset => {
            smoother.reset();
            committed.clear();
            None
        }
        GestureWsMessage::Ping => Some(GestureWsMessage::Pong),
        other => {
            warn!(message_type = ?other, "Received unsupported message type from client");
            None
        }
    }
}

fn handle_frame(
    landmarks: &[Landmark],
    smoother: &mut GestureSmoother,
    committed: &mut Vec<String>,
) -> Option<GestureWsMessage> {
    let code = match classifier::classify_frame(landmarks) {
        Ok(code) => code,
        Err(e) => {
            return Some(GestureWsMessage::Error {
                code: "BAD_FRAME".to_string(),
                message: e.to_string(),
            })
        }
    };

    smoother.observe(code).map(|stable| {
        committed.push(stable.to_string());
        GestureWsMessage::CodeCommitted {
            code: stable.to_string(),
            sequence: committed.clone(),
        }
    })
}
