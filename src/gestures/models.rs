// src/gestures/models.rs

use serde::{Deserialize, Serialize};

use super::classifier::FingerDistances;

/// One tracked point from the browser's hand-landmark model, in the
/// normalized coordinates the model emits (x/y in [0, 1], z relative depth).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

// Request models for gesture endpoints
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub landmarks: Vec<Landmark>,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub code: Option<String>,
    pub distances: FingerDistances,
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub codes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub phrase: String,
}

// ============================================================================
// WebSocket Messages
// ============================================================================

/// Messages flowing over the gesture translation socket, both directions.
///
/// The client sends one `frame` per animation frame; the server classifies
/// and smooths, emitting `code_committed` when a letter stabilizes and the
/// final `phrase` on `finish`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureWsMessage {
    // Server -> client
    Connected,
    CodeCommitted {
        code: String,
        sequence: Vec<String>,
    },
    Phrase {
        text: String,
    },
    Pong,
    Error {
        code: String,
        message: String,
    },
    // Client -> server
    Frame {
        landmarks: Vec<Landmark>,
    },
    Finish,
    Reset,
    Ping,
}
