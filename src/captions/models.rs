// src/captions/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Caption Session Models
// ============================================================================

/// One live-captioning run. `transcript` is the auto-saved snapshot the
/// client pushes while the session is open; segments are the individual
/// final recognition results.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CaptionSession {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub language: String,
    pub status: String,
    pub transcript: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub ended_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CaptionSegment {
    pub id: String,
    pub session_id: String,
    pub seq: i64,
    pub text: String,
    pub is_final: i64,
    pub recognized_at: Option<String>,
}

// Request models for session management
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub title: String,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveTranscriptRequest {
    pub transcript: String,
}

// ============================================================================
// WebSocket Messages
// ============================================================================

/// Messages flowing over the live captioning socket, both directions.
///
/// The client streams `segment` events as the browser speech recognizer
/// produces results; interim results are echoed back for display, final
/// results are persisted and acknowledged with `segment_saved`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CaptionWsMessage {
    // Server -> client
    Connected {
        session_id: String,
    },
    SegmentSaved {
        segment: CaptionSegment,
    },
    Interim {
        text: String,
    },
    Pong,
    Error {
        code: String,
        message: String,
    },
    // Client -> server
    Segment {
        text: String,
        is_final: bool,
    },
    Ping,
}
