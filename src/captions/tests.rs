//! Tests for captions module
//!
//! These tests verify core captioning functionality including:
//! - Session model structure
//! - Session and segment validators
//! - WebSocket message serialization

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::common::Validator;

    #[test]
    fn test_caption_session_model_structure() {
        let session = models::CaptionSession {
            id: "C_K7NP3X".to_string(),
            user_id: "user-123".to_string(),
            title: "Biology Lecture".to_string(),
            language: "en-US".to_string(),
            status: "active".to_string(),
            transcript: String::new(),
            created_at: None,
            updated_at: None,
            ended_at: None,
        };

        assert_eq!(session.title, "Biology Lecture");
        assert_eq!(session.status, "active");
    }

    #[test]
    fn test_session_validator_accepts_valid_request() {
        let request = models::CreateSessionRequest {
            title: "Biology Lecture".to_string(),
            language: Some("en-US".to_string()),
        };

        let result = validators::SessionValidator.validate(&request);
        assert!(result.is_valid);
    }

    #[test]
    fn test_session_validator_rejects_empty_title() {
        let request = models::CreateSessionRequest {
            title: "   ".to_string(),
            language: None,
        };

        let result = validators::SessionValidator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "title"));
    }

    #[test]
    fn test_session_validator_rejects_bad_language_tag() {
        let request = models::CreateSessionRequest {
            title: "Lecture".to_string(),
            language: Some("not a language".to_string()),
        };

        let result = validators::SessionValidator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "language"));
    }

    #[test]
    fn test_validate_segment_text() {
        assert!(validators::validate_segment_text("hello world").is_ok());
        assert!(validators::validate_segment_text("  ").is_err());

        let too_long = "x".repeat(validators::MAX_SEGMENT_LENGTH + 1);
        assert!(validators::validate_segment_text(&too_long).is_err());
    }

    #[test]
    fn test_ws_message_round_trip() {
        let msg = models::CaptionWsMessage::Segment {
            text: "good morning".to_string(),
            is_final: true,
        };

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"segment\""));

        let parsed: models::CaptionWsMessage = serde_json::from_str(&json).unwrap();
        match parsed {
            models::CaptionWsMessage::Segment { text, is_final } => {
                assert_eq!(text, "good morning");
                assert!(is_final);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_ws_message_rejects_unknown_type() {
        let result =
            serde_json::from_str::<models::CaptionWsMessage>(r#"{"type":"mystery"}"#);
        assert!(result.is_err());
    }
}
