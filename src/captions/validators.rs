// src/captions/validators.rs

use super::models::CreateSessionRequest;
use crate::common::{validation, ApiError, ValidationResult, Validator};

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_SEGMENT_LENGTH: usize = 2000;
pub const MAX_TRANSCRIPT_LENGTH: usize = 200_000;

pub struct SessionValidator;

impl Validator<CreateSessionRequest> for SessionValidator {
    fn validate(&self, data: &CreateSessionRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.require_non_empty("title", &data.title);
        if data.title.len() > MAX_TITLE_LENGTH {
            result.add_error(
                "title",
                &format!("must be at most {} characters", MAX_TITLE_LENGTH),
            );
        }

        if let Some(language) = &data.language {
            if !validation::is_valid_language_tag(language) {
                result.add_error("language", "must be a language tag like 'en' or 'en-US'");
            }
        }

        result
    }
}

/// Validate a single recognized segment before it is stored or echoed
pub fn validate_segment_text(text: &str) -> Result<(), ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::ValidationError(
            "segment text must not be empty".to_string(),
        ));
    }
    if text.len() > MAX_SEGMENT_LENGTH {
        return Err(ApiError::ValidationError(format!(
            "segment text must be at most {} characters",
            MAX_SEGMENT_LENGTH
        )));
    }
    Ok(())
}

/// Validate an auto-save snapshot
pub fn validate_transcript(transcript: &str) -> Result<(), ApiError> {
    if transcript.len() > MAX_TRANSCRIPT_LENGTH {
        return Err(ApiError::ValidationError(format!(
            "transcript must be at most {} characters",
            MAX_TRANSCRIPT_LENGTH
        )));
    }
    Ok(())
}
