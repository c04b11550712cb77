//! Tests for profile module
//!
//! These tests verify core profile functionality including:
//! - Profile model structure
//! - Role validators

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::common::Validator;

    #[test]
    fn test_user_profile_model_structure() {
        let profile = models::UserProfile {
            id: "7b0c0bb6-9add-4d31-9f1c-1f0f39f1a3d2".to_string(),
            email: "maria@school.edu".to_string(),
            role: "teacher".to_string(),
            created_at: Some("2024-01-01".to_string()),
            updated_at: None,
        };

        assert_eq!(profile.role, "teacher");
        assert_eq!(profile.email, "maria@school.edu");
    }

    #[test]
    fn test_profile_validator_accepts_valid_role() {
        let request = models::UpdateProfileRequest {
            role: Some("student".to_string()),
        };

        let result = validators::ProfileValidator.validate(&request);
        assert!(result.is_valid);
        assert_eq!(result.errors.len(), 0);
    }

    #[test]
    fn test_profile_validator_rejects_unknown_role() {
        let request = models::UpdateProfileRequest {
            role: Some("principal".to_string()),
        };

        let result = validators::ProfileValidator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "role"));
    }

    #[test]
    fn test_profile_validator_requires_at_least_one_field() {
        let request = models::UpdateProfileRequest { role: None };

        let result = validators::ProfileValidator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "general"));
    }
}
