// src/profile/validators.rs

use super::models::UpdateProfileRequest;
use crate::auth::validators::VALID_ROLES;
use crate::common::{ValidationResult, Validator};

pub struct ProfileValidator;

impl Validator<UpdateProfileRequest> for ProfileValidator {
    fn validate(&self, data: &UpdateProfileRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        match &data.role {
            None => result.add_error("general", "at least one field must be provided"),
            Some(role) => {
                if !VALID_ROLES.contains(&role.as_str()) {
                    result.add_error("role", "must be one of: student, teacher");
                }
            }
        }

        result
    }
}
