// src/auth/validators.rs

use super::models::SignupRequest;
use crate::common::{validation, ValidationResult, Validator};

pub const VALID_ROLES: &[&str] = &["student", "teacher"];
pub const MIN_PASSWORD_LENGTH: usize = 8;

pub struct SignupValidator;

impl Validator<SignupRequest> for SignupValidator {
    fn validate(&self, data: &SignupRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.require_non_empty("email", &data.email);
        if !data.email.trim().is_empty() && !validation::is_valid_email(data.email.trim()) {
            result.add_error("email", "must be a valid email address");
        }

        if data.password.len() < MIN_PASSWORD_LENGTH {
            result.add_error(
                "password",
                &format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
            );
        }

        if let Some(role) = &data.role {
            if !VALID_ROLES.contains(&role.as_str()) {
                result.add_error("role", "must be one of: student, teacher");
            }
        }

        result
    }
}
