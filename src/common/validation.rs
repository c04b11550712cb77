// Common validation types and traits

use regex::Regex;

#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.is_valid = false;
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// Fail the field when the value is empty or whitespace-only
    pub fn require_non_empty(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add_error(field, "must not be empty");
        }
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
            self.errors.extend(other.errors);
        }
    }
}

pub trait Validator<T> {
    fn validate(&self, data: &T) -> ValidationResult;
}

/// Basic email shape check: local part, one @, dotted domain
pub fn is_valid_email(email: &str) -> bool {
    let re = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid");
    re.is_match(email)
}

/// Language tags the caption pages send: "en", "en-US", "pt-BR", ...
pub fn is_valid_language_tag(tag: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z]{2,3}(-[a-zA-Z0-9]{2,8})*$").expect("language regex is valid");
    re.is_match(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("student@school.edu"));
        assert!(is_valid_email("a.b+c@example.co"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("spaces in@example.com"));
    }

    #[test]
    fn test_is_valid_language_tag() {
        assert!(is_valid_language_tag("en"));
        assert!(is_valid_language_tag("en-US"));
        assert!(is_valid_language_tag("pt-BR"));
        assert!(!is_valid_language_tag("e"));
        assert!(!is_valid_language_tag("english language"));
    }

    #[test]
    fn test_require_non_empty() {
        let mut result = ValidationResult::new();
        result.require_non_empty("title", "  ");
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "title");
    }
}
