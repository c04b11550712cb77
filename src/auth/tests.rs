//! Tests for auth module
//!
//! These tests verify core authentication functionality including:
//! - JWT token validation
//! - Password hashing
//! - Signup request validation

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::common::Validator;
    use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

    #[test]
    fn test_claims_structure() {
        // Test that Claims can be created and serialized
        let claims = models::Claims {
            sub: "test-user-id".to_string(),
            exp: 1234567890,
        };

        assert_eq!(claims.sub, "test-user-id");
        assert_eq!(claims.exp, 1234567890);
    }

    #[test]
    fn test_jwt_encoding_and_decoding() {
        // Test JWT token creation and validation
        let secret = "test_secret_key";
        let claims = models::Claims {
            sub: "test-user-123".to_string(),
            exp: 9999999999, // Far future
        };

        // Encode
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("Failed to encode token");

        // Decode
        let decoded = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .expect("Failed to decode token");

        assert_eq!(decoded.claims.sub, "test-user-123");
        assert_eq!(decoded.claims.exp, 9999999999);
    }

    #[test]
    fn test_jwt_validation_fails_with_wrong_secret() {
        // Test that JWT validation fails with incorrect secret
        let secret = "test_secret_key";
        let wrong_secret = "wrong_secret_key";

        let claims = models::Claims {
            sub: "test-user-123".to_string(),
            exp: 9999999999,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("Failed to encode token");

        // Try to decode with wrong secret
        let result = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret(wrong_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        );

        assert!(
            result.is_err(),
            "Token validation should fail with wrong secret"
        );
    }

    #[test]
    fn test_validate_jwt_helper() {
        let secret = "ws_secret";
        let token = handlers::issue_token("user-42", secret).expect("Failed to issue token");

        let claims = handlers::validate_jwt(&token, secret).expect("Token should validate");
        assert_eq!(claims.sub, "user-42");

        assert!(handlers::validate_jwt(&token, "other_secret").is_err());
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = handlers::hash_password("correct-horse-battery").expect("hashing failed");

        // Argon2id PHC string
        assert!(hash.starts_with("$argon2"));
        assert!(handlers::verify_password("correct-horse-battery", &hash));
        assert!(!handlers::verify_password("wrong-password", &hash));
    }

    #[test]
    fn test_verify_password_rejects_malformed_hash() {
        assert!(!handlers::verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_signup_validator_accepts_valid_request() {
        let request = models::SignupRequest {
            email: "maria@school.edu".to_string(),
            password: "long-enough-password".to_string(),
            role: Some("teacher".to_string()),
        };

        let result = validators::SignupValidator.validate(&request);
        assert!(result.is_valid);
        assert_eq!(result.errors.len(), 0);
    }

    #[test]
    fn test_signup_validator_rejects_bad_email() {
        let request = models::SignupRequest {
            email: "not-an-email".to_string(),
            password: "long-enough-password".to_string(),
            role: None,
        };

        let result = validators::SignupValidator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "email"));
    }

    #[test]
    fn test_signup_validator_rejects_short_password() {
        let request = models::SignupRequest {
            email: "maria@school.edu".to_string(),
            password: "short".to_string(),
            role: None,
        };

        let result = validators::SignupValidator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "password"));
    }

    #[test]
    fn test_signup_validator_rejects_unknown_role() {
        let request = models::SignupRequest {
            email: "maria@school.edu".to_string(),
            password: "long-enough-password".to_string(),
            role: Some("admin".to_string()),
        };

        let result = validators::SignupValidator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "role"));
    }
}
