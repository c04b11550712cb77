//! Authentication handlers

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::extract::{Extension, Json};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::extractors::AuthedUser;
use super::models::{Claims, LoginRequest, SignupRequest, User};
use super::validators::SignupValidator;
use crate::common::{safe_email_log, ApiError, AppState, Validator};

/// POST /api/auth/signup
/// Creates an account and its profile row, then returns a session token.
///
/// The profile row is inserted in the same transaction as the account row,
/// mirroring the database trigger the hosted backend used: a new signup
/// always has a profile, role defaulting to "student".
///
/// # Request Body
/// ```json
/// {
///   "email": "maria@school.edu",
///   "password": "correct-horse",
///   "role": "teacher"
/// }
/// ```
///
/// # Response
/// ```json
/// {
///   "token": "<jwt token>",
///   "user": { "id": "...", "email": "...", "role": "teacher" }
/// }
/// ```
pub async fn signup_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation = SignupValidator.validate(&payload);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let email = payload.email.trim().to_lowercase();
    let role = payload.role.unwrap_or_else(|| "student".to_string());

    // Reject duplicate accounts up front for a friendlier error than the
    // UNIQUE constraint failure
    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    if existing.is_some() {
        warn!(
            email = %safe_email_log(&email),
            "Signup rejected: email already registered"
        );
        return Err(ApiError::Conflict("email already registered".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user_id = Uuid::new_v4().to_string();

    let mut tx = state.db.begin().await.map_err(ApiError::DatabaseError)?;

    sqlx::query("INSERT INTO users (id, email, password_hash) VALUES (?, ?, ?)")
        .bind(&user_id)
        .bind(&email)
        .bind(&password_hash)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                email = %safe_email_log(&email),
                "Database error inserting new user during signup"
            );
            ApiError::DatabaseError(e)
        })?;

    sqlx::query("INSERT INTO user_profiles (id, email, role) VALUES (?, ?, ?)")
        .bind(&user_id)
        .bind(&email)
        .bind(&role)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                user_id = %user_id,
                "Database error inserting profile row during signup"
            );
            ApiError::DatabaseError(e)
        })?;

    tx.commit().await.map_err(ApiError::DatabaseError)?;

    let token = issue_token(&user_id, &state.jwt_secret)?;

    info!(
        user_id = %user_id,
        email = %safe_email_log(&email),
        role = %role,
        "New user account created"
    );

    let resp = serde_json::json!({
        "token": token,
        "user": {
            "id": user_id,
            "email": email,
            "role": role,
        },
    });

    Ok(Json(resp))
}

/// POST /api/auth/login
/// Verifies email/password and returns a session token.
///
/// # Response
/// ```json
/// {
///   "token": "<jwt token>",
///   "user": { "id": "...", "email": "...", "role": "student" }
/// }
/// ```
pub async fn login_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let email = payload.email.trim().to_lowercase();

    let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                email = %safe_email_log(&email),
                "Database error looking up user during login"
            );
            ApiError::DatabaseError(e)
        })?;

    // Same error for unknown email and wrong password
    let user = match user {
        Some(u) => u,
        None => {
            warn!(
                email = %safe_email_log(&email),
                "Login failed: unknown email"
            );
            return Err(ApiError::Unauthorized("invalid email or password".to_string()));
        }
    };

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(
            user_id = %user.id,
            email = %safe_email_log(&email),
            "Login failed: password mismatch"
        );
        return Err(ApiError::Unauthorized("invalid email or password".to_string()));
    }

    let role = fetch_role(&state.db, &user.id).await;
    let token = issue_token(&user.id, &state.jwt_secret)?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        role = %role,
        "User login successful"
    );

    let resp = serde_json::json!({
        "token": token,
        "user": {
            "id": user.id,
            "email": user.email,
            "role": role,
        },
    });

    Ok(Json(resp))
}

/// POST /api/auth/logout
/// Logout endpoint - since we're using JWT tokens, logout is handled client-side
/// This endpoint just returns success to confirm the logout request
pub async fn logout_handler(_authed: AuthedUser) -> Result<Json<serde_json::Value>, ApiError> {
    info!("User logout successful");
    let resp = serde_json::json!({
        "message": "Logout successful"
    });
    Ok(Json(resp))
}

/// GET /api/me
/// Returns the current authenticated user's information
#[axum::debug_handler]
pub async fn me_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    // In dev mode, return the dev user directly without database lookup
    if state.dev_mode.is_enabled() {
        let dev_user = state.dev_mode.create_dev_user();
        let resp = serde_json::json!({
            "user": dev_user,
            "role": authed.role,
        });
        return Ok(Json(resp));
    }

    // Production mode: fetch user from database
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&authed.id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let resp = serde_json::json!({
        "user": user,
        "role": authed.role,
    });
    Ok(Json(resp))
}

// ---- Helper Functions ----

/// Hash a password with Argon2id and a random salt
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "Password hashing failed");
            ApiError::InternalServer("password hashing failed".to_string())
        })
}

/// Verify a password against a stored Argon2 hash
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            error!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

/// Create a 24h session token for a user
pub fn issue_token(user_id: &str, secret: &str) -> Result<String, ApiError> {
    let exp = (Utc::now() + Duration::hours(24)).timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!(error = %e, user_id = %user_id, "JWT encoding error");
        ApiError::InternalServer("jwt error".to_string())
    })
}

/// Validate a JWT token and return the claims
/// This is used by the WebSocket handlers for authentication
pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        warn!(error = %e, "JWT validation failed");
        ApiError::Unauthorized("Invalid token".to_string())
    })?;

    Ok(token_data.claims)
}

/// Look up a user's role, defaulting to "student" when the profile row is
/// missing or the query fails. Profile lookups are never allowed to fail an
/// otherwise-authenticated request.
pub async fn fetch_role(pool: &SqlitePool, user_id: &str) -> String {
    match sqlx::query_scalar::<_, String>("SELECT role FROM user_profiles WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
    {
        Ok(Some(role)) => role,
        Ok(None) => {
            warn!(user_id = %user_id, "Profile row missing, defaulting role to student");
            "student".to_string()
        }
        Err(e) => {
            warn!(
                error = %e,
                user_id = %user_id,
                "Profile lookup failed, defaulting role to student"
            );
            "student".to_string()
        }
    }
}
