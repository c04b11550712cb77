// src/profile/handlers.rs

use axum::extract::{Extension, Json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::models::{UpdateProfileRequest, UserProfile};
use super::validators::ProfileValidator;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState, Validator};

/// GET /api/profile - Get the authenticated user's profile
///
/// Queries are scoped to the authenticated user's id, the application-level
/// counterpart of the row-level-security policy on the hosted backend. A
/// missing profile row is healed with a default student row rather than
/// surfacing a 404.
pub async fn profile_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<UserProfile>, ApiError> {
    let state = state_lock.read().await.clone();

    let profile = sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE id = ?")
        .bind(&authed.id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    if let Some(profile) = profile {
        return Ok(Json(profile));
    }

    warn!(user_id = %authed.id, "Profile row missing, creating default student profile");

    sqlx::query("INSERT OR IGNORE INTO user_profiles (id, email, role) VALUES (?, ?, 'student')")
        .bind(&authed.id)
        .bind(&authed.email)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let profile = sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE id = ?")
        .bind(&authed.id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    Ok(Json(profile))
}

/// PUT /api/profile - Update the authenticated user's profile
///
/// Only the owning user can update their row; the role value is validated
/// against the student/teacher set before it reaches the CHECK constraint.
pub async fn update_profile_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let state = state_lock.read().await.clone();

    info!(user_id = %authed.id, "Profile update request received");

    let validation = ProfileValidator.validate(&request);
    if !validation.is_valid {
        return Err(validation.into());
    }

    // Update or insert profile; the updated_at trigger stamps the row
    sqlx::query(
        r#"
        INSERT INTO user_profiles (id, email, role)
        VALUES (?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            role = COALESCE(excluded.role, role)
        "#,
    )
    .bind(&authed.id)
    .bind(&authed.email)
    .bind(request.role.as_deref())
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(
            error = %e,
            user_id = %authed.id,
            "Database error updating profile"
        );
        ApiError::DatabaseError(e)
    })?;

    // Fetch the updated profile
    let profile = sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE id = ?")
        .bind(&authed.id)
        .fetch_one(&state.db)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                user_id = %authed.id,
                "Database error fetching updated profile"
            );
            ApiError::DatabaseError(e)
        })?;

    info!(user_id = %authed.id, role = %profile.role, "Profile updated successfully");

    Ok(Json(profile))
}
