// src/profile/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Profile Models
// ============================================================================

/// The role-bearing profile row, one per account.
///
/// Mirrors the hosted backend's `user_profiles` table: the id is the auth
/// user's UUID, and role is constrained to student/teacher.
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub role: String,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub role: Option<String>,
}
