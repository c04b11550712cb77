// Application state shared across all modules

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::common::dev_mode::DevModeConfig;
use crate::services::{RateLimitService, SettingsService};

/// Application state containing the database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub jwt_secret: String,
    pub dev_mode: DevModeConfig,
    pub settings_service: Arc<SettingsService>,
    pub rate_limit_service: Arc<RateLimitService>,
    pub connection_manager: crate::captions::services::ConnectionManager,
}
