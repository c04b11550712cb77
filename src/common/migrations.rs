// src/common/migrations.rs
//! Database migration and schema management

use sqlx::SqlitePool;
use std::env;
use tracing::{info, warn};

/// Run all database migrations
///
/// Tables are created if missing. Set RESET_DB=true to drop and recreate the
/// whole schema (no legacy preservation).
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let should_reset_db = env::var("RESET_DB").unwrap_or_else(|_| "false".to_string()) == "true";

    if should_reset_db {
        warn!("⚠️  RESET_DB=true - Dropping all tables and recreating schema...");
        drop_all_tables(pool).await?;
        info!("✅ Dropped old tables");
    } else {
        info!("ℹ️  Skipping table drop (RESET_DB not set). Tables will be created if they don't exist.");
    }

    create_auth_tables(pool).await?;
    create_caption_tables(pool).await?;
    create_system_tables(pool).await?;
    create_indexes(pool).await?;

    // Initialize default settings from environment variables
    init_default_settings(pool).await?;

    info!("✅ Database migration completed successfully!");
    info!("📊 Created all tables with performance indexes");

    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Drop tables in reverse dependency order
    let tables = vec![
        "caption_segments",
        "caption_sessions",
        "user_profiles",
        "users",
        "system_settings",
    ];

    for table in tables {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await?;
    }

    sqlx::query("DROP TRIGGER IF EXISTS user_profiles_updated_at")
        .execute(pool)
        .await?;

    Ok(())
}

/// Auth tables: account credentials plus the role-bearing profile row.
///
/// `user_profiles.id` references `users.id` with ON DELETE CASCADE and the
/// role column carries a CHECK constraint restricting it to student/teacher.
/// `updated_at` is maintained by a trigger so handlers never have to remember
/// to stamp it.
async fn create_auth_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_profiles (
            id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
            email TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'student' CHECK (role IN ('student', 'teacher')),
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS user_profiles_updated_at
        AFTER UPDATE ON user_profiles
        FOR EACH ROW
        BEGIN
            UPDATE user_profiles SET updated_at = datetime('now') WHERE id = NEW.id;
        END
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Caption tables: one row per live-captioning session, one row per final
/// recognized segment. `transcript` holds the auto-saved snapshot the client
/// pushes while a session is open.
async fn create_caption_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS caption_sessions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            language TEXT NOT NULL DEFAULT 'en-US',
            status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'ended')),
            transcript TEXT NOT NULL DEFAULT '',
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            ended_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS caption_segments (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES caption_sessions(id) ON DELETE CASCADE,
            seq INTEGER NOT NULL,
            text TEXT NOT NULL,
            is_final INTEGER NOT NULL DEFAULT 1,
            recognized_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_system_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS system_settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            description TEXT,
            updated_at TEXT DEFAULT (datetime('now')),
            updated_by TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let indexes = vec![
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email)",
        "CREATE INDEX IF NOT EXISTS idx_caption_sessions_user ON caption_sessions(user_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_caption_segments_session ON caption_segments(session_id, seq)",
    ];

    for index in indexes {
        sqlx::query(index).execute(pool).await?;
    }

    Ok(())
}

/// Initialize default system settings from environment variables
/// Only sets values if they don't already exist in the database
async fn init_default_settings(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let settings = vec![
        ("default_caption_language", "DEFAULT_CAPTION_LANGUAGE"),
        ("rate_limit_enabled", "RATE_LIMIT_ENABLED"),
        ("rate_limit_authenticated_per_minute", "RATE_LIMIT_AUTHENTICATED"),
        ("rate_limit_anonymous_per_minute", "RATE_LIMIT_ANONYMOUS"),
        ("rate_limit_per_ip_per_minute", "RATE_LIMIT_PER_IP"),
        ("rate_limit_window_seconds", "RATE_LIMIT_WINDOW_SECONDS"),
        ("rate_limit_whitelist_ips", "RATE_LIMIT_WHITELIST_IPS"),
    ];

    for (db_key, env_key) in settings {
        if let Ok(value) = env::var(env_key) {
            if !value.is_empty() {
                // Check if setting already exists
                let existing: Option<(String,)> =
                    sqlx::query_as("SELECT value FROM system_settings WHERE key = ?")
                        .bind(db_key)
                        .fetch_optional(pool)
                        .await?;

                if existing.is_none() {
                    sqlx::query(
                        r#"
                        INSERT INTO system_settings (key, value, updated_at, updated_by)
                        VALUES (?, ?, datetime('now'), 'system')
                        "#,
                    )
                    .bind(db_key)
                    .bind(&value)
                    .execute(pool)
                    .await?;

                    info!(key = %db_key, "Initialized setting from environment variable");
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_pool() -> SqlitePool {
        // Single connection: every pool connection gets its own :memory: db
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_migrations_create_schema() {
        let pool = setup_pool().await;
        run_migrations(&pool).await.unwrap();

        // All tables exist and are queryable
        for table in [
            "users",
            "user_profiles",
            "caption_sessions",
            "caption_segments",
            "system_settings",
        ] {
            sqlx::query(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&pool)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_role_check_constraint() {
        let pool = setup_pool().await;
        run_migrations(&pool).await.unwrap();

        sqlx::query("INSERT INTO users (id, email, password_hash) VALUES ('u1', 'a@b.co', 'x')")
            .execute(&pool)
            .await
            .unwrap();

        let bad_role = sqlx::query(
            "INSERT INTO user_profiles (id, email, role) VALUES ('u1', 'a@b.co', 'admin')",
        )
        .execute(&pool)
        .await;
        assert!(bad_role.is_err(), "role outside student/teacher must be rejected");

        sqlx::query("INSERT INTO user_profiles (id, email, role) VALUES ('u1', 'a@b.co', 'teacher')")
            .execute(&pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_updated_at_trigger() {
        let pool = setup_pool().await;
        run_migrations(&pool).await.unwrap();

        sqlx::query("INSERT INTO users (id, email, password_hash) VALUES ('u1', 'a@b.co', 'x')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO user_profiles (id, email, role, updated_at) VALUES ('u1', 'a@b.co', 'student', '2000-01-01 00:00:00')",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query("UPDATE user_profiles SET role = 'teacher' WHERE id = 'u1'")
            .execute(&pool)
            .await
            .unwrap();

        let (updated_at,): (String,) =
            sqlx::query_as("SELECT updated_at FROM user_profiles WHERE id = 'u1'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_ne!(updated_at, "2000-01-01 00:00:00");
    }
}
