use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::captions::models::CaptionSegment;
use crate::common::{generate_segment_id, ApiError};

/// Database-backed persistence for caption sessions
///
/// Final recognition results land here as segments with a monotonically
/// increasing `seq`; the assembled transcript is a join of those segments in
/// order. The session row's `transcript` column is an auto-save snapshot the
/// client can overwrite at any time and wins over the assembled text when a
/// session is ended.
pub struct TranscriptService {
    db: SqlitePool,
}

impl TranscriptService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Persist one final recognition result with the next sequence number
    pub async fn append_segment(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<CaptionSegment, ApiError> {
        let next_seq: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM caption_segments WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_one(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        let segment_id = generate_segment_id();

        sqlx::query(
            "INSERT INTO caption_segments (id, session_id, seq, text, is_final) VALUES (?, ?, ?, ?, 1)",
        )
        .bind(&segment_id)
        .bind(session_id)
        .bind(next_seq)
        .bind(text)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        let segment = sqlx::query_as::<_, CaptionSegment>(
            "SELECT * FROM caption_segments WHERE id = ?",
        )
        .bind(&segment_id)
        .fetch_one(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        debug!(
            session_id = %session_id,
            segment_id = %segment.id,
            seq = segment.seq,
            "Caption segment stored"
        );

        Ok(segment)
    }

    /// All final segments of a session in recognition order
    pub async fn get_segments(&self, session_id: &str) -> Result<Vec<CaptionSegment>, ApiError> {
        sqlx::query_as::<_, CaptionSegment>(
            "SELECT * FROM caption_segments WHERE session_id = ? AND is_final = 1 ORDER BY seq",
        )
        .bind(session_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)
    }

    /// Join the final segments into one transcript, one line per segment
    pub async fn assemble_transcript(&self, session_id: &str) -> Result<String, ApiError> {
        let segments = self.get_segments(session_id).await?;
        let lines: Vec<String> = segments.into_iter().map(|s| s.text).collect();
        Ok(lines.join("\n"))
    }

    /// Store an auto-save snapshot pushed by the client
    pub async fn save_snapshot(&self, session_id: &str, transcript: &str) -> Result<(), ApiError> {
        sqlx::query(
            "UPDATE caption_sessions SET transcript = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(transcript)
        .bind(session_id)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        debug!(session_id = %session_id, "Transcript snapshot saved");
        Ok(())
    }

    /// End a session: keep the client's snapshot when present, otherwise fold
    /// the stored segments into the transcript. Returns the final transcript.
    pub async fn finalize(&self, session_id: &str) -> Result<String, ApiError> {
        let snapshot: String =
            sqlx::query_scalar("SELECT transcript FROM caption_sessions WHERE id = ?")
                .bind(session_id)
                .fetch_one(&self.db)
                .await
                .map_err(ApiError::DatabaseError)?;

        let transcript = if snapshot.trim().is_empty() {
            self.assemble_transcript(session_id).await?
        } else {
            snapshot
        };

        sqlx::query(
            r#"
            UPDATE caption_sessions
            SET transcript = ?, status = 'ended', ended_at = datetime('now'),
                updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(&transcript)
        .bind(session_id)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        info!(session_id = %session_id, "Caption session ended");
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::migrations::run_migrations;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup() -> (SqlitePool, String) {
        // Single connection: every pool connection gets its own :memory: db
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();

        sqlx::query("INSERT INTO users (id, email, password_hash) VALUES ('u1', 'a@b.co', 'x')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO caption_sessions (id, user_id, title) VALUES ('C_TEST01', 'u1', 'Lecture')",
        )
        .execute(&pool)
        .await
        .unwrap();

        (pool, "C_TEST01".to_string())
    }

    #[tokio::test]
    async fn test_append_segment_assigns_increasing_seq() {
        let (pool, session_id) = setup().await;
        let service = TranscriptService::new(pool);

        let first = service.append_segment(&session_id, "hello").await.unwrap();
        let second = service.append_segment(&session_id, "world").await.unwrap();

        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 2);
        assert_eq!(first.is_final, 1);
    }

    #[tokio::test]
    async fn test_assemble_transcript_joins_in_order() {
        let (pool, session_id) = setup().await;
        let service = TranscriptService::new(pool);

        service.append_segment(&session_id, "good morning").await.unwrap();
        service.append_segment(&session_id, "welcome to class").await.unwrap();

        let transcript = service.assemble_transcript(&session_id).await.unwrap();
        assert_eq!(transcript, "good morning\nwelcome to class");
    }

    #[tokio::test]
    async fn test_finalize_prefers_snapshot() {
        let (pool, session_id) = setup().await;
        let service = TranscriptService::new(pool);

        service.append_segment(&session_id, "segment text").await.unwrap();
        service
            .save_snapshot(&session_id, "edited by the client")
            .await
            .unwrap();

        let transcript = service.finalize(&session_id).await.unwrap();
        assert_eq!(transcript, "edited by the client");
    }

    #[tokio::test]
    async fn test_finalize_falls_back_to_segments() {
        let (pool, session_id) = setup().await;
        let service = TranscriptService::new(pool.clone());

        service.append_segment(&session_id, "only segments").await.unwrap();

        let transcript = service.finalize(&session_id).await.unwrap();
        assert_eq!(transcript, "only segments");

        let (status,): (String,) =
            sqlx::query_as("SELECT status FROM caption_sessions WHERE id = ?")
                .bind(&session_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(status, "ended");
    }
}
