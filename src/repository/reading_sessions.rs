//! Reading sessions and access cooldowns repository

use chrono::{DateTime, Duration, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::reading_session::{AccessCooldown, ReadingSession, SessionWithReader},
};

#[derive(Clone)]
pub struct ReadingSessionsRepository {
    pool: Pool<Postgres>,
}

impl ReadingSessionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get session by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<ReadingSession> {
        sqlx::query_as::<_, ReadingSession>("SELECT * FROM reading_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reading session with id {} not found", id)))
    }

    /// Find the open session for a (document, user) pair, if any
    pub async fn find_open(&self, document_id: i32, user_id: i32) -> AppResult<Option<ReadingSession>> {
        let session = sqlx::query_as::<_, ReadingSession>(
            r#"
            SELECT * FROM reading_sessions
            WHERE document_id = $1 AND user_id = $2 AND ended_at IS NULL
            "#,
        )
        .bind(document_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Open a session, reusing the existing open one if a concurrent
    /// request won the race. The partial unique index on
    /// (document_id, user_id) WHERE ended_at IS NULL guarantees at most
    /// one open session per pair.
    pub async fn open(
        &self,
        document_id: i32,
        user_id: i32,
        time_limit_minutes: Option<i32>,
    ) -> AppResult<ReadingSession> {
        let inserted = sqlx::query_as::<_, ReadingSession>(
            r#"
            INSERT INTO reading_sessions (document_id, user_id, started_at, time_limit_minutes)
            VALUES ($1, $2, NOW(), $3)
            ON CONFLICT (document_id, user_id) WHERE ended_at IS NULL DO NOTHING
            RETURNING *
            "#,
        )
        .bind(document_id)
        .bind(user_id)
        .bind(time_limit_minutes)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(session) => Ok(session),
            None => self
                .find_open(document_id, user_id)
                .await?
                .ok_or_else(|| AppError::Internal("Open session vanished during insert".to_string())),
        }
    }

    /// Close a session, persisting its duration and time-limit flag
    pub async fn close(
        &self,
        session_id: i32,
        ended_at: DateTime<Utc>,
        duration_minutes: i32,
        was_time_limit_exceeded: bool,
    ) -> AppResult<ReadingSession> {
        sqlx::query_as::<_, ReadingSession>(
            r#"
            UPDATE reading_sessions
            SET ended_at = $2, duration_minutes = $3, was_time_limit_exceeded = $4
            WHERE id = $1 AND ended_at IS NULL
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(ended_at)
        .bind(duration_minutes)
        .bind(was_time_limit_exceeded)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Open session with id {} not found", session_id)))
    }

    /// Count completed sessions (ended_at set) for a (document, user) pair.
    /// Only these count toward the attempt quota.
    pub async fn count_completed(&self, document_id: i32, user_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM reading_sessions
            WHERE document_id = $1 AND user_id = $2 AND ended_at IS NOT NULL
            "#,
        )
        .bind(document_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Get the cooldown row for a (document, user) pair, if any
    pub async fn get_cooldown(&self, document_id: i32, user_id: i32) -> AppResult<Option<AccessCooldown>> {
        let cooldown = sqlx::query_as::<_, AccessCooldown>(
            "SELECT * FROM access_cooldowns WHERE document_id = $1 AND user_id = $2",
        )
        .bind(document_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(cooldown)
    }

    /// Recount completed sessions and, if the quota is exhausted, upsert
    /// the cooldown in the same transaction. Returns the count and
    /// whether a cooldown was written. Concurrent invocations converge
    /// on one row through the unique-pair upsert.
    pub async fn enforce_attempt_cooldown(
        &self,
        document_id: i32,
        user_id: i32,
        max_attempts: i32,
        cooldown: Duration,
    ) -> AppResult<(i64, bool)> {
        let mut tx = self.pool.begin().await?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM reading_sessions
            WHERE document_id = $1 AND user_id = $2 AND ended_at IS NOT NULL
            "#,
        )
        .bind(document_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let exhausted = count >= max_attempts as i64;
        if exhausted {
            sqlx::query(
                r#"
                INSERT INTO access_cooldowns (document_id, user_id, cooldown_until)
                VALUES ($1, $2, $3)
                ON CONFLICT (document_id, user_id)
                DO UPDATE SET cooldown_until = EXCLUDED.cooldown_until
                "#,
            )
            .bind(document_id)
            .bind(user_id)
            .bind(Utc::now() + cooldown)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok((count, exhausted))
    }

    /// Session totals and listing for a document (admin reporting)
    pub async fn stats(&self, document_id: i32) -> AppResult<(i64, i64, Vec<SessionWithReader>)> {
        let sessions = sqlx::query_as::<_, SessionWithReader>(
            r#"
            SELECT s.id, s.user_id, u.name AS reader_name, s.started_at,
                   s.ended_at, s.duration_minutes, s.was_time_limit_exceeded
            FROM reading_sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.document_id = $1
            ORDER BY s.started_at DESC
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        let total_sessions = sessions.len() as i64;
        let total_minutes = sessions
            .iter()
            .filter_map(|s| s.duration_minutes)
            .map(i64::from)
            .sum();

        Ok((total_sessions, total_minutes, sessions))
    }
}
