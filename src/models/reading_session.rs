//! Reading session and access cooldown models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// One attempt by one user to read one document.
///
/// A session counts toward the reader's attempt quota only once
/// `ended_at` is set. Sessions are closed, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReadingSession {
    pub id: i32,
    pub document_id: i32,
    pub user_id: i32,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    /// Snapshot of the document's limit at session start, so later
    /// changes to the document never affect in-flight sessions
    pub time_limit_minutes: Option<i32>,
    pub was_time_limit_exceeded: bool,
}

impl ReadingSession {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// Per (document, user) denial window, unique on the pair and only
/// ever written through an upsert. Expiry is a read-time comparison;
/// rows are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AccessCooldown {
    pub id: i32,
    pub document_id: i32,
    pub user_id: i32,
    pub cooldown_until: DateTime<Utc>,
}

/// Session entry in the admin stats listing
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SessionWithReader {
    pub id: i32,
    pub user_id: i32,
    pub reader_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub was_time_limit_exceeded: bool,
}
