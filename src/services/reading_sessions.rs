//! Reading session tracker.
//!
//! Opens and closes timed reading sessions, computes durations, flags
//! time-limit breaches and triggers attempt accounting when a session
//! closes. Per (document, user) a session moves NONE -> OPEN -> CLOSED
//! and never transitions again.

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        reading_session::{ReadingSession, SessionWithReader},
        user::{UserClaims, UserRole},
    },
    repository::Repository,
    services::access_policy::{AccessDecision, AccessPolicyService, DenialReason},
};

/// Outcome of a session-start request
#[derive(Debug)]
pub enum SessionStart {
    Granted(ReadingSession),
    Denied(DenialReason),
}

/// Result of closing a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEnd {
    pub duration_minutes: i32,
    pub was_time_limit_exceeded: bool,
}

/// Whole minutes elapsed between start and end, floored. Clock skew
/// can make the difference negative; clamp to zero.
pub fn duration_minutes(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> i32 {
    ((ended_at - started_at).num_seconds() / 60).max(0) as i32
}

/// A session breaches its limit only when it ran strictly longer
pub fn limit_exceeded(time_limit_minutes: Option<i32>, duration: i32) -> bool {
    time_limit_minutes.map(|limit| duration > limit).unwrap_or(false)
}

#[derive(Clone)]
pub struct ReadingSessionsService {
    repository: Repository,
    access_policy: AccessPolicyService,
}

impl ReadingSessionsService {
    pub fn new(repository: Repository, access_policy: AccessPolicyService) -> Self {
        Self {
            repository,
            access_policy,
        }
    }

    /// Start (or resume) a reading session. The access policy runs
    /// first; on denial nothing is created and the reason propagates.
    /// An existing open session is reused, so a page refresh does not
    /// spawn a second one.
    pub async fn start(&self, document_id: i32, claims: &UserClaims) -> AppResult<SessionStart> {
        let document = self.repository.documents.get_published(document_id).await?;

        match self.access_policy.evaluate_document(&document, claims).await? {
            AccessDecision::Denied(reason) => return Ok(SessionStart::Denied(reason)),
            AccessDecision::Granted => {}
        }

        if let Some(open) = self
            .repository
            .reading_sessions
            .find_open(document_id, claims.user_id)
            .await?
        {
            return Ok(SessionStart::Granted(open));
        }

        // The document's limit is snapshotted onto the session so later
        // admin changes never affect sessions already in flight
        let session = self
            .repository
            .reading_sessions
            .open(document_id, claims.user_id, document.time_limit_minutes)
            .await?;

        tracing::debug!(
            session_id = session.id,
            document_id,
            user_id = claims.user_id,
            "reading session opened"
        );

        Ok(SessionStart::Granted(session))
    }

    /// Close a session. Idempotent: an already-closed session returns
    /// its stored duration and flag without counting another attempt.
    pub async fn end(&self, session_id: i32, claims: &UserClaims) -> AppResult<SessionEnd> {
        let session = self.repository.reading_sessions.get_by_id(session_id).await?;

        if session.user_id != claims.user_id {
            return Err(AppError::Authorization(
                "Session belongs to a different user".to_string(),
            ));
        }

        if !session.is_open() {
            return Ok(SessionEnd {
                duration_minutes: session.duration_minutes.unwrap_or(0),
                was_time_limit_exceeded: session.was_time_limit_exceeded,
            });
        }

        let now = Utc::now();
        let duration = duration_minutes(session.started_at, now);
        let exceeded = limit_exceeded(session.time_limit_minutes, duration);

        let closed = self
            .repository
            .reading_sessions
            .close(session_id, now, duration, exceeded)
            .await?;

        if exceeded {
            tracing::warn!(
                session_id,
                duration,
                limit = ?session.time_limit_minutes,
                "session closed past its time limit"
            );
        }

        // Closing completes the attempt; only students accrue attempts,
        // and the cooldown write here uses the same duration and upsert
        // as the policy engine so the two paths are interchangeable
        if claims.role == UserRole::Student {
            let document = self.repository.documents.get_by_id(closed.document_id).await?;
            if let Some(max_attempts) = document.max_attempts {
                self.repository
                    .reading_sessions
                    .enforce_attempt_cooldown(
                        closed.document_id,
                        claims.user_id,
                        max_attempts,
                        self.access_policy.cooldown(),
                    )
                    .await?;
            }
        }

        Ok(SessionEnd {
            duration_minutes: duration,
            was_time_limit_exceeded: exceeded,
        })
    }

    /// Session totals and listing for a document (admin reporting)
    pub async fn stats(&self, document_id: i32) -> AppResult<(i64, i64, Vec<SessionWithReader>)> {
        // Ensure the document exists so a bad id is a 404, not an empty list
        self.repository.documents.get_by_id(document_id).await?;
        self.repository.reading_sessions.stats(document_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_duration_floors_to_whole_minutes() {
        let start = Utc::now();
        assert_eq!(duration_minutes(start, start + Duration::seconds(59)), 0);
        assert_eq!(duration_minutes(start, start + Duration::seconds(60)), 1);
        assert_eq!(duration_minutes(start, start + Duration::seconds(179)), 2);
    }

    #[test]
    fn test_duration_clamps_negative() {
        let start = Utc::now();
        assert_eq!(duration_minutes(start, start - Duration::minutes(5)), 0);
    }

    #[test]
    fn test_limit_exceeded_is_strict() {
        assert!(!limit_exceeded(Some(30), 30));
        assert!(limit_exceeded(Some(30), 31));
        assert!(!limit_exceeded(None, 10_000));
    }
}
