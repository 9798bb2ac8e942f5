//! Document access policy engine.
//!
//! Decides, per (document, user) pair, whether a preview may proceed,
//! accounting for restriction flags, role bypass, attempt counts and
//! cooldowns. The decision rules are pure functions; the only side
//! effect is the idempotent cooldown upsert when a reader exhausts
//! their attempts.

use chrono::{DateTime, Duration, Utc};

use crate::{
    error::AppResult,
    models::{document::Document, user::UserClaims, user::UserRole},
    repository::Repository,
};

/// Outcome of an access evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    Denied(DenialReason),
}

/// Why access was denied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    /// Restricted document requested by a student who is not the author
    Restricted,
    /// An unexpired cooldown window is in force
    CooldownActive { hours_remaining: i64 },
    /// The completed-session quota is exhausted; a cooldown has been set
    AttemptsExhausted { cooldown_hours: i64 },
}

impl DenialReason {
    pub fn message(&self) -> String {
        match self {
            DenialReason::Restricted => {
                "This document is restricted. Only the author may preview it.".to_string()
            }
            DenialReason::CooldownActive { hours_remaining } => format!(
                "Access is in cooldown. Try again in {} hours.",
                hours_remaining
            ),
            DenialReason::AttemptsExhausted { cooldown_hours } => format!(
                "Maximum reading attempts reached. Access is blocked for {} hours.",
                cooldown_hours
            ),
        }
    }

    pub fn hours_remaining(&self) -> Option<i64> {
        match self {
            DenialReason::CooldownActive { hours_remaining } => Some(*hours_remaining),
            DenialReason::AttemptsExhausted { cooldown_hours } => Some(*cooldown_hours),
            DenialReason::Restricted => None,
        }
    }

    pub fn is_cooldown(&self) -> bool {
        matches!(
            self,
            DenialReason::CooldownActive { .. } | DenialReason::AttemptsExhausted { .. }
        )
    }
}

/// Whole hours until `until`, rounded up. A window expiring exactly at
/// `now` counts as expired.
pub fn hours_remaining(until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (until - now).num_seconds();
    (secs + 3599) / 3600
}

/// Role and restriction screening. Needs no session state, so the
/// restricted-document denial never touches attempt or cooldown rows.
/// Returns `None` when attempt gating still applies.
pub fn screen(document: &Document, user_id: i32, role: UserRole) -> Option<AccessDecision> {
    // Privileged roles bypass every gate; only students are limited
    if role.is_privileged() {
        return Some(AccessDecision::Granted);
    }
    if document.is_restricted && document.author_student_id != user_id {
        return Some(AccessDecision::Denied(DenialReason::Restricted));
    }
    if document.max_attempts.is_none() {
        return Some(AccessDecision::Granted);
    }
    None
}

/// Attempt and cooldown gating for quota-limited documents. Cooldown
/// expiry is a strict comparison: `cooldown_until == now` is expired.
pub fn gate_attempts(
    max_attempts: i32,
    completed_attempts: i64,
    cooldown_until: Option<DateTime<Utc>>,
    cooldown_hours: i64,
    now: DateTime<Utc>,
) -> AccessDecision {
    if let Some(until) = cooldown_until {
        if until > now {
            return AccessDecision::Denied(DenialReason::CooldownActive {
                hours_remaining: hours_remaining(until, now),
            });
        }
    }
    if completed_attempts >= max_attempts as i64 {
        return AccessDecision::Denied(DenialReason::AttemptsExhausted { cooldown_hours });
    }
    AccessDecision::Granted
}

#[derive(Clone)]
pub struct AccessPolicyService {
    repository: Repository,
    cooldown_hours: i64,
}

impl AccessPolicyService {
    pub fn new(repository: Repository, cooldown_hours: i64) -> Self {
        Self {
            repository,
            cooldown_hours,
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::hours(self.cooldown_hours)
    }

    /// Evaluate access for a previewable document. Invoked both before
    /// a session starts and from the standalone access probes; the
    /// state is re-read on every call so the result reflects the
    /// instant of enforcement.
    ///
    /// Exhausting the quota writes the cooldown as part of the same
    /// check (create-or-refresh on the unique pair), so this check
    /// doubles as enforcement and bookkeeping.
    pub async fn evaluate(&self, document_id: i32, claims: &UserClaims) -> AppResult<AccessDecision> {
        let document = self.repository.documents.get_published(document_id).await?;
        self.evaluate_document(&document, claims).await
    }

    /// Same evaluation against an already-loaded document
    pub async fn evaluate_document(
        &self,
        document: &Document,
        claims: &UserClaims,
    ) -> AppResult<AccessDecision> {
        if let Some(decision) = screen(document, claims.user_id, claims.role) {
            return Ok(decision);
        }
        // screen() returned None, so the quota is set
        let max_attempts = document.max_attempts.unwrap_or(0);

        let now = Utc::now();
        let cooldown = self
            .repository
            .reading_sessions
            .get_cooldown(document.id, claims.user_id)
            .await?;
        let completed = self
            .repository
            .reading_sessions
            .count_completed(document.id, claims.user_id)
            .await?;

        let decision = gate_attempts(
            max_attempts,
            completed,
            cooldown.map(|c| c.cooldown_until),
            self.cooldown_hours,
            now,
        );

        if let AccessDecision::Denied(DenialReason::AttemptsExhausted { .. }) = decision {
            // Recount and upsert atomically; concurrent triggers
            // converge to a single row
            self.repository
                .reading_sessions
                .enforce_attempt_cooldown(document.id, claims.user_id, max_attempts, self.cooldown())
                .await?;
            tracing::info!(
                document_id = document.id,
                user_id = claims.user_id,
                "attempt quota exhausted, cooldown set for {}h",
                self.cooldown_hours
            );
        }

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::{DocumentType, SubmissionStatus};

    fn doc(is_restricted: bool, max_attempts: Option<i32>) -> Document {
        Document {
            id: 1,
            title: "Adaptive Routing in Sensor Networks".to_string(),
            document_type: DocumentType::Thesis,
            author_student_id: 42,
            submission_status: SubmissionStatus::Published,
            published_at: Some(Utc::now()),
            is_restricted,
            time_limit_minutes: Some(30),
            max_attempts,
        }
    }

    #[test]
    fn test_privileged_roles_bypass_everything() {
        let d = doc(true, Some(1));
        for role in [UserRole::Staff, UserRole::Admin, UserRole::SuperAdmin] {
            assert_eq!(screen(&d, 7, role), Some(AccessDecision::Granted));
        }
    }

    #[test]
    fn test_restricted_denies_non_owner_student() {
        let d = doc(true, Some(3));
        assert_eq!(
            screen(&d, 7, UserRole::Student),
            Some(AccessDecision::Denied(DenialReason::Restricted))
        );
        // The owning student falls through to attempt gating
        assert_eq!(screen(&d, 42, UserRole::Student), None);
    }

    #[test]
    fn test_no_quota_means_no_tracking() {
        let d = doc(false, None);
        assert_eq!(screen(&d, 7, UserRole::Student), Some(AccessDecision::Granted));
    }

    #[test]
    fn test_attempts_below_quota_allowed() {
        let now = Utc::now();
        assert_eq!(gate_attempts(2, 0, None, 24, now), AccessDecision::Granted);
        assert_eq!(gate_attempts(2, 1, None, 24, now), AccessDecision::Granted);
    }

    #[test]
    fn test_quota_exhaustion_denied() {
        let now = Utc::now();
        let decision = gate_attempts(2, 2, None, 24, now);
        assert_eq!(
            decision,
            AccessDecision::Denied(DenialReason::AttemptsExhausted { cooldown_hours: 24 })
        );
        if let AccessDecision::Denied(reason) = decision {
            assert!(reason.message().contains("24 hours"));
        }
    }

    #[test]
    fn test_active_cooldown_denied_with_ceil_hours() {
        let now = Utc::now();
        let until = now + Duration::minutes(90);
        match gate_attempts(2, 2, Some(until), 24, now) {
            AccessDecision::Denied(DenialReason::CooldownActive { hours_remaining }) => {
                assert_eq!(hours_remaining, 2);
            }
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[test]
    fn test_cooldown_expiring_now_is_expired() {
        let now = Utc::now();
        // Strict inequality: an expired window falls through to the
        // attempt count, which here is back under quota
        assert_eq!(gate_attempts(2, 1, Some(now), 24, now), AccessDecision::Granted);
    }

    #[test]
    fn test_expired_cooldown_with_exhausted_quota_refreshes() {
        let now = Utc::now();
        let until = now - Duration::hours(1);
        assert_eq!(
            gate_attempts(2, 2, Some(until), 24, now),
            AccessDecision::Denied(DenialReason::AttemptsExhausted { cooldown_hours: 24 })
        );
    }

    #[test]
    fn test_hours_remaining_rounds_up() {
        let now = Utc::now();
        assert_eq!(hours_remaining(now + Duration::hours(24), now), 24);
        assert_eq!(hours_remaining(now + Duration::minutes(61), now), 2);
        assert_eq!(hours_remaining(now + Duration::seconds(1), now), 1);
    }
}
