//! Reading session endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::reading_session::SessionWithReader,
    services::reading_sessions::SessionStart,
};

use super::AuthenticatedUser;

/// Session start response
#[derive(Serialize, ToSchema)]
pub struct StartSessionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_in_cooldown: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_remaining: Option<i64>,
}

/// Session end response
#[derive(Serialize, ToSchema)]
pub struct EndSessionResponse {
    pub success: bool,
    pub duration_minutes: i32,
    pub was_time_limit_exceeded: bool,
}

/// Session stats response (admin reporting)
#[derive(Serialize, ToSchema)]
pub struct SessionStatsResponse {
    pub total_sessions: i64,
    pub total_minutes: i64,
    pub sessions: Vec<SessionWithReader>,
}

/// Start (or resume) a reading session for a document
#[utoipa::path(
    post,
    path = "/documents/{id}/sessions",
    tag = "sessions",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Session started or access denied", body = StartSessionResponse),
        (status = 404, description = "Document not found")
    )
)]
pub async fn start_session(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(document_id): Path<i32>,
) -> AppResult<Json<StartSessionResponse>> {
    let response = match state.services.reading_sessions.start(document_id, &claims).await? {
        SessionStart::Granted(session) => StartSessionResponse {
            success: true,
            session_id: Some(session.id),
            error: None,
            is_in_cooldown: None,
            hours_remaining: None,
        },
        SessionStart::Denied(reason) => StartSessionResponse {
            success: false,
            session_id: None,
            is_in_cooldown: Some(reason.is_cooldown()),
            hours_remaining: reason.hours_remaining(),
            error: Some(reason.message()),
        },
    };

    Ok(Json(response))
}

/// End a reading session. Idempotent: repeating the call returns the
/// same duration without counting another attempt.
#[utoipa::path(
    post,
    path = "/sessions/{id}/end",
    tag = "sessions",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session closed", body = EndSessionResponse),
        (status = 403, description = "Session belongs to another user"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn end_session(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(session_id): Path<i32>,
) -> AppResult<Json<EndSessionResponse>> {
    let outcome = state.services.reading_sessions.end(session_id, &claims).await?;

    Ok(Json(EndSessionResponse {
        success: true,
        duration_minutes: outcome.duration_minutes,
        was_time_limit_exceeded: outcome.was_time_limit_exceeded,
    }))
}

/// Reading statistics for a document (admin only)
#[utoipa::path(
    get,
    path = "/documents/{id}/sessions/stats",
    tag = "sessions",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Session totals and listing", body = SessionStatsResponse),
        (status = 403, description = "Administrator privileges required"),
        (status = 404, description = "Document not found")
    )
)]
pub async fn session_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(document_id): Path<i32>,
) -> AppResult<Json<SessionStatsResponse>> {
    claims.require_admin()?;

    let (total_sessions, total_minutes, sessions) =
        state.services.reading_sessions.stats(document_id).await?;

    Ok(Json(SessionStatsResponse {
        total_sessions,
        total_minutes,
        sessions,
    }))
}
