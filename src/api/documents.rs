//! Document access-check endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    services::access_policy::AccessDecision,
};

use super::AuthenticatedUser;

/// Role-aware access probe response
#[derive(Serialize, ToSchema)]
pub struct AccessCheckResponse {
    /// Whether the caller may preview the document right now
    pub has_access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Student-facing access probe response with cooldown context
#[derive(Serialize, ToSchema)]
pub struct StudentAccessResponse {
    pub success: bool,
    pub can_access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_in_cooldown: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_remaining: Option<i64>,
}

/// Check whether the caller may preview a document (role-aware probe)
#[utoipa::path(
    get,
    path = "/documents/{id}/access",
    tag = "documents",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Access evaluation result", body = AccessCheckResponse)
    )
)]
pub async fn check_access(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(document_id): Path<i32>,
) -> AppResult<Json<AccessCheckResponse>> {
    let decision = match state.services.access_policy.evaluate(document_id, &claims).await {
        Ok(decision) => decision,
        Err(AppError::NotFound(msg)) => {
            return Ok(Json(AccessCheckResponse {
                has_access: false,
                error: Some(msg),
            }))
        }
        Err(e) => return Err(e),
    };

    let response = match decision {
        AccessDecision::Granted => AccessCheckResponse {
            has_access: true,
            error: None,
        },
        AccessDecision::Denied(reason) => AccessCheckResponse {
            has_access: false,
            error: Some(reason.message()),
        },
    };

    Ok(Json(response))
}

/// Check document access for the calling student, with cooldown context
#[utoipa::path(
    get,
    path = "/documents/{id}/access/student",
    tag = "documents",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Access evaluation result", body = StudentAccessResponse)
    )
)]
pub async fn check_access_student(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(document_id): Path<i32>,
) -> AppResult<Json<StudentAccessResponse>> {
    let decision = match state.services.access_policy.evaluate(document_id, &claims).await {
        Ok(decision) => decision,
        Err(AppError::NotFound(msg)) => {
            return Ok(Json(StudentAccessResponse {
                success: false,
                can_access: false,
                error: Some(msg),
                is_in_cooldown: None,
                hours_remaining: None,
            }))
        }
        Err(e) => return Err(e),
    };

    let response = match decision {
        AccessDecision::Granted => StudentAccessResponse {
            success: true,
            can_access: true,
            error: None,
            is_in_cooldown: None,
            hours_remaining: None,
        },
        AccessDecision::Denied(reason) => StudentAccessResponse {
            success: false,
            can_access: false,
            is_in_cooldown: Some(reason.is_cooldown()),
            hours_remaining: reason.hours_remaining(),
            error: Some(reason.message()),
        },
    };

    Ok(Json(response))
}
