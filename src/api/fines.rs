//! Fine management endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult},
    models::fine::{BookFine, FineStatus},
};

use super::{returns::ActionResponse, AuthenticatedUser};

/// Fine listing filter
#[derive(Debug, Deserialize, IntoParams)]
pub struct FineQuery {
    /// Restrict to a payment status (Unpaid, Partially_Paid, Paid, Waived)
    pub status: Option<String>,
}

/// Fines issued by the calling staff member
#[utoipa::path(
    get,
    path = "/fines",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(FineQuery),
    responses(
        (status = 200, description = "Fines issued by the caller", body = Vec<BookFine>),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn list_fines(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<FineQuery>,
) -> AppResult<Json<Vec<BookFine>>> {
    claims.require_staff()?;

    let status = query
        .status
        .as_deref()
        .map(|s| {
            s.parse::<FineStatus>()
                .map_err(AppError::BadRequest)
        })
        .transpose()?;

    let fines = state.services.returns.fines_for_staff(&claims, status).await?;
    Ok(Json(fines))
}

/// Fines owed by the calling student
#[utoipa::path(
    get,
    path = "/fines/mine",
    tag = "fines",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Fines owed by the caller", body = Vec<BookFine>)
    )
)]
pub async fn list_my_fines(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BookFine>>> {
    let fines = state.services.returns.fines_for_student(&claims).await?;
    Ok(Json(fines))
}

/// Settle a fine issued by the calling staff member
#[utoipa::path(
    post,
    path = "/fines/{id}/pay",
    tag = "fines",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Fine ID")
    ),
    responses(
        (status = 200, description = "Settlement outcome", body = ActionResponse),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn mark_paid(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(fine_id): Path<i32>,
) -> AppResult<Json<ActionResponse>> {
    claims.require_staff()?;

    let response = match state.services.returns.mark_fine_paid(fine_id, &claims).await {
        Ok(message) => ActionResponse {
            success: true,
            message,
        },
        Err(AppError::NotFound(message)) => ActionResponse {
            success: false,
            message,
        },
        Err(e) => return Err(e),
    };

    Ok(Json(response))
}
