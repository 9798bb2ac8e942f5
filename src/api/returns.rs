//! Book-return verification endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{reconciliation::VerifyReturnInput, request::PendingReturn},
};

use super::AuthenticatedUser;

/// Outcome of a verification or settlement action
#[derive(Serialize, ToSchema)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

/// Requests awaiting return verification for the calling staff member
#[utoipa::path(
    get,
    path = "/returns/pending",
    tag = "returns",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Requests awaiting verification", body = Vec<PendingReturn>),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn list_pending(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<PendingReturn>>> {
    claims.require_staff()?;

    let pending = state.services.returns.pending_verifications(&claims).await?;
    Ok(Json(pending))
}

/// Verify a returned loan: classify copies as received/damaged/lost,
/// issue fines and update the inventory
#[utoipa::path(
    post,
    path = "/requests/{id}/verify-return",
    tag = "returns",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Request ID")
    ),
    request_body = VerifyReturnInput,
    responses(
        (status = 200, description = "Verification outcome", body = ActionResponse),
        (status = 403, description = "Staff privileges required"),
        (status = 404, description = "Request not found")
    )
)]
pub async fn verify_return(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(request_id): Path<i32>,
    Json(input): Json<VerifyReturnInput>,
) -> AppResult<Json<ActionResponse>> {
    claims.require_staff()?;
    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let response = match state.services.returns.verify(request_id, &claims, &input).await {
        Ok(message) => ActionResponse {
            success: true,
            message,
        },
        Err(AppError::QuantityMismatch(message)) | Err(AppError::NotEligible(message)) => {
            ActionResponse {
                success: false,
                message,
            }
        }
        Err(e) => return Err(e),
    };

    Ok(Json(response))
}
