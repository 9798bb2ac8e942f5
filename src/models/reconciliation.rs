//! Return-verification input and the reconciliation plan produced by
//! the returns engine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::book::BookStatus;
use super::fine::FineReason;
use super::request::RequestStatus;

/// Staff-submitted quantity split for a returned loan
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyReturnInput {
    pub damaged_quantity: i32,
    pub lost_quantity: i32,
    pub received_quantity: i32,
    /// Required when any copies are damaged or lost
    #[validate(length(max = 2000, message = "Description too long"))]
    pub damage_description: Option<String>,
    /// Per-book fine amount; required when any copies are damaged or lost
    #[schema(value_type = String)]
    pub fine_amount: Option<Decimal>,
    pub due_date: Option<DateTime<Utc>>,
}

/// One fine to be created by a verification
#[derive(Debug, Clone, PartialEq)]
pub struct FineDraft {
    pub reason: FineReason,
    pub quantity: i32,
    /// Total for the category: per-book amount times quantity
    pub fine_amount: Decimal,
    pub description: String,
    pub due_date: DateTime<Utc>,
}

/// Everything a verification changes, computed up front so the
/// repository can apply it in one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnPlan {
    pub fines: Vec<FineDraft>,
    /// Copies to add back to the book's available count
    pub received_quantity: i32,
    /// New book status, when the split determines one
    pub book_status: Option<BookStatus>,
    pub next_status: RequestStatus,
}
