//! Book fine model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

/// Why the fine was issued. Damaged and lost copies on the same
/// return produce separate fine rows so each category's liability is
/// independently auditable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum FineReason {
    Damaged,
    Lost,
}

impl FineReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FineReason::Damaged => "Damaged",
            FineReason::Lost => "Lost",
        }
    }
}

impl std::str::FromStr for FineReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Damaged" => Ok(FineReason::Damaged),
            "Lost" => Ok(FineReason::Lost),
            _ => Err(format!("Invalid fine reason: {}", s)),
        }
    }
}

impl std::fmt::Display for FineReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment status of a fine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum FineStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
    Waived,
}

impl FineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FineStatus::Unpaid => "Unpaid",
            FineStatus::PartiallyPaid => "Partially_Paid",
            FineStatus::Paid => "Paid",
            FineStatus::Waived => "Waived",
        }
    }

    /// Open fines can still be settled by staff
    pub fn is_payable(self) -> bool {
        matches!(self, FineStatus::Unpaid | FineStatus::PartiallyPaid)
    }
}

impl std::str::FromStr for FineStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unpaid" => Ok(FineStatus::Unpaid),
            "Partially_Paid" => Ok(FineStatus::PartiallyPaid),
            "Paid" => Ok(FineStatus::Paid),
            "Waived" => Ok(FineStatus::Waived),
            _ => Err(format!("Invalid fine status: {}", s)),
        }
    }
}

impl std::fmt::Display for FineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// SQLx conversions (stored as text)
impl sqlx::Type<Postgres> for FineReason {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for FineReason {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for FineReason {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

impl sqlx::Type<Postgres> for FineStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for FineStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for FineStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

/// Fine model from database.
///
/// `quantity` is a first-class column; the free-text `description`
/// carries only the staff remark.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookFine {
    pub id: i32,
    pub request_id: i32,
    pub student_id: i32,
    pub book_id: i32,
    /// Staff member who issued the fine; settlement is restricted to them
    pub staff_id: i32,
    pub reason: FineReason,
    /// Number of copies this fine covers
    pub quantity: i32,
    /// Total amount for this category (per-book amount times quantity)
    #[schema(value_type = String)]
    pub fine_amount: Decimal,
    pub description: Option<String>,
    pub status: FineStatus,
    pub due_date: DateTime<Utc>,
    pub paid_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payable_statuses() {
        assert!(FineStatus::Unpaid.is_payable());
        assert!(FineStatus::PartiallyPaid.is_payable());
        assert!(!FineStatus::Paid.is_payable());
        assert!(!FineStatus::Waived.is_payable());
    }
}
