//! Book loan request model and its status state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

/// Loan request status.
///
/// The legal transitions live in [`RequestStatus::can_transition`];
/// every status write in the repository goes through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RequestStatus {
    Pending,
    Approved,
    Borrowed,
    Returned,
    UnderReview,
    Received,
    Overdue,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Approved => "Approved",
            RequestStatus::Borrowed => "Borrowed",
            RequestStatus::Returned => "Returned",
            RequestStatus::UnderReview => "Under_Review",
            RequestStatus::Received => "Received",
            RequestStatus::Overdue => "Overdue",
            RequestStatus::Rejected => "Rejected",
        }
    }

    /// Single legal-transition table for the loan lifecycle.
    /// The return path is one-directional: once a verification lands
    /// on `Received` (or settles back to `Returned`) there is no way
    /// back into review.
    pub fn can_transition(self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Approved, Borrowed)
                | (Borrowed, Returned)
                | (Borrowed, Overdue)
                | (Overdue, Returned)
                | (Returned, UnderReview)
                | (Returned, Received)
                | (Returned, Returned)
                | (UnderReview, Received)
                | (UnderReview, Returned)
        )
    }

    /// A request in one of these states is awaiting staff verification
    pub fn awaits_verification(self) -> bool {
        matches!(self, RequestStatus::Returned | RequestStatus::UnderReview)
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(RequestStatus::Pending),
            "Approved" => Ok(RequestStatus::Approved),
            "Borrowed" => Ok(RequestStatus::Borrowed),
            "Returned" => Ok(RequestStatus::Returned),
            "Under_Review" => Ok(RequestStatus::UnderReview),
            "Received" => Ok(RequestStatus::Received),
            "Overdue" => Ok(RequestStatus::Overdue),
            "Rejected" => Ok(RequestStatus::Rejected),
            _ => Err(format!("Invalid request status: {}", s)),
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// SQLx conversions (stored as text)
impl sqlx::Type<Postgres> for RequestStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for RequestStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for RequestStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

/// Loan request model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookRequest {
    pub id: i32,
    pub student_id: i32,
    /// Staff member handling the loan; verification is restricted to them
    pub staff_id: i32,
    pub book_id: i32,
    /// Copies borrowed; legacy rows may be null (treated as 1)
    pub quantity: Option<i32>,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl BookRequest {
    pub fn borrowed_quantity(&self) -> i32 {
        self.quantity.unwrap_or(1)
    }
}

/// Pending-verification entry for staff dashboards
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PendingReturn {
    pub id: i32,
    pub student_id: i32,
    pub student_name: String,
    pub book_id: i32,
    pub book_title: String,
    pub quantity: Option<i32>,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_path_is_one_directional() {
        assert!(RequestStatus::UnderReview.can_transition(RequestStatus::Received));
        assert!(RequestStatus::UnderReview.can_transition(RequestStatus::Returned));
        assert!(!RequestStatus::Received.can_transition(RequestStatus::UnderReview));
        assert!(!RequestStatus::Received.can_transition(RequestStatus::Returned));
    }

    #[test]
    fn test_status_roundtrip() {
        for s in ["Pending", "Approved", "Borrowed", "Returned", "Under_Review", "Received", "Overdue", "Rejected"] {
            assert_eq!(s.parse::<RequestStatus>().unwrap().as_str(), s);
        }
    }
}
