//! Published document model (theses, journals, capstones)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

/// Document kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DocumentType {
    Thesis,
    Journal,
    Capstone,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Thesis => "Thesis",
            DocumentType::Journal => "Journal",
            DocumentType::Capstone => "Capstone",
        }
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Thesis" => Ok(DocumentType::Thesis),
            "Journal" => Ok(DocumentType::Journal),
            "Capstone" => Ok(DocumentType::Capstone),
            _ => Err(format!("Invalid document type: {}", s)),
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Review lifecycle of an uploaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SubmissionStatus {
    Pending,
    Published,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "Pending",
            SubmissionStatus::Published => "Published",
            SubmissionStatus::Rejected => "Rejected",
        }
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(SubmissionStatus::Pending),
            "Published" => Ok(SubmissionStatus::Published),
            "Rejected" => Ok(SubmissionStatus::Rejected),
            _ => Err(format!("Invalid submission status: {}", s)),
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// SQLx conversions (stored as text)
impl sqlx::Type<Postgres> for SubmissionStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for SubmissionStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for SubmissionStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

impl sqlx::Type<Postgres> for DocumentType {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for DocumentType {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for DocumentType {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

/// Document model from database.
///
/// Once published a document is immutable except for the
/// restriction/limit fields, which stay under admin control.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Document {
    pub id: i32,
    pub title: String,
    pub document_type: DocumentType,
    /// Owning student (the author)
    pub author_student_id: i32,
    pub submission_status: SubmissionStatus,
    pub published_at: Option<DateTime<Utc>>,
    /// Restricted documents are previewable only by their owning
    /// student or by privileged roles
    pub is_restricted: bool,
    /// Advisory per-session reading limit; copied onto sessions at start
    pub time_limit_minutes: Option<i32>,
    /// Completed-session quota per reader; null disables attempt tracking
    pub max_attempts: Option<i32>,
}
