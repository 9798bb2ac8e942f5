//! Book fines repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::fine::{BookFine, FineStatus},
};

#[derive(Clone)]
pub struct FinesRepository {
    pool: Pool<Postgres>,
}

impl FinesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get fine by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<BookFine> {
        sqlx::query_as::<_, BookFine>("SELECT * FROM book_fines WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Fine with id {} not found", id)))
    }

    /// Settle an open fine. The status predicate is part of the UPDATE
    /// so a concurrent settlement cannot pay the same fine twice.
    pub async fn mark_paid(
        &self,
        fine_id: i32,
        staff_id: i32,
        paid_date: DateTime<Utc>,
    ) -> AppResult<BookFine> {
        sqlx::query_as::<_, BookFine>(
            r#"
            UPDATE book_fines
            SET status = 'Paid', paid_date = $3
            WHERE id = $1 AND staff_id = $2 AND status IN ('Unpaid', 'Partially_Paid')
            RETURNING *
            "#,
        )
        .bind(fine_id)
        .bind(staff_id)
        .bind(paid_date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Payable fine with id {} not found", fine_id)))
    }

    /// Fines issued by a staff member, optionally filtered by status
    pub async fn list_for_staff(
        &self,
        staff_id: i32,
        status: Option<FineStatus>,
    ) -> AppResult<Vec<BookFine>> {
        let fines = match status {
            Some(status) => {
                sqlx::query_as::<_, BookFine>(
                    "SELECT * FROM book_fines WHERE staff_id = $1 AND status = $2 ORDER BY due_date",
                )
                .bind(staff_id)
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, BookFine>(
                    "SELECT * FROM book_fines WHERE staff_id = $1 ORDER BY due_date",
                )
                .bind(staff_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(fines)
    }

    /// Fines owed by a student
    pub async fn list_for_student(&self, student_id: i32) -> AppResult<Vec<BookFine>> {
        let fines = sqlx::query_as::<_, BookFine>(
            "SELECT * FROM book_fines WHERE student_id = $1 ORDER BY due_date",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(fines)
    }
}
