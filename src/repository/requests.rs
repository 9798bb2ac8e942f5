//! Loan requests repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        reconciliation::ReturnPlan,
        request::{BookRequest, PendingReturn},
    },
};

#[derive(Clone)]
pub struct RequestsRepository {
    pool: Pool<Postgres>,
}

impl RequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get request by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<BookRequest> {
        sqlx::query_as::<_, BookRequest>("SELECT * FROM book_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request with id {} not found", id)))
    }

    /// Requests awaiting return verification for a staff member
    pub async fn list_pending_verification(&self, staff_id: i32) -> AppResult<Vec<PendingReturn>> {
        let requests = sqlx::query_as::<_, PendingReturn>(
            r#"
            SELECT r.id, r.student_id, u.name AS student_name,
                   r.book_id, b.title AS book_title,
                   r.quantity, r.status, r.requested_at, r.returned_at
            FROM book_requests r
            JOIN users u ON u.id = r.student_id
            JOIN books b ON b.id = r.book_id
            WHERE r.staff_id = $1 AND r.status IN ('Returned', 'Under_Review')
            ORDER BY r.returned_at NULLS LAST, r.requested_at
            "#,
        )
        .bind(staff_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Apply a verification plan in a single transaction: create the
    /// fine rows, adjust the book inventory and advance the request
    /// status. The request row is locked and re-checked inside the
    /// transaction so two staff verifying the same return cannot both
    /// succeed.
    pub async fn apply_verification(
        &self,
        request_id: i32,
        staff_id: i32,
        plan: &ReturnPlan,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, BookRequest>(
            "SELECT * FROM book_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Request with id {} not found", request_id)))?;

        if request.staff_id != staff_id {
            return Err(AppError::NotEligible(
                "Request is not assigned to this staff member".to_string(),
            ));
        }
        if !request.status.awaits_verification() {
            return Err(AppError::NotEligible(format!(
                "Request is not awaiting verification (status: {})",
                request.status
            )));
        }
        if !request.status.can_transition(plan.next_status) {
            return Err(AppError::NotEligible(format!(
                "Illegal status transition {} -> {}",
                request.status, plan.next_status
            )));
        }

        for fine in &plan.fines {
            sqlx::query(
                r#"
                INSERT INTO book_fines
                    (request_id, student_id, book_id, staff_id, reason, quantity,
                     fine_amount, description, status, due_date)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'Unpaid', $9)
                "#,
            )
            .bind(request.id)
            .bind(request.student_id)
            .bind(request.book_id)
            .bind(staff_id)
            .bind(fine.reason)
            .bind(fine.quantity)
            .bind(fine.fine_amount)
            .bind(&fine.description)
            .bind(fine.due_date)
            .execute(&mut *tx)
            .await?;
        }

        if plan.received_quantity > 0 {
            sqlx::query(
                "UPDATE books SET available_copies = available_copies + $2 WHERE id = $1",
            )
            .bind(request.book_id)
            .bind(plan.received_quantity)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(status) = plan.book_status {
            sqlx::query("UPDATE books SET status = $2 WHERE id = $1")
                .bind(request.book_id)
                .bind(status)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "UPDATE book_requests SET status = $2, returned_at = COALESCE(returned_at, NOW()) WHERE id = $1",
        )
        .bind(request.id)
        .bind(plan.next_status)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
