//! Book-return reconciliation engine.
//!
//! Validates damaged/lost/received quantity splits against the
//! borrowed quantity, issues proportional fines per category, updates
//! the book inventory and advances the loan request. The planning step
//! is a pure function; the repository applies the resulting plan in a
//! single transaction.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookStatus,
        fine::{BookFine, FineReason, FineStatus},
        reconciliation::{FineDraft, ReturnPlan, VerifyReturnInput},
        request::{PendingReturn, RequestStatus},
        user::UserClaims,
    },
    repository::Repository,
};

/// Validate a quantity split and compute everything the verification
/// changes. Errors name the discrepancy and map to a quantity-mismatch
/// failure at the boundary.
pub fn plan_reconciliation(
    borrowed_quantity: i32,
    input: &VerifyReturnInput,
    now: DateTime<Utc>,
    fine_due_days: i64,
) -> Result<ReturnPlan, String> {
    let damaged = input.damaged_quantity;
    let lost = input.lost_quantity;
    let received = input.received_quantity;

    if damaged < 0 || lost < 0 || received < 0 {
        return Err(format!(
            "Quantities cannot be negative (damaged: {}, lost: {}, received: {})",
            damaged, lost, received
        ));
    }
    if damaged + lost + received != borrowed_quantity {
        return Err(format!(
            "Quantity split does not add up: damaged {} + lost {} + received {} != borrowed {}",
            damaged, lost, received, borrowed_quantity
        ));
    }

    let mut fines = Vec::new();
    if damaged > 0 || lost > 0 {
        let per_book = match input.fine_amount {
            Some(amount) if amount > Decimal::ZERO => amount,
            _ => {
                return Err(
                    "A positive per-book fine amount is required when copies are damaged or lost"
                        .to_string(),
                )
            }
        };
        let description = match input.damage_description.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => {
                return Err(
                    "A damage description is required when copies are damaged or lost".to_string(),
                )
            }
        };
        let due_date = input.due_date.unwrap_or(now + Duration::days(fine_due_days));

        // One fine row per category, each amount proportional to its
        // own quantity, so the liabilities stay independently auditable
        if damaged > 0 {
            fines.push(FineDraft {
                reason: FineReason::Damaged,
                quantity: damaged,
                fine_amount: per_book * Decimal::from(damaged),
                description: description.clone(),
                due_date,
            });
        }
        if lost > 0 {
            fines.push(FineDraft {
                reason: FineReason::Lost,
                quantity: lost,
                fine_amount: per_book * Decimal::from(lost),
                description,
                due_date,
            });
        }
    }

    // Inventory status. With nothing received every outstanding copy is
    // damaged or lost; when both occur the single-valued status takes
    // Lost, the stronger condition. A full undamaged return restores
    // availability.
    let book_status = if received == 0 {
        if lost > 0 {
            Some(BookStatus::Lost)
        } else if damaged > 0 {
            Some(BookStatus::Damaged)
        } else {
            None
        }
    } else if received == borrowed_quantity {
        Some(BookStatus::Available)
    } else {
        None
    };

    let next_status = if received > 0 {
        RequestStatus::Received
    } else {
        RequestStatus::Returned
    };

    Ok(ReturnPlan {
        fines,
        received_quantity: received,
        book_status,
        next_status,
    })
}

#[derive(Clone)]
pub struct ReturnsService {
    repository: Repository,
    fine_due_days: i64,
}

impl ReturnsService {
    pub fn new(repository: Repository, fine_due_days: i64) -> Self {
        Self {
            repository,
            fine_due_days,
        }
    }

    /// Verify a returned loan: validate the split, then apply fines,
    /// inventory changes and the status transition atomically. A
    /// request that has already been processed is no longer in a
    /// verifiable status, so re-invocation cannot duplicate fines.
    pub async fn verify(
        &self,
        request_id: i32,
        claims: &UserClaims,
        input: &VerifyReturnInput,
    ) -> AppResult<String> {
        // Verify the staff account exists; fines reference it
        self.repository.users.get_by_id(claims.user_id).await?;

        let request = self.repository.requests.get_by_id(request_id).await?;

        if request.staff_id != claims.user_id {
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

        // The inventory row the plan will mutate must exist
        self.repository.books.get_by_id(request.book_id).await?;

        let plan = plan_reconciliation(
            request.borrowed_quantity(),
            input,
            Utc::now(),
            self.fine_due_days,
        )
        .map_err(AppError::QuantityMismatch)?;

        self.repository
            .requests
            .apply_verification(request_id, claims.user_id, &plan)
            .await?;

        tracing::info!(
            request_id,
            staff_id = claims.user_id,
            received = input.received_quantity,
            damaged = input.damaged_quantity,
            lost = input.lost_quantity,
            "return verified"
        );

        Ok(format!(
            "Return verified: {} received, {} damaged, {} lost",
            input.received_quantity, input.damaged_quantity, input.lost_quantity
        ))
    }

    /// Settle a fine issued by the calling staff member
    pub async fn mark_fine_paid(&self, fine_id: i32, claims: &UserClaims) -> AppResult<String> {
        let fine = self
            .repository
            .fines
            .mark_paid(fine_id, claims.user_id, Utc::now())
            .await?;

        tracing::info!(fine_id, staff_id = claims.user_id, "fine settled");

        Ok(format!("Fine of {} marked as paid", fine.fine_amount))
    }

    /// Requests awaiting verification for the calling staff member
    pub async fn pending_verifications(&self, claims: &UserClaims) -> AppResult<Vec<PendingReturn>> {
        self.repository
            .requests
            .list_pending_verification(claims.user_id)
            .await
    }

    /// Fines issued by the calling staff member
    pub async fn fines_for_staff(
        &self,
        claims: &UserClaims,
        status: Option<FineStatus>,
    ) -> AppResult<Vec<BookFine>> {
        self.repository.fines.list_for_staff(claims.user_id, status).await
    }

    /// Fines owed by the calling student
    pub async fn fines_for_student(&self, claims: &UserClaims) -> AppResult<Vec<BookFine>> {
        self.repository.fines.list_for_student(claims.user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(damaged: i32, lost: i32, received: i32, fine: Option<i64>) -> VerifyReturnInput {
        VerifyReturnInput {
            damaged_quantity: damaged,
            lost_quantity: lost,
            received_quantity: received,
            damage_description: Some("water damage on cover".to_string()),
            fine_amount: fine.map(Decimal::from),
            due_date: None,
        }
    }

    #[test]
    fn test_split_must_sum_to_borrowed_quantity() {
        let err = plan_reconciliation(3, &input(1, 0, 1, Some(10)), Utc::now(), 30).unwrap_err();
        assert!(err.contains("does not add up"));
    }

    #[test]
    fn test_negative_quantities_rejected() {
        let err = plan_reconciliation(1, &input(-1, 0, 2, Some(10)), Utc::now(), 30).unwrap_err();
        assert!(err.contains("negative"));
    }

    #[test]
    fn test_damage_requires_fine_and_description() {
        let mut no_fine = input(1, 0, 1, None);
        no_fine.damaged_quantity = 1;
        assert!(plan_reconciliation(2, &no_fine, Utc::now(), 30).is_err());

        let mut no_description = input(1, 0, 1, Some(10));
        no_description.damage_description = Some("   ".to_string());
        assert!(plan_reconciliation(2, &no_description, Utc::now(), 30).is_err());

        let mut zero_fine = input(1, 0, 1, Some(0));
        zero_fine.damaged_quantity = 1;
        assert!(plan_reconciliation(2, &zero_fine, Utc::now(), 30).is_err());
    }

    #[test]
    fn test_fines_split_proportionally_per_category() {
        // quantity=3, one of each: Damaged=10, Lost=10, one copy back
        let plan = plan_reconciliation(3, &input(1, 1, 1, Some(10)), Utc::now(), 30).unwrap();
        assert_eq!(plan.fines.len(), 2);
        assert_eq!(plan.fines[0].reason, FineReason::Damaged);
        assert_eq!(plan.fines[0].fine_amount, Decimal::from(10));
        assert_eq!(plan.fines[1].reason, FineReason::Lost);
        assert_eq!(plan.fines[1].fine_amount, Decimal::from(10));
        assert_eq!(plan.received_quantity, 1);
        assert_eq!(plan.next_status, RequestStatus::Received);
        // Partial return of a mixed split leaves the book status alone
        assert_eq!(plan.book_status, None);
    }

    #[test]
    fn test_proportional_amounts_scale_with_quantity() {
        let plan = plan_reconciliation(5, &input(2, 3, 0, Some(7)), Utc::now(), 30).unwrap();
        assert_eq!(plan.fines[0].fine_amount, Decimal::from(14));
        assert_eq!(plan.fines[1].fine_amount, Decimal::from(21));
    }

    #[test]
    fn test_all_lost_marks_book_lost_and_request_returned() {
        let plan = plan_reconciliation(2, &input(0, 2, 0, Some(10)), Utc::now(), 30).unwrap();
        assert_eq!(plan.book_status, Some(BookStatus::Lost));
        assert_eq!(plan.next_status, RequestStatus::Returned);
        assert_eq!(plan.received_quantity, 0);
    }

    #[test]
    fn test_all_damaged_marks_book_damaged() {
        let plan = plan_reconciliation(2, &input(2, 0, 0, Some(10)), Utc::now(), 30).unwrap();
        assert_eq!(plan.book_status, Some(BookStatus::Damaged));
        assert_eq!(plan.next_status, RequestStatus::Returned);
    }

    #[test]
    fn test_mixed_loss_with_nothing_received_takes_lost() {
        let plan = plan_reconciliation(3, &input(1, 2, 0, Some(10)), Utc::now(), 30).unwrap();
        assert_eq!(plan.book_status, Some(BookStatus::Lost));
    }

    #[test]
    fn test_full_return_restores_availability() {
        let plan = plan_reconciliation(
            2,
            &VerifyReturnInput {
                damaged_quantity: 0,
                lost_quantity: 0,
                received_quantity: 2,
                damage_description: None,
                fine_amount: None,
                due_date: None,
            },
            Utc::now(),
            30,
        )
        .unwrap();
        assert!(plan.fines.is_empty());
        assert_eq!(plan.book_status, Some(BookStatus::Available));
        assert_eq!(plan.next_status, RequestStatus::Received);
    }

    #[test]
    fn test_partial_return_leaves_status_alone() {
        let plan = plan_reconciliation(3, &input(1, 0, 2, Some(10)), Utc::now(), 30).unwrap();
        assert_eq!(plan.book_status, None);
        assert_eq!(plan.next_status, RequestStatus::Received);
    }

    #[test]
    fn test_default_due_date_is_thirty_days_out() {
        let now = Utc::now();
        let plan = plan_reconciliation(1, &input(1, 0, 0, Some(10)), now, 30).unwrap();
        assert_eq!(plan.fines[0].due_date, now + Duration::days(30));
    }

    #[test]
    fn test_explicit_due_date_wins() {
        let now = Utc::now();
        let due = now + Duration::days(7);
        let mut i = input(1, 0, 0, Some(10));
        i.due_date = Some(due);
        let plan = plan_reconciliation(1, &i, now, 30).unwrap();
        assert_eq!(plan.fines[0].due_date, due);
    }
}
