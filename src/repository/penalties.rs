//! Penalties repository for database operations

use rust_decimal::Decimal;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::Loan,
        penalty::{Penalty, PenaltyDraft, PenaltyQuery},
    },
};

#[derive(Clone)]
pub struct PenaltiesRepository {
    pool: Pool<Postgres>,
}

impl PenaltiesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get penalty by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Penalty> {
        sqlx::query_as::<_, Penalty>("SELECT * FROM penalties WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Penalty with id {} not found", id)))
    }

    /// Persist an assessment inside the return transaction.
    ///
    /// `loan_id` is unique, so a replay on the same loan inserts nothing and
    /// returns None instead of charging twice.
    pub async fn insert_assessment(
        conn: &mut PgConnection,
        loan: &Loan,
        draft: &PenaltyDraft,
    ) -> AppResult<Option<Penalty>> {
        let penalty = sqlx::query_as::<_, Penalty>(
            r#"
            INSERT INTO penalties (loan_id, user_id, amount, days_late, status)
            VALUES ($1, $2, $3, $4, 'UNPAID')
            ON CONFLICT (loan_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(loan.id)
        .bind(loan.user_id)
        .bind(draft.amount)
        .bind(draft.days_late)
        .fetch_optional(conn)
        .await?;

        Ok(penalty)
    }

    /// Waive a penalty: UNPAID to WAIVED.
    ///
    /// The status condition makes the transition race-safe; a second waive
    /// finds no UNPAID row and reports the illegal transition.
    pub async fn waive(&self, id: i64) -> AppResult<Penalty> {
        let waived = sqlx::query_as::<_, Penalty>(
            r#"
            UPDATE penalties
            SET status = 'WAIVED', updated_at = NOW()
            WHERE id = $1 AND status = 'UNPAID'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match waived {
            Some(penalty) => Ok(penalty),
            None => {
                let existing = self.get_by_id(id).await?;
                Err(AppError::InvalidTransition(format!(
                    "Penalty {} is {} and cannot be waived",
                    id, existing.status
                )))
            }
        }
    }

    /// List all penalties, newest first, paginated
    pub async fn list(&self, query: &PenaltyQuery) -> AppResult<(Vec<Penalty>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let penalties = sqlx::query_as::<_, Penalty>(
            "SELECT * FROM penalties ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM penalties")
            .fetch_one(&self.pool)
            .await?;

        Ok((penalties, total))
    }

    /// All penalties of one user
    pub async fn list_user(&self, user_id: i64) -> AppResult<Vec<Penalty>> {
        let penalties = sqlx::query_as::<_, Penalty>(
            "SELECT * FROM penalties WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(penalties)
    }

    /// Unpaid penalties of one user
    pub async fn list_user_unpaid(&self, user_id: i64) -> AppResult<Vec<Penalty>> {
        let penalties = sqlx::query_as::<_, Penalty>(
            "SELECT * FROM penalties WHERE user_id = $1 AND status = 'UNPAID' ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(penalties)
    }

    /// Sum of a user's unpaid penalty amounts. Waived rows never count.
    pub async fn total_unpaid(&self, user_id: i64) -> AppResult<Decimal> {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM penalties WHERE user_id = $1 AND status = 'UNPAID'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    /// Count unpaid penalties across all users
    pub async fn count_unpaid(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM penalties WHERE status = 'UNPAID'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Sum of unpaid penalty amounts across all users
    pub async fn sum_unpaid(&self) -> AppResult<Decimal> {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM penalties WHERE status = 'UNPAID'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }
}
