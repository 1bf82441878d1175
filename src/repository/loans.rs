//! Loans repository for database operations
//!
//! `borrow` and `return_book` are the two multi-effect mutations of the
//! system. Each runs inside a single transaction so the loan row, the
//! inventory counter and the penalty row always move together.

use chrono::{Duration, Utc};
use sqlx::{Pool, Postgres};
use tokio_stream::StreamExt;

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::{
        book::Book,
        loan::{Loan, LoanDetails, LoanQuery},
        penalty::{self, Penalty},
        user::{User, UserStatus},
    },
};

use super::{books::BooksRepository, penalties::PenaltiesRepository};

const LOAN_DETAILS_SELECT: &str = r#"
    SELECT l.id, l.user_id, u.full_name AS user_name,
           l.book_id, b.title AS book_title, b.author AS book_author,
           l.borrowed_at, l.due_date, l.returned_at, l.status
    FROM loans l
    JOIN users u ON l.user_id = u.id
    JOIN books b ON l.book_id = b.id
"#;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Borrow a book: gate on the account, reserve a copy, create the loan.
    ///
    /// One transaction end to end. When the partial unique index catches a
    /// concurrent duplicate the rollback also undoes the reservation.
    pub async fn borrow(
        &self,
        user_id: i64,
        book_id: i64,
        lending: &LendingConfig,
    ) -> AppResult<(Loan, Book)> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

        if user.status != UserStatus::Active {
            return Err(AppError::UserSuspended(format!(
                "User {} is suspended and cannot borrow",
                user_id
            )));
        }

        // Cheap pre-check; the unique index below still guards the race.
        let already_borrowed: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE user_id = $1 AND book_id = $2 AND returned_at IS NULL)",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_borrowed {
            return Err(AppError::DuplicateLoan(format!(
                "User {} already has an active loan for book {}",
                user_id, book_id
            )));
        }

        let book = BooksRepository::reserve(&mut tx, book_id).await?;

        let now = Utc::now();
        let due_date = now + Duration::days(lending.loan_period_days);

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (user_id, book_id, borrowed_at, due_date, status)
            VALUES ($1, $2, $3, $4, 'BORROWED')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(now)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db)
                if db.constraint() == Some("loans_one_active_per_user_book") =>
            {
                AppError::DuplicateLoan(format!(
                    "User {} already has an active loan for book {}",
                    user_id, book_id
                ))
            }
            _ => e.into(),
        })?;

        tx.commit().await?;
        Ok((loan, book))
    }

    /// Return a loan: close it, release the copy, assess the late penalty.
    ///
    /// The loan row is locked first so a concurrent duplicate return blocks,
    /// then reads the closed row and gets AlreadyReturned. All three effects
    /// commit together or not at all.
    pub async fn return_book(
        &self,
        loan_id: i64,
        lending: &LendingConfig,
    ) -> AppResult<(Loan, Book, Option<Penalty>)> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        if loan.returned_at.is_some() {
            return Err(AppError::AlreadyReturned(format!(
                "Loan {} was already returned",
                loan_id
            )));
        }

        let now = Utc::now();

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET returned_at = $2, status = 'RETURNED', updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let book = BooksRepository::release(&mut tx, loan.book_id).await?;

        let penalty = match penalty::assess(loan.due_date, now, lending) {
            Some(draft) => PenaltiesRepository::insert_assessment(&mut tx, &loan, &draft).await?,
            None => None,
        };

        tx.commit().await?;
        Ok((loan, book, penalty))
    }

    /// List all loans, newest first, paginated
    pub async fn list(&self, query: &LoanQuery) -> AppResult<(Vec<LoanDetails>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let sql = format!("{} ORDER BY l.borrowed_at DESC LIMIT $1 OFFSET $2", LOAN_DETAILS_SELECT);
        let loans = sqlx::query_as::<_, LoanDetails>(&sql)
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans")
            .fetch_one(&self.pool)
            .await?;

        Ok((loans.into_iter().map(LoanDetails::observed).collect(), total))
    }

    /// Open loans past their due date, streamed from the database cursor
    pub async fn list_overdue(&self) -> AppResult<Vec<LoanDetails>> {
        let sql = format!(
            "{} WHERE l.returned_at IS NULL AND l.due_date < NOW() ORDER BY l.due_date",
            LOAN_DETAILS_SELECT
        );

        let mut rows = sqlx::query_as::<_, LoanDetails>(&sql).fetch(&self.pool);

        let mut overdue = Vec::new();
        while let Some(loan) = rows.try_next().await? {
            overdue.push(loan.observed());
        }
        Ok(overdue)
    }

    /// All loans of one user, newest first
    pub async fn list_user(&self, user_id: i64) -> AppResult<Vec<LoanDetails>> {
        let sql = format!(
            "{} WHERE l.user_id = $1 ORDER BY l.borrowed_at DESC",
            LOAN_DETAILS_SELECT
        );
        let loans = sqlx::query_as::<_, LoanDetails>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(loans.into_iter().map(LoanDetails::observed).collect())
    }

    /// Open loans of one user
    pub async fn list_user_active(&self, user_id: i64) -> AppResult<Vec<LoanDetails>> {
        let sql = format!(
            "{} WHERE l.user_id = $1 AND l.returned_at IS NULL ORDER BY l.due_date",
            LOAN_DETAILS_SELECT
        );
        let loans = sqlx::query_as::<_, LoanDetails>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(loans.into_iter().map(LoanDetails::observed).collect())
    }

    /// Count active loans
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE returned_at IS NULL")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Count overdue loans
    pub async fn count_overdue(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE returned_at IS NULL AND due_date < NOW()",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
