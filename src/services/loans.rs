//! Loan lifecycle orchestration
//!
//! Borrow and return run as single transactions in the repository; this
//! layer adds the transient-failure policy: a bounded timeout around each
//! transaction and a short retry loop on infrastructure errors.

use std::time::Duration;

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::{
        book::Book,
        loan::{Loan, LoanDetails, LoanQuery},
        penalty::Penalty,
    },
    repository::Repository,
    services::with_retries,
};

/// A borrow or return transaction that outlives this is reported transient
const TX_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    lending: LendingConfig,
}

impl LoansService {
    pub fn new(repository: Repository, lending: LendingConfig) -> Self {
        Self {
            repository,
            lending,
        }
    }

    /// Borrow a book for a user
    pub async fn borrow(&self, user_id: i64, book_id: i64) -> AppResult<(Loan, Book)> {
        let repository = &self.repository;
        let lending = &self.lending;
        with_retries(move || async move {
            tokio::time::timeout(
                TX_TIMEOUT,
                repository.loans.borrow(user_id, book_id, lending),
            )
            .await
            .map_err(|_| AppError::Transient("Borrow transaction timed out".to_string()))?
        })
        .await
    }

    /// Return a loan, releasing the copy and assessing any late penalty
    pub async fn return_book(&self, loan_id: i64) -> AppResult<(Loan, Book, Option<Penalty>)> {
        let repository = &self.repository;
        let lending = &self.lending;
        with_retries(move || async move {
            tokio::time::timeout(
                TX_TIMEOUT,
                repository.loans.return_book(loan_id, lending),
            )
            .await
            .map_err(|_| AppError::Transient("Return transaction timed out".to_string()))?
        })
        .await
    }

    /// Get a loan by ID
    pub async fn get_loan(&self, id: i64) -> AppResult<Loan> {
        let loan = self.repository.loans.get_by_id(id).await?;
        Ok(loan.observed())
    }

    /// List all loans, newest first, paginated
    pub async fn list_loans(&self, query: &LoanQuery) -> AppResult<(Vec<LoanDetails>, i64)> {
        self.repository.loans.list(query).await
    }

    /// Open loans past their due date
    pub async fn list_overdue(&self) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list_overdue().await
    }

    /// Full loan history for a user
    pub async fn list_user_loans(&self, user_id: i64) -> AppResult<Vec<LoanDetails>> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository.loans.list_user(user_id).await
    }

    /// Open loans for a user
    pub async fn list_user_active(&self, user_id: i64) -> AppResult<Vec<LoanDetails>> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository.loans.list_user_active(user_id).await
    }
}
