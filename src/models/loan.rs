//! Loan model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::book::Book;
use super::penalty::Penalty;

/// Loan lifecycle states.
///
/// Only BORROWED and RETURNED are ever stored; OVERDUE is derived from the
/// due date at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
pub enum LoanStatus {
    Borrowed,
    Overdue,
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Borrowed => "BORROWED",
            LoanStatus::Overdue => "OVERDUE",
            LoanStatus::Returned => "RETURNED",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Loan model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// Lifecycle state as observed at `now`: an open loan past its due date
    /// reads as OVERDUE.
    pub fn status_at(&self, now: DateTime<Utc>) -> LoanStatus {
        if self.returned_at.is_none() && now > self.due_date {
            LoanStatus::Overdue
        } else {
            self.status
        }
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.returned_at.is_none() && now > self.due_date
    }

    /// Project the stored status onto the current clock for API payloads
    pub fn observed(mut self) -> Self {
        self.status = self.status_at(Utc::now());
        self
    }
}

/// Loan with borrower and book context for display
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct LoanDetails {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub book_id: i64,
    pub book_title: String,
    pub book_author: String,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
}

impl LoanDetails {
    pub fn observed(mut self) -> Self {
        if self.returned_at.is_none() && Utc::now() > self.due_date {
            self.status = LoanStatus::Overdue;
        }
        self
    }
}

/// Borrow request. The borrower is always the authenticated caller.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BorrowRequest {
    pub book_id: i64,
}

/// Borrow mutation response: the created loan plus the decremented book
#[derive(Debug, Serialize, ToSchema)]
pub struct BorrowResponse {
    pub loan: Loan,
    pub book: Book,
}

/// Return mutation response: closed loan, released book and the penalty
/// assessed for a late return, if any
#[derive(Debug, Serialize, ToSchema)]
pub struct ReturnResponse {
    pub loan: Loan,
    pub book: Book,
    pub penalty: Option<Penalty>,
}

/// Loan list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct LoanQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn open_loan(due_in: Duration) -> Loan {
        let now = Utc::now();
        Loan {
            id: 1,
            user_id: 2,
            book_id: 3,
            borrowed_at: now - Duration::days(1),
            due_date: now + due_in,
            returned_at: None,
            status: LoanStatus::Borrowed,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_open_loan_before_due_reads_borrowed() {
        let loan = open_loan(Duration::days(3));
        assert_eq!(loan.status_at(Utc::now()), LoanStatus::Borrowed);
        assert!(!loan.is_overdue(Utc::now()));
    }

    #[test]
    fn test_open_loan_past_due_reads_overdue() {
        let loan = open_loan(Duration::days(-2));
        assert_eq!(loan.status_at(Utc::now()), LoanStatus::Overdue);
        assert!(loan.is_overdue(Utc::now()));
        // nothing was written back
        assert_eq!(loan.status, LoanStatus::Borrowed);
    }

    #[test]
    fn test_returned_loan_never_reads_overdue() {
        let mut loan = open_loan(Duration::days(-10));
        loan.returned_at = Some(Utc::now() - Duration::days(1));
        loan.status = LoanStatus::Returned;
        assert_eq!(loan.status_at(Utc::now()), LoanStatus::Returned);
        assert!(!loan.is_overdue(Utc::now()));
    }

    #[test]
    fn test_status_exactly_at_due_date() {
        let loan = open_loan(Duration::zero());
        // not yet late at the due instant itself
        assert_eq!(loan.status_at(loan.due_date), LoanStatus::Borrowed);
    }
}
