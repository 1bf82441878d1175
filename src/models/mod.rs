//! Data models for LendHub

pub mod book;
pub mod loan;
pub mod penalty;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookDetails, BookEnrichment};
pub use loan::{Loan, LoanDetails, LoanStatus};
pub use penalty::{Penalty, PenaltyStatus};
pub use user::{Role, User, UserStatus};
