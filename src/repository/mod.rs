//! Repository layer for database operations

pub mod books;
pub mod loans;
pub mod penalties;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding the per-table repositories
#[derive(Clone)]
pub struct Repository {
    pub books: books::BooksRepository,
    pub loans: loans::LoansRepository,
    pub penalties: penalties::PenaltiesRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            penalties: penalties::PenaltiesRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool),
        }
    }
}
