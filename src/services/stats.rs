//! Platform statistics service

use crate::{api::stats::StatsResponse, error::AppResult, repository::Repository};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Aggregate platform counters for the admin dashboard
    pub async fn get_stats(&self) -> AppResult<StatsResponse> {
        let total_books = self.repository.books.count().await?;
        let total_users = self.repository.users.count().await?;
        let active_loans = self.repository.loans.count_active().await?;
        let overdue_loans = self.repository.loans.count_overdue().await?;
        let unpaid_penalties = self.repository.penalties.count_unpaid().await?;
        let unpaid_amount = self.repository.penalties.sum_unpaid().await?;

        Ok(StatsResponse {
            total_books,
            total_users,
            active_loans,
            overdue_loans,
            unpaid_penalties,
            unpaid_amount,
        })
    }
}
