//! Penalty reads and the waive transition

use crate::{
    error::AppResult,
    models::penalty::{Penalty, PenaltyQuery, UnpaidTotal},
    repository::Repository,
};

#[derive(Clone)]
pub struct PenaltiesService {
    repository: Repository,
}

impl PenaltiesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get a penalty by ID
    pub async fn get_penalty(&self, id: i64) -> AppResult<Penalty> {
        self.repository.penalties.get_by_id(id).await
    }

    /// Waive an unpaid penalty
    pub async fn waive(&self, id: i64) -> AppResult<Penalty> {
        self.repository.penalties.waive(id).await
    }

    /// List penalties, newest first, paginated
    pub async fn list_penalties(&self, query: &PenaltyQuery) -> AppResult<(Vec<Penalty>, i64)> {
        self.repository.penalties.list(query).await
    }

    /// All penalties for a user
    pub async fn list_user_penalties(&self, user_id: i64) -> AppResult<Vec<Penalty>> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository.penalties.list_user(user_id).await
    }

    /// Unpaid penalties for a user
    pub async fn list_user_unpaid(&self, user_id: i64) -> AppResult<Vec<Penalty>> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository.penalties.list_user_unpaid(user_id).await
    }

    /// Outstanding balance for a user
    pub async fn total_unpaid(&self, user_id: i64) -> AppResult<UnpaidTotal> {
        self.repository.users.get_by_id(user_id).await?;
        let total_unpaid = self.repository.penalties.total_unpaid(user_id).await?;
        Ok(UnpaidTotal {
            user_id,
            total_unpaid,
        })
    }
}
