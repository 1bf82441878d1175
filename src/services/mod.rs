//! Business logic services

pub mod catalog;
pub mod enrichment;
pub mod loans;
pub mod penalties;
pub mod stats;
pub mod users;

use std::future::Future;
use std::sync::Arc;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub penalties: penalties::PenaltiesService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> AppResult<Self> {
        let enricher: Arc<dyn enrichment::Enricher> =
            Arc::new(enrichment::OpenLibraryClient::new(&config.enrichment)?);

        Ok(Self {
            users: users::UsersService::new(repository.clone(), config.auth.clone()),
            catalog: catalog::CatalogService::new(
                repository.clone(),
                config.enrichment.clone(),
                enricher,
            ),
            loans: loans::LoansService::new(repository.clone(), config.lending.clone()),
            penalties: penalties::PenaltiesService::new(repository.clone()),
            stats: stats::StatsService::new(repository),
        })
    }
}

const MAX_TRANSIENT_RETRIES: u32 = 2;
const RETRY_BACKOFF_MS: u64 = 50;

/// Retry an operation on transient infrastructure failures with a short
/// bounded backoff. Business errors pass through on the first attempt.
pub(crate) async fn with_retries<T, F, Fut>(mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(err) if err.is_transient() && attempt < MAX_TRANSIENT_RETRIES => {
                attempt += 1;
                tracing::warn!("Transient failure, retry {}: {}", attempt, err);
                tokio::time::sleep(std::time::Duration::from_millis(
                    RETRY_BACKOFF_MS * attempt as u64,
                ))
                .await;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result = with_retries(move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AppError::Transient("pool exhausted".into()))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_business_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result: AppResult<i32> = with_retries(move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::OutOfStock("none left".into()))
        })
        .await;
        assert!(matches!(result, Err(AppError::OutOfStock(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_bounded_retries() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result: AppResult<i32> = with_retries(move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Transient("still down".into()))
        })
        .await;
        assert!(matches!(result, Err(AppError::Transient(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1 + MAX_TRANSIENT_RETRIES);
    }
}
