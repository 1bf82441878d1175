//! Statistics endpoints

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;

use super::AuthenticatedUser;

/// Dashboard statistics response
#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    /// Total number of books in the catalog
    pub total_books: i64,
    /// Total number of user accounts
    pub total_users: i64,
    /// Loans currently out
    pub active_loans: i64,
    /// Active loans past their due date
    pub overdue_loans: i64,
    /// Unpaid penalties
    pub unpaid_penalties: i64,
    /// Sum of unpaid penalty amounts
    pub unpaid_amount: Decimal,
}

/// Get dashboard statistics
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard statistics", body = StatsResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<StatsResponse>> {
    claims.require_admin()?;

    let stats = state.services.stats.get_stats().await?;
    Ok(Json(stats))
}
