//! Penalty endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::penalty::{Penalty, PenaltyQuery, UnpaidTotal},
};

use super::{books::PaginatedResponse, AuthenticatedUser};

/// List all penalties
#[utoipa::path(
    get,
    path = "/penalties",
    tag = "penalties",
    security(("bearer_auth" = [])),
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "List of penalties", body = PaginatedResponse<Penalty>),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_penalties(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PenaltyQuery>,
) -> AppResult<Json<PaginatedResponse<Penalty>>> {
    claims.require_admin()?;

    let (penalties, total) = state.services.penalties.list_penalties(&query).await?;

    Ok(Json(PaginatedResponse {
        items: penalties,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }))
}

/// Get a penalty by ID
#[utoipa::path(
    get,
    path = "/penalties/{id}",
    tag = "penalties",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Penalty ID")
    ),
    responses(
        (status = 200, description = "Penalty", body = Penalty),
        (status = 403, description = "Not your penalty"),
        (status = 404, description = "Penalty not found")
    )
)]
pub async fn get_penalty(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Penalty>> {
    let penalty = state.services.penalties.get_penalty(id).await?;
    claims.require_self_or_admin(penalty.user_id)?;

    Ok(Json(penalty))
}

/// All penalties for a user
#[utoipa::path(
    get,
    path = "/penalties/user/{user_id}",
    tag = "penalties",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's penalties", body = Vec<Penalty>),
        (status = 403, description = "Not your penalties"),
        (status = 404, description = "User not found")
    )
)]
pub async fn user_penalties(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<Penalty>>> {
    claims.require_self_or_admin(user_id)?;

    let penalties = state.services.penalties.list_user_penalties(user_id).await?;
    Ok(Json(penalties))
}

/// Unpaid penalties for a user
#[utoipa::path(
    get,
    path = "/penalties/user/{user_id}/unpaid",
    tag = "penalties",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's unpaid penalties", body = Vec<Penalty>),
        (status = 403, description = "Not your penalties"),
        (status = 404, description = "User not found")
    )
)]
pub async fn user_unpaid_penalties(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<Penalty>>> {
    claims.require_self_or_admin(user_id)?;

    let penalties = state.services.penalties.list_user_unpaid(user_id).await?;
    Ok(Json(penalties))
}

/// Outstanding penalty balance for a user
#[utoipa::path(
    get,
    path = "/penalties/user/{user_id}/total",
    tag = "penalties",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Unpaid total", body = UnpaidTotal),
        (status = 403, description = "Not your penalties"),
        (status = 404, description = "User not found")
    )
)]
pub async fn user_penalty_total(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i64>,
) -> AppResult<Json<UnpaidTotal>> {
    claims.require_self_or_admin(user_id)?;

    let total = state.services.penalties.total_unpaid(user_id).await?;
    Ok(Json(total))
}

/// Waive an unpaid penalty
#[utoipa::path(
    put,
    path = "/penalties/{id}/waive",
    tag = "penalties",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Penalty ID")
    ),
    responses(
        (status = 200, description = "Penalty waived", body = Penalty),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Penalty not found"),
        (status = 409, description = "Penalty is not unpaid")
    )
)]
pub async fn waive_penalty(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Penalty>> {
    claims.require_admin()?;

    let penalty = state.services.penalties.waive(id).await?;
    Ok(Json(penalty))
}
