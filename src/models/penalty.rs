//! Penalty model and assessment logic

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::config::LendingConfig;

/// Penalty states. PAID exists for forward compatibility; no transition
/// writes it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
pub enum PenaltyStatus {
    Unpaid,
    Paid,
    Waived,
}

impl PenaltyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PenaltyStatus::Unpaid => "UNPAID",
            PenaltyStatus::Paid => "PAID",
            PenaltyStatus::Waived => "WAIVED",
        }
    }
}

impl std::fmt::Display for PenaltyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Penalty model from database. One-to-one with its loan.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Penalty {
    pub id: i64,
    pub loan_id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub days_late: i32,
    pub status: PenaltyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Assessment computed for a late return, before persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenaltyDraft {
    pub days_late: i32,
    pub amount: Decimal,
}

const MS_PER_DAY: i64 = 86_400_000;

/// Assess the penalty for a return.
///
/// Returns None when the book came back on or before the due date plus the
/// configured grace period. Otherwise the lateness is rounded up to whole
/// days and charged at the daily rate, so returning the day after a 14-day
/// period at day 19 costs five days.
pub fn assess(
    due_date: DateTime<Utc>,
    returned_at: DateTime<Utc>,
    lending: &LendingConfig,
) -> Option<PenaltyDraft> {
    let cutoff = due_date + Duration::days(lending.grace_period_days);
    if returned_at <= cutoff {
        return None;
    }
    let late_ms = (returned_at - cutoff).num_milliseconds();
    let days_late = ((late_ms + MS_PER_DAY - 1) / MS_PER_DAY).max(1);
    let amount = lending.daily_penalty_rate * Decimal::from(days_late);
    Some(PenaltyDraft {
        days_late: days_late as i32,
        amount,
    })
}

/// Penalty list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PenaltyQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Aggregated unpaid amount for one user
#[derive(Debug, Serialize, ToSchema)]
pub struct UnpaidTotal {
    pub user_id: i64,
    pub total_unpaid: Decimal,
}
