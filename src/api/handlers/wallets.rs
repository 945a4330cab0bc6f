use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ApiResponse;
use crate::db::{period_repo, reward_config_repo, reward_repo, snapshot_repo};
use crate::errors::AppError;
use crate::models::{BalanceSnapshot, ClaimOutcome, DailyReward, HoldingPeriod};
use crate::services::evaluator::{self, EligibilityReport};
use crate::AppState;

const DEFAULT_LIMIT: i64 = 50;

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct WalletStats {
    pub current_period_started_at: Option<DateTime<Utc>>,
    pub min_balance_observed: Option<Decimal>,
    pub eligible: bool,
    pub days_rewarded: i64,
}

pub async fn stats(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<ApiResponse<WalletStats>>, AppError> {
    let now = Utc::now();
    let open = period_repo::find_open_period(&state.db, &wallet).await?;
    let days_rewarded = reward_repo::count_rewarded_days(&state.db, &wallet).await?;

    // No active config fails closed: the wallet reports as ineligible.
    let eligible = match reward_config_repo::active_config(&state.db, now).await? {
        Some(config) => evaluator::is_eligible(&state.db, &wallet, now, &config).await?,
        None => false,
    };

    Ok(Json(ApiResponse::ok(WalletStats {
        current_period_started_at: open.as_ref().map(|p| p.started_at),
        min_balance_observed: open.as_ref().map(|p| p.min_balance_observed),
        eligible,
        days_rewarded,
    })))
}

/// Holding periods, newest first.
pub async fn sessions(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<HoldingPeriod>>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 500);
    let periods = period_repo::get_sessions(&state.db, &wallet, limit).await?;

    Ok(Json(ApiResponse::ok(periods)))
}

/// Daily rewards, newest first.
pub async fn rewards(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<DailyReward>>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 500);
    let rewards = reward_repo::get_recent_rewards(&state.db, &wallet, limit).await?;

    Ok(Json(ApiResponse::ok(rewards)))
}

#[derive(Deserialize)]
pub struct SinceQuery {
    /// Omitted means the last 24 hours.
    pub from: Option<DateTime<Utc>>,
}

/// Raw balance observations from `from` onwards, ascending.
pub async fn snapshots(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
    Query(query): Query<SinceQuery>,
) -> Result<Json<ApiResponse<Vec<BalanceSnapshot>>>, AppError> {
    let from = query
        .from
        .unwrap_or_else(|| Utc::now() - chrono::Duration::hours(24));
    let snapshots = snapshot_repo::get_since(&state.db, &wallet, from).await?;

    Ok(Json(ApiResponse::ok(snapshots)))
}

pub async fn eligibility(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<ApiResponse<EligibilityReport>>, AppError> {
    let report = evaluator::check_eligibility(&state.db, &wallet, Utc::now()).await?;
    Ok(Json(ApiResponse::ok(report)))
}

#[derive(Deserialize)]
pub struct ClaimQuery {
    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct ClaimResponse {
    pub outcome: ClaimOutcome,
    pub reward: Option<DailyReward>,
}

pub async fn claim(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
    Query(query): Query<ClaimQuery>,
) -> Result<Json<ApiResponse<ClaimResponse>>, AppError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let (outcome, reward) = reward_repo::claim(&state.db, &wallet, date).await?;

    metrics::counter!("claims_total", "outcome" => outcome.as_str()).increment(1);
    tracing::info!(wallet = %wallet, date = %date, outcome = %outcome, "Claim attempt");

    Ok(Json(ApiResponse::ok(ClaimResponse { outcome, reward })))
}
