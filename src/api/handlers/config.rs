use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::ApiResponse;
use crate::db::reward_config_repo::{self, NewRewardConfig};
use crate::errors::AppError;
use crate::models::RewardConfig;
use crate::AppState;

/// Currently active reward config.
pub async fn get_config(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RewardConfig>>, AppError> {
    let config = reward_config_repo::active_config(&state.db, Utc::now())
        .await?
        .ok_or_else(|| AppError::NotFound("No active reward config".into()))?;

    Ok(Json(ApiResponse::ok(config)))
}

#[derive(Deserialize)]
pub struct AppendConfigRequest {
    pub min_holding_hours: i32,
    pub min_balance_threshold: Decimal,
    pub rate_per_500_units: Decimal,
    pub max_daily_amount: Decimal,
    pub snapshot_interval_hours: i32,
    pub tolerance_percentage: Decimal,
    /// Omitted means effective immediately.
    pub effective_from: Option<DateTime<Utc>>,
}

/// Append a new config row. Prior configs and the rewards computed under
/// them are never retroactively altered.
pub async fn append_config(
    State(state): State<AppState>,
    Json(body): Json<AppendConfigRequest>,
) -> Result<Json<ApiResponse<RewardConfig>>, AppError> {
    if body.min_holding_hours < 0 || body.snapshot_interval_hours <= 0 {
        return Err(AppError::BadRequest("Invalid holding or interval hours".into()));
    }
    if body.min_balance_threshold < Decimal::ZERO
        || body.rate_per_500_units < Decimal::ZERO
        || body.max_daily_amount < Decimal::ZERO
    {
        return Err(AppError::BadRequest("Thresholds and rates must be non-negative".into()));
    }
    if body.tolerance_percentage < Decimal::ZERO || body.tolerance_percentage >= Decimal::ONE_HUNDRED
    {
        return Err(AppError::BadRequest("Tolerance must be in [0, 100)".into()));
    }

    let new = NewRewardConfig {
        min_holding_hours: body.min_holding_hours,
        min_balance_threshold: body.min_balance_threshold,
        rate_per_500_units: body.rate_per_500_units,
        max_daily_amount: body.max_daily_amount,
        snapshot_interval_hours: body.snapshot_interval_hours,
        tolerance_percentage: body.tolerance_percentage,
        effective_from: body.effective_from.unwrap_or_else(Utc::now),
    };

    let config = reward_config_repo::append_config(&state.db, &new).await?;

    tracing::info!(
        effective_from = %config.effective_from,
        threshold = %config.min_balance_threshold,
        rate = %config.rate_per_500_units,
        "Reward config appended"
    );

    Ok(Json(ApiResponse::ok(config)))
}
