use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::RewardConfig;

/// Parameters for a new config row (appended, never edited).
#[derive(Debug, Clone)]
pub struct NewRewardConfig {
    pub min_holding_hours: i32,
    pub min_balance_threshold: Decimal,
    pub rate_per_500_units: Decimal,
    pub max_daily_amount: Decimal,
    pub snapshot_interval_hours: i32,
    pub tolerance_percentage: Decimal,
    pub effective_from: DateTime<Utc>,
}

/// The config active at `as_of`: greatest effective_from <= as_of.
/// None means no config has come into effect yet — callers fail closed.
pub async fn active_config(
    pool: &PgPool,
    as_of: DateTime<Utc>,
) -> anyhow::Result<Option<RewardConfig>> {
    let config = sqlx::query_as::<_, RewardConfig>(
        r#"
        SELECT * FROM reward_configs
        WHERE effective_from <= $1
        ORDER BY effective_from DESC
        LIMIT 1
        "#,
    )
    .bind(as_of)
    .fetch_optional(pool)
    .await?;

    Ok(config)
}

/// Append a new config row. Prior rows (and the rewards computed under
/// them) are never touched.
pub async fn append_config(
    pool: &PgPool,
    new: &NewRewardConfig,
) -> anyhow::Result<RewardConfig> {
    let config = sqlx::query_as::<_, RewardConfig>(
        r#"
        INSERT INTO reward_configs
            (min_holding_hours, min_balance_threshold, rate_per_500_units,
             max_daily_amount, snapshot_interval_hours, tolerance_percentage,
             effective_from)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(new.min_holding_hours)
    .bind(new.min_balance_threshold)
    .bind(new.rate_per_500_units)
    .bind(new.max_daily_amount)
    .bind(new.snapshot_interval_hours)
    .bind(new.tolerance_percentage)
    .bind(new.effective_from)
    .fetch_one(pool)
    .await?;

    Ok(config)
}

/// Seed an initial config row on first boot so a fresh deployment is
/// operational without a manual admin call. No-op when any row exists.
pub async fn seed_if_empty(
    pool: &PgPool,
    new: &NewRewardConfig,
) -> anyhow::Result<Option<RewardConfig>> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reward_configs")
        .fetch_one(pool)
        .await?;

    if row.0 > 0 {
        return Ok(None);
    }

    let config = append_config(pool, new).await?;
    Ok(Some(config))
}
