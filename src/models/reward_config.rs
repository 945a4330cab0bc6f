use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for the reward_configs table.
///
/// Rows are append-only and time-scoped: the active config at any instant is
/// the one with the greatest `effective_from <= now`. Superseded rows are
/// retained untouched so past rewards stay auditable against the parameters
/// they were computed under.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RewardConfig {
    pub id: Uuid,
    pub min_holding_hours: i32,
    pub min_balance_threshold: Decimal,
    pub rate_per_500_units: Decimal,
    pub max_daily_amount: Decimal,
    pub snapshot_interval_hours: i32,
    pub tolerance_percentage: Decimal,
    pub effective_from: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
}

impl RewardConfig {
    /// Multiplier applied to a reference balance to get the lowest value a
    /// sample may dip to without breaking an open period.
    pub fn tolerance_factor(&self) -> Decimal {
        Decimal::ONE - self.tolerance_percentage / Decimal::ONE_HUNDRED
    }
}
