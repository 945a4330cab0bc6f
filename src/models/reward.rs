use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for the daily_rewards table — one per (wallet, reward_date).
///
/// `amount` is fixed at creation and never recomputed later that day;
/// `claimed` flips false→true exactly once via a conditional update.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyReward {
    pub id: Uuid,
    pub wallet: String,
    pub reward_date: NaiveDate,
    pub basis_balance: Decimal,
    pub amount: Decimal,
    pub claimed: bool,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}
