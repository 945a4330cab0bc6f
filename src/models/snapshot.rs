use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for the balance_snapshots table. Immutable once written,
/// except that a re-delivery at the same (wallet, observed_at) overwrites
/// the balance (keep latest write).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BalanceSnapshot {
    pub id: Uuid,
    pub wallet: String,
    pub balance: Decimal,
    pub observed_at: DateTime<Utc>,
    pub source_block: Option<i64>,
    pub source_tx: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Incoming balance observation — the core ingest message, delivered by the
/// balance-reading collaborator individually or in batches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEvent {
    pub wallet: String,
    pub balance: Decimal,
    pub observed_at: DateTime<Utc>,
    #[serde(default)]
    pub source_block: Option<i64>,
    #[serde(default)]
    pub source_tx: Option<String>,
}
