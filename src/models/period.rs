use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for the holding_periods table.
///
/// `ended_at = None` means the period is still open; at most one open row
/// exists per wallet (enforced by a partial unique index). Once closed a
/// period is never mutated again.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HoldingPeriod {
    pub id: Uuid,
    pub wallet: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub min_balance_observed: Decimal,
    pub threshold_at_start: Decimal,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl HoldingPeriod {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// View an open row as tracker state.
    pub fn as_open_period(&self) -> crate::accrual::OpenPeriod {
        crate::accrual::OpenPeriod {
            started_at: self.started_at,
            threshold_at_start: self.threshold_at_start,
            min_balance_observed: self.min_balance_observed,
        }
    }

    /// Hours elapsed from start to `as_of` (or to close, whichever is first).
    pub fn duration_hours(&self, as_of: DateTime<Utc>) -> i64 {
        let end = match self.ended_at {
            Some(ended) => ended.min(as_of),
            None => as_of,
        };
        (end - self.started_at).num_hours()
    }
}
