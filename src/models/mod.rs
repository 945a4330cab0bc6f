pub mod period;
pub mod reward;
pub mod reward_config;
pub mod snapshot;

pub use period::HoldingPeriod;
pub use reward::DailyReward;
pub use reward_config::RewardConfig;
pub use snapshot::{BalanceSnapshot, SnapshotEvent};

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RecordOutcome
// ---------------------------------------------------------------------------

/// Result of recording a single balance snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum RecordOutcome {
    /// New observation stored. `out_of_order` means it landed before the
    /// wallet's latest observation and the wallet's history was replayed.
    Accepted { id: Uuid, out_of_order: bool },
    /// A snapshot at this (wallet, observed_at) already existed; the stored
    /// balance was overwritten (keep latest write) and history replayed.
    Duplicate { id: Uuid },
}

impl RecordOutcome {
    pub fn snapshot_id(&self) -> Uuid {
        match self {
            RecordOutcome::Accepted { id, .. } => *id,
            RecordOutcome::Duplicate { id } => *id,
        }
    }
}

// ---------------------------------------------------------------------------
// ClaimOutcome
// ---------------------------------------------------------------------------

/// Result of attempting to claim a day's reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimOutcome {
    Claimed,
    AlreadyClaimed,
    NotEligible,
}

impl ClaimOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimOutcome::Claimed => "claimed",
            ClaimOutcome::AlreadyClaimed => "already_claimed",
            ClaimOutcome::NotEligible => "not_eligible",
        }
    }
}

impl fmt::Display for ClaimOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
