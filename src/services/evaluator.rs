use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::accrual::compute_reward;
use crate::db::{period_repo, reward_config_repo, reward_repo, snapshot_repo};
use crate::models::{DailyReward, RewardConfig};

/// Answer to "where does this wallet stand right now".
#[derive(Debug, Clone, serde::Serialize)]
pub struct EligibilityReport {
    pub is_eligible: bool,
    pub min_balance_24h: Decimal,
    pub today_reward: Option<DailyReward>,
}

/// True iff the wallet's open period has run for at least the configured
/// minimum holding duration at `as_of`. Closed periods never qualify.
pub async fn is_eligible(
    pool: &PgPool,
    wallet: &str,
    as_of: DateTime<Utc>,
    config: &RewardConfig,
) -> anyhow::Result<bool> {
    let open = period_repo::find_open_period(pool, wallet).await?;

    Ok(open
        .map(|p| p.duration_hours(as_of) >= i64::from(config.min_holding_hours))
        .unwrap_or(false))
}

/// Minimum snapshot balance over [as_of − 24h, as_of]. No samples in the
/// window means zero — the reward basis fails closed. This is the primary
/// anti-gaming control: a balance spike just before evaluation cannot
/// inflate the basis above what was held all day.
pub async fn min_balance_24h(
    pool: &PgPool,
    wallet: &str,
    as_of: DateTime<Utc>,
) -> anyhow::Result<Decimal> {
    let from = as_of - Duration::hours(24);
    let min = snapshot_repo::min_balance_in_window(pool, wallet, from, as_of).await?;

    Ok(min.unwrap_or(Decimal::ZERO))
}

/// Evaluate a wallet under one immutable config and, if it qualifies,
/// materialize today's reward row. An existing row for the day is returned
/// unchanged — the amount is fixed at creation.
pub async fn evaluate_and_grant(
    pool: &PgPool,
    wallet: &str,
    as_of: DateTime<Utc>,
    config: &RewardConfig,
) -> anyhow::Result<Option<DailyReward>> {
    if !is_eligible(pool, wallet, as_of, config).await? {
        return Ok(None);
    }

    let basis = min_balance_24h(pool, wallet, as_of).await?;
    let amount = compute_reward(basis, config);
    if amount.is_zero() {
        return Ok(None);
    }

    let existed = reward_repo::get_for_date(pool, wallet, as_of.date_naive())
        .await?
        .is_some();

    let reward =
        reward_repo::get_or_create(pool, wallet, as_of.date_naive(), basis, amount).await?;

    if !existed {
        counter!("rewards_granted_total").increment(1);
        tracing::info!(
            wallet = %wallet,
            reward_date = %reward.reward_date,
            basis = %reward.basis_balance,
            amount = %reward.amount,
            "Daily reward granted"
        );
    }

    Ok(Some(reward))
}

/// Full eligibility check for the adapter layer. Binds the active config
/// once for the whole evaluation; no active config fails closed.
pub async fn check_eligibility(
    pool: &PgPool,
    wallet: &str,
    as_of: DateTime<Utc>,
) -> anyhow::Result<EligibilityReport> {
    let Some(config) = reward_config_repo::active_config(pool, as_of).await? else {
        tracing::warn!(wallet = %wallet, "No active reward config — reporting ineligible");
        return Ok(EligibilityReport {
            is_eligible: false,
            min_balance_24h: Decimal::ZERO,
            today_reward: reward_repo::get_for_date(pool, wallet, as_of.date_naive()).await?,
        });
    };

    let eligible = is_eligible(pool, wallet, as_of, &config).await?;
    let min_24h = min_balance_24h(pool, wallet, as_of).await?;
    let today_reward = evaluate_and_grant(pool, wallet, as_of, &config).await?;

    Ok(EligibilityReport {
        is_eligible: eligible,
        min_balance_24h: min_24h,
        today_reward,
    })
}
