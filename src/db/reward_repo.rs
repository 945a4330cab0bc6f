use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::{ClaimOutcome, DailyReward};

/// Fetch the reward row for a given (wallet, day), if any.
pub async fn get_for_date(
    pool: &PgPool,
    wallet: &str,
    reward_date: NaiveDate,
) -> anyhow::Result<Option<DailyReward>> {
    let reward = sqlx::query_as::<_, DailyReward>(
        "SELECT * FROM daily_rewards WHERE wallet = $1 AND reward_date = $2",
    )
    .bind(wallet)
    .bind(reward_date)
    .fetch_optional(pool)
    .await?;

    Ok(reward)
}

/// Return the existing (wallet, day) row unchanged, or create it with the
/// given basis and amount. The unique constraint makes concurrent creators
/// converge on a single row; the amount is never recomputed afterwards.
pub async fn get_or_create(
    pool: &PgPool,
    wallet: &str,
    reward_date: NaiveDate,
    basis_balance: Decimal,
    amount: Decimal,
) -> anyhow::Result<DailyReward> {
    let inserted = sqlx::query_as::<_, DailyReward>(
        r#"
        INSERT INTO daily_rewards (wallet, reward_date, basis_balance, amount)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (wallet, reward_date) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(wallet)
    .bind(reward_date)
    .bind(basis_balance)
    .bind(amount)
    .fetch_optional(pool)
    .await?;

    if let Some(reward) = inserted {
        return Ok(reward);
    }

    // Lost the insert race (or the row predated us) — read the winner back.
    let existing = sqlx::query_as::<_, DailyReward>(
        "SELECT * FROM daily_rewards WHERE wallet = $1 AND reward_date = $2",
    )
    .bind(wallet)
    .bind(reward_date)
    .fetch_one(pool)
    .await?;

    Ok(existing)
}

/// Claim a day's reward. The conditional update is the compare-and-set:
/// exactly one concurrent caller flips claimed false→true; the rest see
/// AlreadyClaimed. A day with no reward row is NotEligible.
pub async fn claim(
    pool: &PgPool,
    wallet: &str,
    reward_date: NaiveDate,
) -> anyhow::Result<(ClaimOutcome, Option<DailyReward>)> {
    let claimed = sqlx::query_as::<_, DailyReward>(
        r#"
        UPDATE daily_rewards
        SET claimed = TRUE, claimed_at = NOW()
        WHERE wallet = $1 AND reward_date = $2 AND claimed = FALSE
        RETURNING *
        "#,
    )
    .bind(wallet)
    .bind(reward_date)
    .fetch_optional(pool)
    .await?;

    if let Some(reward) = claimed {
        return Ok((ClaimOutcome::Claimed, Some(reward)));
    }

    let existing = get_for_date(pool, wallet, reward_date).await?;
    match existing {
        Some(reward) => Ok((ClaimOutcome::AlreadyClaimed, Some(reward))),
        None => Ok((ClaimOutcome::NotEligible, None)),
    }
}

/// Rewards for a wallet, newest first.
pub async fn get_recent_rewards(
    pool: &PgPool,
    wallet: &str,
    limit: i64,
) -> anyhow::Result<Vec<DailyReward>> {
    let rewards = sqlx::query_as::<_, DailyReward>(
        "SELECT * FROM daily_rewards WHERE wallet = $1 ORDER BY reward_date DESC LIMIT $2",
    )
    .bind(wallet)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rewards)
}

/// Count distinct rewarded days for a wallet.
pub async fn count_rewarded_days(pool: &PgPool, wallet: &str) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM daily_rewards WHERE wallet = $1",
    )
    .bind(wallet)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}
