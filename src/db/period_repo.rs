use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::accrual::{OpenPeriod, PeriodSpan};
use crate::models::HoldingPeriod;

/// Fetch the wallet's open period, if one exists. The partial unique index
/// guarantees at most one.
pub async fn get_open_period(
    conn: &mut PgConnection,
    wallet: &str,
) -> anyhow::Result<Option<HoldingPeriod>> {
    let period = sqlx::query_as::<_, HoldingPeriod>(
        "SELECT * FROM holding_periods WHERE wallet = $1 AND ended_at IS NULL",
    )
    .bind(wallet)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(period)
}

/// Open a new period for a wallet.
pub async fn open_period(
    conn: &mut PgConnection,
    wallet: &str,
    open: &OpenPeriod,
) -> anyhow::Result<HoldingPeriod> {
    let period = sqlx::query_as::<_, HoldingPeriod>(
        r#"
        INSERT INTO holding_periods (wallet, started_at, min_balance_observed, threshold_at_start)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(wallet)
    .bind(open.started_at)
    .bind(open.min_balance_observed)
    .bind(open.threshold_at_start)
    .fetch_one(&mut *conn)
    .await?;

    Ok(period)
}

/// Ratchet the floor of an open period down.
pub async fn update_floor(
    conn: &mut PgConnection,
    period_id: Uuid,
    min_balance_observed: Decimal,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE holding_periods
        SET min_balance_observed = $2, updated_at = NOW()
        WHERE id = $1 AND ended_at IS NULL
        "#,
    )
    .bind(period_id)
    .bind(min_balance_observed)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Close an open period. Closed periods are immutable from here on.
pub async fn close_period(
    conn: &mut PgConnection,
    period_id: Uuid,
    ended_at: DateTime<Utc>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE holding_periods
        SET ended_at = $2, updated_at = NOW()
        WHERE id = $1 AND ended_at IS NULL
        "#,
    )
    .bind(period_id)
    .bind(ended_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Replace a wallet's entire period history with a replayed one. Runs
/// inside the caller's transaction so an out-of-order rebuild is atomic.
pub async fn replace_history(
    conn: &mut PgConnection,
    wallet: &str,
    spans: &[PeriodSpan],
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM holding_periods WHERE wallet = $1")
        .bind(wallet)
        .execute(&mut *conn)
        .await?;

    for span in spans {
        sqlx::query(
            r#"
            INSERT INTO holding_periods
                (wallet, started_at, ended_at, min_balance_observed, threshold_at_start)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(wallet)
        .bind(span.started_at)
        .bind(span.ended_at)
        .bind(span.min_balance_observed)
        .bind(span.threshold_at_start)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Holding periods for a wallet, newest first.
pub async fn get_sessions(
    pool: &PgPool,
    wallet: &str,
    limit: i64,
) -> anyhow::Result<Vec<HoldingPeriod>> {
    let periods = sqlx::query_as::<_, HoldingPeriod>(
        "SELECT * FROM holding_periods WHERE wallet = $1 ORDER BY started_at DESC LIMIT $2",
    )
    .bind(wallet)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(periods)
}

/// Pool-side lookup of the open period (query paths that don't hold the
/// wallet lock).
pub async fn find_open_period(
    pool: &PgPool,
    wallet: &str,
) -> anyhow::Result<Option<HoldingPeriod>> {
    let period = sqlx::query_as::<_, HoldingPeriod>(
        "SELECT * FROM holding_periods WHERE wallet = $1 AND ended_at IS NULL",
    )
    .bind(wallet)
    .fetch_optional(pool)
    .await?;

    Ok(period)
}

/// Wallets that currently have an open period — candidates for granting.
pub async fn wallets_with_open_period(pool: &PgPool) -> anyhow::Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT wallet FROM holding_periods WHERE ended_at IS NULL ORDER BY wallet",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(w,)| w).collect())
}
