use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::models::BalanceSnapshot;

/// Latest observation time for a wallet, if any snapshots exist.
pub async fn latest_observed_at(
    conn: &mut PgConnection,
    wallet: &str,
) -> anyhow::Result<Option<DateTime<Utc>>> {
    let row: Option<(DateTime<Utc>,)> = sqlx::query_as(
        "SELECT observed_at FROM balance_snapshots WHERE wallet = $1 ORDER BY observed_at DESC LIMIT 1",
    )
    .bind(wallet)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(|(ts,)| ts))
}

/// Fetch the snapshot at an exact (wallet, observed_at), if present.
pub async fn get_at(
    conn: &mut PgConnection,
    wallet: &str,
    observed_at: DateTime<Utc>,
) -> anyhow::Result<Option<BalanceSnapshot>> {
    let snapshot = sqlx::query_as::<_, BalanceSnapshot>(
        "SELECT * FROM balance_snapshots WHERE wallet = $1 AND observed_at = $2",
    )
    .bind(wallet)
    .bind(observed_at)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(snapshot)
}

/// Insert a snapshot, or overwrite the balance if one already exists at the
/// same (wallet, observed_at) — duplicates resolve to keep-latest-write.
pub async fn upsert_snapshot(
    conn: &mut PgConnection,
    wallet: &str,
    balance: Decimal,
    observed_at: DateTime<Utc>,
    source_block: Option<i64>,
    source_tx: Option<&str>,
) -> anyhow::Result<BalanceSnapshot> {
    let snapshot = sqlx::query_as::<_, BalanceSnapshot>(
        r#"
        INSERT INTO balance_snapshots (wallet, balance, observed_at, source_block, source_tx)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (wallet, observed_at) DO UPDATE
            SET balance = EXCLUDED.balance,
                source_block = EXCLUDED.source_block,
                source_tx = EXCLUDED.source_tx
        RETURNING *
        "#,
    )
    .bind(wallet)
    .bind(balance)
    .bind(observed_at)
    .bind(source_block)
    .bind(source_tx)
    .fetch_one(&mut *conn)
    .await?;

    Ok(snapshot)
}

/// Full ordered history for a wallet, ascending by observation time.
pub async fn get_history(
    conn: &mut PgConnection,
    wallet: &str,
) -> anyhow::Result<Vec<BalanceSnapshot>> {
    let snapshots = sqlx::query_as::<_, BalanceSnapshot>(
        "SELECT * FROM balance_snapshots WHERE wallet = $1 ORDER BY observed_at ASC",
    )
    .bind(wallet)
    .fetch_all(&mut *conn)
    .await?;

    Ok(snapshots)
}

/// Ordered snapshots for a wallet from `from` onwards, ascending.
pub async fn get_since(
    pool: &PgPool,
    wallet: &str,
    from: DateTime<Utc>,
) -> anyhow::Result<Vec<BalanceSnapshot>> {
    let snapshots = sqlx::query_as::<_, BalanceSnapshot>(
        r#"
        SELECT * FROM balance_snapshots
        WHERE wallet = $1 AND observed_at >= $2
        ORDER BY observed_at ASC
        "#,
    )
    .bind(wallet)
    .bind(from)
    .fetch_all(pool)
    .await?;

    Ok(snapshots)
}

/// Minimum observed balance in [from, to]. None when the window holds no
/// samples — callers treat that as zero (fail closed).
pub async fn min_balance_in_window(
    pool: &PgPool,
    wallet: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> anyhow::Result<Option<Decimal>> {
    let row: (Option<Decimal>,) = sqlx::query_as(
        r#"
        SELECT MIN(balance) FROM balance_snapshots
        WHERE wallet = $1 AND observed_at >= $2 AND observed_at <= $3
        "#,
    )
    .bind(wallet)
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}
