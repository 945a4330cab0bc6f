pub mod period_repo;
pub mod reward_config_repo;
pub mod reward_repo;
pub mod snapshot_repo;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    // Verify connectivity
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// Take the advisory transaction lock that serializes snapshot application
/// for one wallet. Held until the surrounding transaction commits or rolls
/// back; different wallets hash to different keys and proceed in parallel.
pub async fn lock_wallet(conn: &mut sqlx::PgConnection, wallet: &str) -> anyhow::Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1)::bigint)")
        .bind(wallet)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
