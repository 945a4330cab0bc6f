use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio::time::sleep;

use crate::db::{period_repo, reward_config_repo};
use crate::services::evaluator;

/// Background reward granter.
///
/// Every `interval_secs`, evaluate every wallet with an open holding period
/// and materialize today's reward row for the eligible ones, so grants
/// exist even when nobody polls the eligibility endpoint that day. The
/// (wallet, day) unique constraint makes a pass re-runnable; a second pass
/// on the same day returns the rows the first one created.
pub async fn run_reward_granter(pool: PgPool, interval_secs: u64) {
    tracing::info!(interval_secs = interval_secs, "Reward granter started");

    loop {
        sleep(Duration::from_secs(interval_secs)).await;

        let now = Utc::now();

        // One immutable config per pass.
        let config = match reward_config_repo::active_config(&pool, now).await {
            Ok(Some(cfg)) => cfg,
            Ok(None) => {
                tracing::warn!("Granter pass skipped: no active reward config");
                continue;
            }
            Err(e) => {
                tracing::error!(error = %e, "Granter: failed to load config");
                continue;
            }
        };

        let wallets = match period_repo::wallets_with_open_period(&pool).await {
            Ok(w) => w,
            Err(e) => {
                tracing::error!(error = %e, "Granter: failed to list candidate wallets");
                continue;
            }
        };

        let mut granted = 0u32;

        for wallet in &wallets {
            match evaluator::evaluate_and_grant(&pool, wallet, now, &config).await {
                Ok(Some(_)) => granted += 1,
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        wallet = %wallet,
                        "Granter: wallet evaluation failed"
                    );
                }
            }
        }

        if granted > 0 {
            tracing::info!(
                candidates = wallets.len(),
                granted = granted,
                "Granter pass complete"
            );
        }
    }
}
