use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use std::time::Instant;

use crate::accrual::{apply_sample, replay, Transition, TrackerState};
use crate::db::{self, period_repo, reward_config_repo, snapshot_repo};
use crate::models::{RecordOutcome, SnapshotEvent};

/// Boundary validation failures — rejected before anything reaches the
/// tracker or the store.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("wallet must not be empty")]
    EmptyWallet,

    #[error("balance must be non-negative, got {0}")]
    NegativeBalance(Decimal),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Invalid(#[from] SnapshotError),

    /// Storage-level failure — safe to retry; the transaction left no
    /// partial state behind.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub fn validate_event(event: &SnapshotEvent) -> Result<(), SnapshotError> {
    if event.wallet.trim().is_empty() {
        return Err(SnapshotError::EmptyWallet);
    }
    if event.balance < Decimal::ZERO {
        return Err(SnapshotError::NegativeBalance(event.balance));
    }
    Ok(())
}

/// Process a single balance snapshot:
/// 1. Validate at the boundary
/// 2. Take the per-wallet advisory lock (same-wallet applications are
///    order-dependent; different wallets run in parallel)
/// 3. Upsert the observation, detecting duplicates and out-of-order arrivals
/// 4. Advance the holding-period state machine — one transition for an
///    in-order sample, a full history replay when history changed behind us
///
/// Everything after the lock commits as one transaction.
pub async fn process_snapshot_event(
    event: &SnapshotEvent,
    pool: &PgPool,
) -> Result<RecordOutcome, PipelineError> {
    let start = Instant::now();
    validate_event(event)?;

    // One immutable config snapshot for the whole application. Missing
    // config never halts ingestion: the observation is still stored and
    // period tracking resumes once a config becomes effective.
    let config = reward_config_repo::active_config(pool, Utc::now())
        .await
        .map_err(PipelineError::Storage)?;

    let mut tx = pool.begin().await.map_err(anyhow::Error::from)?;

    db::lock_wallet(&mut tx, &event.wallet).await?;

    let prior_latest = snapshot_repo::latest_observed_at(&mut tx, &event.wallet).await?;
    let existing = snapshot_repo::get_at(&mut tx, &event.wallet, event.observed_at).await?;
    let duplicate = existing.is_some();
    let out_of_order = prior_latest.is_some_and(|latest| event.observed_at < latest);

    let snapshot = snapshot_repo::upsert_snapshot(
        &mut tx,
        &event.wallet,
        event.balance,
        event.observed_at,
        event.source_block,
        event.source_tx.as_deref(),
    )
    .await?;

    match &config {
        None => {
            tracing::warn!(
                wallet = %event.wallet,
                "No active reward config — snapshot stored, period tracking skipped"
            );
        }
        Some(cfg) if duplicate || out_of_order => {
            // History changed at or before an already-processed point;
            // rebuild the wallet's periods from scratch. Replay is a pure
            // function of the ordered history, so this is idempotent.
            counter!("snapshots_out_of_order_total").increment(1);
            tracing::info!(
                wallet = %event.wallet,
                observed_at = %event.observed_at,
                duplicate = duplicate,
                "Out-of-order snapshot — replaying wallet history"
            );

            let history = snapshot_repo::get_history(&mut tx, &event.wallet).await?;
            let samples: Vec<(DateTime<Utc>, Decimal)> = history
                .iter()
                .map(|s| (s.observed_at, s.balance))
                .collect();
            let spans = replay(&samples, cfg);
            period_repo::replace_history(&mut tx, &event.wallet, &spans).await?;
        }
        Some(cfg) => match period_repo::get_open_period(&mut tx, &event.wallet).await? {
            None => {
                let (_, transition) =
                    apply_sample(&TrackerState::NoPeriod, event.balance, event.observed_at, cfg);

                if let Transition::Opened(open) = transition {
                    period_repo::open_period(&mut tx, &event.wallet, &open).await?;
                    counter!("periods_opened_total").increment(1);
                    tracing::info!(
                        wallet = %event.wallet,
                        started_at = %open.started_at,
                        "Holding period opened"
                    );
                }
            }
            Some(row) => {
                let state = TrackerState::Open(row.as_open_period());
                let (_, transition) =
                    apply_sample(&state, event.balance, event.observed_at, cfg);

                match transition {
                    Transition::Unchanged | Transition::Opened(_) => {}
                    Transition::Continued {
                        min_balance_observed,
                    } => {
                        if min_balance_observed < row.min_balance_observed {
                            period_repo::update_floor(&mut tx, row.id, min_balance_observed)
                                .await?;
                        }
                    }
                    Transition::Closed { ended_at } => {
                        period_repo::close_period(&mut tx, row.id, ended_at).await?;
                        counter!("periods_closed_total").increment(1);
                        tracing::info!(
                            wallet = %event.wallet,
                            ended_at = %ended_at,
                            "Holding period closed"
                        );
                    }
                    Transition::ClosedAndReopened { ended_at, reopened } => {
                        period_repo::close_period(&mut tx, row.id, ended_at).await?;
                        period_repo::open_period(&mut tx, &event.wallet, &reopened).await?;
                        counter!("periods_closed_total").increment(1);
                        counter!("periods_opened_total").increment(1);
                        tracing::info!(
                            wallet = %event.wallet,
                            ended_at = %ended_at,
                            "Holding period closed and reopened (tolerance break above threshold)"
                        );
                    }
                }
            }
        },
    }

    tx.commit().await.map_err(anyhow::Error::from)?;

    let outcome_label = if duplicate { "duplicate" } else { "accepted" };
    counter!("snapshots_recorded_total", "outcome" => outcome_label).increment(1);
    histogram!("ingest_latency_seconds").record(start.elapsed().as_secs_f64());

    if duplicate {
        Ok(RecordOutcome::Duplicate { id: snapshot.id })
    } else {
        Ok(RecordOutcome::Accepted {
            id: snapshot.id,
            out_of_order,
        })
    }
}

// ---------------------------------------------------------------------------
// Batch ingestion
// ---------------------------------------------------------------------------

/// Per-item batch result. One malformed or failing item never blocks the
/// rest of the batch.
#[derive(Debug, Serialize)]
pub struct BatchItemResult {
    pub wallet: String,
    pub observed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RecordOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
    pub results: Vec<BatchItemResult>,
}

pub async fn process_batch(events: &[SnapshotEvent], pool: &PgPool) -> BatchSummary {
    let mut results = Vec::with_capacity(events.len());
    let mut processed = 0usize;
    let mut failed = 0usize;

    for event in events {
        match process_snapshot_event(event, pool).await {
            Ok(outcome) => {
                processed += 1;
                results.push(BatchItemResult {
                    wallet: event.wallet.clone(),
                    observed_at: event.observed_at,
                    outcome: Some(outcome),
                    error: None,
                });
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(
                    wallet = %event.wallet,
                    error = %e,
                    "Batch item failed"
                );
                results.push(BatchItemResult {
                    wallet: event.wallet.clone(),
                    observed_at: event.observed_at,
                    outcome: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    BatchSummary {
        processed,
        failed,
        results,
    }
}
