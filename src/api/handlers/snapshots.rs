use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ApiResponse;
use crate::errors::AppError;
use crate::ingestion::{self, BatchSummary};
use crate::models::{RecordOutcome, SnapshotEvent};
use crate::AppState;

#[derive(Serialize)]
pub struct RecordResponse {
    pub snapshot_id: Uuid,
    pub outcome: RecordOutcome,
}

/// Record one balance snapshot.
pub async fn record(
    State(state): State<AppState>,
    Json(event): Json<SnapshotEvent>,
) -> Result<Json<ApiResponse<RecordResponse>>, AppError> {
    let outcome = ingestion::process_snapshot_event(&event, &state.db).await?;

    Ok(Json(ApiResponse::ok(RecordResponse {
        snapshot_id: outcome.snapshot_id(),
        outcome,
    })))
}

#[derive(Deserialize)]
pub struct BatchRequest {
    pub snapshots: Vec<SnapshotEvent>,
}

/// Record a batch of snapshots. Items are processed independently; the
/// response reports a per-item outcome or error.
pub async fn batch(
    State(state): State<AppState>,
    Json(body): Json<BatchRequest>,
) -> Json<ApiResponse<BatchSummary>> {
    let summary = ingestion::process_batch(&body.snapshots, &state.db).await;
    Json(ApiResponse::ok(summary))
}
