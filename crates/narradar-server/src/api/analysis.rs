use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use narradar_core::types::RunMetadata;
use narradar_pipeline::PipelineError;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AnalyzeData {
    narrative_count: usize,
    signal_count: usize,
    idea_count: usize,
    duration_ms: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct StatusData {
    is_analyzing: bool,
    last_analyzed_at: Option<DateTime<Utc>>,
    last_run: Option<RunMetadata>,
}

/// `POST /api/analyze` — run the full pipeline now.
///
/// Refuses with `409 conflict` while another run is active; concurrent
/// triggers never queue.
pub(super) async fn trigger_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<AnalyzeData>>, ApiError> {
    let Some(_guard) = state.store.try_begin_analysis() else {
        return Err(ApiError::new(
            req_id.0,
            "conflict",
            "an analysis run is already in progress",
        ));
    };

    let metadata = run_analysis(&state).await.map_err(|e| {
        tracing::error!(error = %e, "analysis run failed");
        ApiError::new(req_id.0.clone(), "analysis_failed", e.to_string())
    })?;

    Ok(Json(ApiResponse {
        data: AnalyzeData {
            narrative_count: metadata.narrative_count,
            signal_count: metadata.signal_count,
            idea_count: metadata.idea_count,
            duration_ms: metadata.duration_ms,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Executes one pipeline run, caches the snapshot, and persists it.
///
/// The caller must already hold the run guard. Persistence is best-effort:
/// a storage failure is logged and the in-memory result still stands.
pub(crate) async fn run_analysis(state: &AppState) -> Result<RunMetadata, PipelineError> {
    let snapshot = state.pipeline.run().await?;
    let metadata = snapshot.metadata.clone();
    state.store.set_cached_result(snapshot.clone());

    match state.store.save_to_database(&state.pool, &snapshot).await {
        Ok(report_id) => tracing::info!(report = %report_id, "analysis report persisted"),
        Err(err) => tracing::error!(error = %err, "failed to persist analysis report"),
    }

    Ok(metadata)
}

/// `GET /api/analysis/status` — gate state and last-run bookkeeping.
pub(super) async fn analysis_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<StatusData>> {
    let last_run = state.store.cached_result().map(|s| s.metadata.clone());
    Json(ApiResponse {
        data: StatusData {
            is_analyzing: state.store.is_analyzing(),
            last_analyzed_at: state.store.last_analyzed_at(),
            last_run,
        },
        meta: ResponseMeta::new(req_id.0),
    })
}
