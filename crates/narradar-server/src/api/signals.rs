use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use narradar_core::types::{Signal, SignalSource};

use super::{
    normalize_page, normalize_page_size, snapshot_or_rehydrate, ApiError, ApiResponse, AppState,
    ResponseMeta,
};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SignalParams {
    source: Option<String>,
    page: Option<usize>,
    page_size: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SignalsPage {
    pub items: Vec<Signal>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

/// `GET /api/signals` — the current snapshot's ranked signals, optionally
/// filtered by `?source=`, paginated with `?page=&pageSize=`.
pub(super) async fn list_signals(
    State(state): State<AppState>,
    Query(params): Query<SignalParams>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<SignalsPage>>, ApiError> {
    let source = params
        .source
        .as_deref()
        .map(str::parse::<SignalSource>)
        .transpose()
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e))?;

    let page = normalize_page(params.page);
    let page_size = normalize_page_size(params.page_size);

    let filtered: Vec<Signal> = match snapshot_or_rehydrate(&state).await {
        Some(snapshot) => snapshot
            .all_signals
            .iter()
            .filter(|signal| source.is_none_or(|src| signal.source == src))
            .cloned()
            .collect(),
        None => vec![],
    };

    let total = filtered.len();
    // Saturate: an out-of-range page yields an empty page, never an overflow.
    let offset = (page - 1).saturating_mul(page_size);
    let items = filtered
        .into_iter()
        .skip(offset)
        .take(page_size)
        .collect();

    Ok(Json(ApiResponse {
        data: SignalsPage {
            items,
            total,
            page,
            page_size,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
