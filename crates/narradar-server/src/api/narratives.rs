use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use narradar_core::types::{Narrative, NarrativeStatus, TrendDirection};

use super::{snapshot_or_rehydrate, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

/// List representation: counts instead of the full signal/idea payloads.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NarrativeListItem {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub explanation: String,
    pub status: NarrativeStatus,
    pub confidence_score: f64,
    pub trend_direction: TrendDirection,
    pub tags: Vec<String>,
    pub period: String,
    pub signal_count: usize,
    pub idea_count: usize,
    pub detected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Narrative> for NarrativeListItem {
    fn from(n: &Narrative) -> Self {
        Self {
            id: n.id,
            title: n.title.clone(),
            slug: n.slug.clone(),
            description: n.description.clone(),
            explanation: n.explanation.clone(),
            status: n.status,
            confidence_score: n.confidence_score,
            trend_direction: n.trend_direction,
            tags: n.tags.clone(),
            period: n.period.clone(),
            signal_count: n.signals.len(),
            idea_count: n.ideas.len(),
            detected_at: n.detected_at,
            updated_at: n.updated_at,
        }
    }
}

/// `GET /api/narratives` — every narrative from the current snapshot,
/// already ordered by descending confidence. Empty when no analysis has
/// run and nothing could be rehydrated.
pub(super) async fn list_narratives(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<NarrativeListItem>>> {
    let items = match snapshot_or_rehydrate(&state).await {
        Some(snapshot) => snapshot.narratives.iter().map(NarrativeListItem::from).collect(),
        None => vec![],
    };
    Json(ApiResponse {
        data: items,
        meta: ResponseMeta::new(req_id.0),
    })
}

/// `GET /api/narratives/{key}` — one narrative in full, addressed by its
/// logical slug or its id.
pub(super) async fn get_narrative(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Narrative>>, ApiError> {
    let snapshot = snapshot_or_rehydrate(&state)
        .await
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "no analysis available"))?;

    let id = key.parse::<Uuid>().ok();
    let narrative = snapshot
        .narratives
        .iter()
        .find(|n| n.slug == key || id.is_some_and(|id| n.id == id))
        .cloned()
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("no narrative matching '{key}'"),
            )
        })?;

    Ok(Json(ApiResponse {
        data: narrative,
        meta: ResponseMeta::new(req_id.0),
    }))
}
