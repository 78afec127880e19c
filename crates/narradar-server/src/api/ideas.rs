use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use narradar_core::types::{BuildIdea, IdeaCategory};

use super::{snapshot_or_rehydrate, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct IdeaParams {
    category: Option<String>,
}

/// A build idea with its parent narrative attributed inline.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct IdeaItem {
    #[serde(flatten)]
    pub idea: BuildIdea,
    pub narrative_title: String,
    pub narrative_slug: String,
}

/// `GET /api/ideas` — every idea across all narratives, best-scored first,
/// optionally filtered by `?category=`.
pub(super) async fn list_ideas(
    State(state): State<AppState>,
    Query(params): Query<IdeaParams>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<IdeaItem>>>, ApiError> {
    let category = params
        .category
        .as_deref()
        .map(str::parse::<IdeaCategory>)
        .transpose()
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e))?;

    let mut items: Vec<IdeaItem> = match snapshot_or_rehydrate(&state).await {
        Some(snapshot) => snapshot
            .narratives
            .iter()
            .flat_map(|narrative| {
                narrative
                    .ideas
                    .iter()
                    .filter(|idea| category.is_none_or(|c| idea.category == c))
                    .map(|idea| IdeaItem {
                        idea: idea.clone(),
                        narrative_title: narrative.title.clone(),
                        narrative_slug: narrative.slug.clone(),
                    })
            })
            .collect(),
        None => vec![],
    };
    items.sort_by(|a, b| b.idea.score.total_cmp(&a.idea.score));

    Ok(Json(ApiResponse {
        data: items,
        meta: ResponseMeta::new(req_id.0),
    }))
}
