//! Search API endpoints.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::search::{RuleHit, MAX_SEARCH_LIMIT, MAX_SEARCH_OFFSET};
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string.
    #[serde(default)]
    pub q: String,
    /// Maximum number of results (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

/// Search results with paging metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<RuleHit>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// GET /api/search - Search rules.
pub async fn search_rules(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let limit = params.limit.min(MAX_SEARCH_LIMIT);
    let offset = params.offset.min(MAX_SEARCH_OFFSET);

    let results = state.search.search(&params.q, limit, offset)?;
    let total = results.len();

    success(SearchResponse {
        results,
        total,
        limit,
        offset,
    })
}
