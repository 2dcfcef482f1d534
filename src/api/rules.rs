//! Rule API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{reindex, require_non_empty, success, ApiResult};
use crate::models::{NewRule, Rule, RuleChanges};
use crate::AppState;

/// GET /api/rules - All rules ordered by order index.
pub async fn list_rules(State(state): State<AppState>) -> ApiResult<Vec<Rule>> {
    success(state.services.rules.get_rules().await?)
}

/// POST /api/rules - Create a rule in a section.
pub async fn create_rule(
    State(state): State<AppState>,
    Json(request): Json<NewRule>,
) -> ApiResult<Rule> {
    require_non_empty(&request.section_id, "Section id")?;
    require_non_empty(&request.title, "Title")?;

    let rule = state.services.rules.create_rule(&request).await?;
    reindex(&state).await;
    success(rule)
}

/// PUT /api/rules/:id - Partially update a rule.
pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RuleChanges>,
) -> ApiResult<Rule> {
    let rule = state.services.rules.update_rule(&id, &request).await?;
    reindex(&state).await;
    success(rule)
}

/// DELETE /api/rules/:id - Delete a rule.
pub async fn delete_rule(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.services.rules.delete_rule(&id).await?;
    reindex(&state).await;
    success(())
}
