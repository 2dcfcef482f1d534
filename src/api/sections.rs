//! Section API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{reindex, require_non_empty, success, ApiResult};
use crate::models::{NewSection, Patch, RuleSection, SectionChanges};
use crate::AppState;

/// GET /api/sections - All sections with their rules.
pub async fn list_sections(State(state): State<AppState>) -> ApiResult<Vec<RuleSection>> {
    success(state.services.sections.get_sections().await?)
}

/// POST /api/sections - Create a section.
pub async fn create_section(
    State(state): State<AppState>,
    Json(request): Json<NewSection>,
) -> ApiResult<RuleSection> {
    require_non_empty(&request.title, "Title")?;

    let section = state.services.sections.create_section(&request).await?;
    success(section)
}

/// PUT /api/sections/:id - Partially update a section.
pub async fn update_section(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SectionChanges>,
) -> ApiResult<RuleSection> {
    if let Patch::Set(title) = &request.title {
        require_non_empty(title, "Title")?;
    }

    let section = state.services.sections.update_section(&id, &request).await?;
    reindex(&state).await;
    success(section)
}

/// DELETE /api/sections/:id - Delete a section (its rules are kept).
pub async fn delete_section(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.services.sections.delete_section(&id).await?;
    reindex(&state).await;
    success(())
}
