//! Backup API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{require_non_empty, success, ApiResult};
use crate::errors::AppError;
use crate::models::{BackupCreated, BackupMeta, CreateBackupRequest, RuleSection};
use crate::AppState;

/// GET /api/backups - Backup metadata, newest first.
pub async fn list_backups(State(state): State<AppState>) -> ApiResult<Vec<BackupMeta>> {
    success(state.services.backups.list_backups().await?)
}

/// POST /api/backups - Snapshot the given sections, or the live rulebook.
pub async fn create_backup(
    State(state): State<AppState>,
    Json(request): Json<CreateBackupRequest>,
) -> ApiResult<BackupCreated> {
    require_non_empty(&request.name, "Backup name")?;

    let sections = match request.sections {
        Some(sections) => sections,
        None => state.services.sections.get_sections().await?,
    };

    let created = state
        .services
        .backups
        .create_backup(&request.name, request.kind, &sections)
        .await?;
    success(created)
}

/// GET /api/backups/:id/data - The stored snapshot.
pub async fn get_backup_data(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<RuleSection>> {
    success(state.services.backups.fetch_backup_data(&id).await?)
}

/// Sweep parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepQuery {
    /// Minimum age of an incomplete backup before removal (default: 60).
    #[serde(default = "default_sweep_minutes")]
    pub older_than_minutes: i64,
}

fn default_sweep_minutes() -> i64 {
    60
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub removed: usize,
}

/// POST /api/backups/sweep - Remove backups whose snapshot was never written.
pub async fn sweep_backups(
    State(state): State<AppState>,
    Query(params): Query<SweepQuery>,
) -> ApiResult<SweepResponse> {
    let older_than = chrono::TimeDelta::try_minutes(params.older_than_minutes.max(0))
        .ok_or_else(|| AppError::BadRequest("olderThanMinutes is out of range".to_string()))?;
    let removed = state
        .services
        .backups
        .sweep_incomplete(older_than)
        .await?;
    success(SweepResponse { removed })
}
