//! Admin overview endpoints.

use axum::extract::State;

use super::{success, ApiResult};
use crate::admin::DashboardStats;
use crate::services::StoreCounts;
use crate::AppState;

/// GET /api/admin/stats - Section and rule counts from the store.
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<StoreCounts> {
    success(state.services.admin.get_stats().await?)
}

/// GET /api/admin/dashboard - Distribution and freshness of the loaded rulebook.
pub async fn get_dashboard(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    let sections = state.services.sections.get_sections().await?;
    success(DashboardStats::from_sections(&sections))
}
