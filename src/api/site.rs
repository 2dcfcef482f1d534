//! Site chrome endpoint.

use axum::extract::State;

use super::{success, ApiResult};
use crate::chrome::SiteInfo;
use crate::AppState;

/// GET /api/site - Footer links and rulebook version.
pub async fn get_site(State(state): State<AppState>) -> ApiResult<SiteInfo> {
    success(state.config.site.clone())
}
