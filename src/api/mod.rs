//! REST API module.
//!
//! Handlers are thin: they call the service facade and wrap the outcome in
//! the `{ success, data }` envelope. Mutations rebuild the search index
//! afterwards.

mod admin;
mod backups;
mod rules;
mod search;
mod sections;
mod site;

pub use admin::*;
pub use backups::*;
pub use rules::*;
pub use search::*;
pub use sections::*;
pub use site::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Reload sections and rebuild the search index. Failures are logged only.
pub async fn reindex(state: &AppState) {
    let sections = match state.services.sections.get_sections().await {
        Ok(sections) => sections,
        Err(e) => {
            tracing::warn!("Failed to load sections for reindex: {}", e);
            return;
        }
    };

    if let Err(e) = state.search.rebuild(&sections).await {
        tracing::warn!("Failed to rebuild search index: {}", e);
    }
}

fn require_non_empty(value: &str, what: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", what)));
    }
    Ok(())
}
