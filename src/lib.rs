//! Rulebook Backend
//!
//! REST backend for a sectioned rulebook: a record store (PostgREST or
//! SQLite), a service facade over it, admin aggregation, backups and a
//! Tantivy full-text index of rules.

pub mod admin;
pub mod api;
pub mod auth;
pub mod chrome;
pub mod config;
pub mod errors;
pub mod mapper;
pub mod models;
pub mod search;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use search::SearchIndex;
use services::Services;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    // Reads used by the public rulebook page
    let public_routes = Router::new()
        .route("/sections", get(api::list_sections))
        .route("/rules", get(api::list_rules))
        .route("/search", get(api::search_rules))
        .route("/site", get(api::get_site));

    let admin_routes = Router::new()
        // Sections
        .route("/sections", post(api::create_section))
        .route(
            "/sections/{id}",
            put(api::update_section).delete(api::delete_section),
        )
        // Rules
        .route("/rules", post(api::create_rule))
        .route(
            "/rules/{id}",
            put(api::update_rule).delete(api::delete_rule),
        )
        // Overview
        .route("/admin/stats", get(api::get_stats))
        .route("/admin/dashboard", get(api::get_dashboard))
        // Backups
        .route(
            "/backups",
            get(api::list_backups).post(api::create_backup),
        )
        .route("/backups/sweep", post(api::sweep_backups))
        .route("/backups/{id}/data", get(api::get_backup_data))
        .layer(middleware::from_fn(move |req, next| {
            auth::require_admin_key(psk.clone(), req, next)
        }));

    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", public_routes.merge(admin_routes))
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
