//! Router configuration for the web server.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/session", post(handlers::create_session))
        // Filtered dataset
        .route("/api/records", get(handlers::list_records))
        .route("/api/summary", get(handlers::summary))
        // Filter state
        .route("/api/filters", get(handlers::get_filters))
        .route("/api/filters/pending", put(handlers::update_pending))
        .route("/api/filters/apply", post(handlers::apply_filters))
        .route("/api/filters/options", get(handlers::filter_options))
        // Alerts
        .route("/api/alerts", get(handlers::list_alerts))
        // Search performance
        .route("/api/performance", get(handlers::performance))
        .route("/api/performance/queries", get(handlers::performance_queries))
        // Chart tables
        .route("/api/stats/categories", get(handlers::stats_categories))
        .route("/api/stats/types", get(handlers::stats_types))
        .route("/api/stats/vigencia", get(handlers::stats_vigencia))
        .route("/api/stats/status", get(handlers::stats_status))
        .route("/api/stats/timeline", get(handlers::stats_timeline))
        .route("/api/stats/crosstab", get(handlers::stats_crosstab))
        .route("/api/stats/carousel", get(handlers::stats_carousel))
        .route("/api/stats/stale", get(handlers::stats_stale))
        // Export + cache control
        .route("/api/export", get(handlers::export))
        .route("/api/reload", post(handlers::reload))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
