//! Request handlers, grouped by dashboard area.

mod alerts;
mod export_api;
mod filters;
mod performance;
mod records;
mod stats_api;
mod types;

pub use alerts::list_alerts;
pub use export_api::export;
pub use filters::{apply_filters, filter_options, get_filters, update_pending};
pub use performance::{performance, performance_queries};
pub use records::{list_records, summary};
pub use stats_api::{
    stats_carousel, stats_categories, stats_crosstab, stats_stale, stats_status,
    stats_timeline, stats_types, stats_vigencia,
};

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use super::AppState;
use types::ApiError;

/// Service health plus cache and session bookkeeping.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let age = state.cache.age().await.map(|d| d.as_secs());
    Json(serde_json::json!({
        "status": "ok",
        "cache_age_secs": age,
        "sessions": state.sessions.len().await,
    }))
}

/// Mint a fresh session id. Clients may also bring their own via the
/// `X-Session-Id` header without calling this first.
pub async fn create_session() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "session_id": uuid::Uuid::new_v4().to_string() }))
}

/// Drop the heavy cache; the next read triggers a fresh fetch.
pub async fn reload(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    state.cache.invalidate().await;
    tracing::info!("dataset cache cleared by reload request");
    Ok(Json(serde_json::json!({ "reloaded": true })))
}

pub(super) fn session_id(headers: &HeaderMap) -> String {
    headers
        .get("x-session-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("default")
        .to_string()
}
