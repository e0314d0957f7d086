//! Search-performance endpoints: period deltas and per-URL query
//! drill-down, both restricted to the session's filtered master.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::models::{DeltaRow, PerformanceRow};
use crate::session::normalize_url;
use crate::stats;

use super::types::ApiError;
use super::{session_id, AppState};

const TOP_URLS: usize = 15;
const DROP_THRESHOLD_PCT: f64 = 20.0;
const MAX_TABLE_ROWS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct PerformanceQuery {
    pub periodo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PerformanceResponse {
    pub periodo: String,
    /// All periods available in the (filtered) deltas table.
    pub periods: Vec<String>,
    pub summary: stats::DeltaSummary,
    pub top_urls: Vec<DeltaRow>,
    pub drops: Vec<DeltaRow>,
    /// Period rows, highest clicks first, capped for display.
    pub rows: Vec<DeltaRow>,
}

/// Period-over-period deltas for URLs surviving the master filters.
pub async fn performance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PerformanceQuery>,
) -> Result<Json<PerformanceResponse>, ApiError> {
    let dataset = state.dataset().await?;
    let sid = session_id(&headers);
    let deltas = state
        .sessions
        .with_session(&sid, |s| s.filtered_deltas(&dataset.master, &dataset.deltas))
        .await;

    let periods = stats::delta_periods(&deltas);
    let periodo = params
        .periodo
        .or_else(|| periods.first().cloned())
        .unwrap_or_else(|| "7d".to_string());

    let period_rows: Vec<DeltaRow> = deltas
        .iter()
        .filter(|d| d.periodo == periodo)
        .cloned()
        .collect();

    let mut rows = period_rows.clone();
    rows.sort_by(|a, b| b.clicks.cmp(&a.clicks));
    rows.truncate(MAX_TABLE_ROWS);

    Ok(Json(PerformanceResponse {
        summary: stats::delta_summary(&period_rows),
        top_urls: stats::top_urls_by_clicks(&period_rows, TOP_URLS),
        drops: stats::traffic_drops(&period_rows, DROP_THRESHOLD_PCT, TOP_URLS),
        rows,
        periodo,
        periods,
    }))
}

#[derive(Debug, Deserialize)]
pub struct QueriesQuery {
    pub url: String,
    pub periodo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueriesResponse {
    pub url: String,
    pub rows: Vec<PerformanceRow>,
}

/// Per-query metrics for one URL, highest clicks first.
pub async fn performance_queries(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<QueriesQuery>,
) -> Result<Json<QueriesResponse>, ApiError> {
    let dataset = state.dataset().await?;
    let sid = session_id(&headers);
    let performance = state
        .sessions
        .with_session(&sid, |s| {
            s.filtered_performance(&dataset.master, &dataset.performance)
        })
        .await;

    let wanted = normalize_url(&params.url);
    let mut rows: Vec<PerformanceRow> = performance
        .into_iter()
        .filter(|row| normalize_url(&row.url) == wanted)
        .filter(|row| {
            params
                .periodo
                .as_deref()
                .map(|p| row.periodo == p)
                .unwrap_or(true)
        })
        .collect();
    rows.sort_by(|a, b| b.clicks.cmp(&a.clicks));

    Ok(Json(QueriesResponse {
        url: params.url,
        rows,
    }))
}
