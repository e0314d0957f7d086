//! Chart-table endpoints. Each returns the data behind one dashboard
//! visualization, computed over the session's filtered master.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::AuditRecord;
use crate::stats;

use super::types::ApiError;
use super::{session_id, AppState};

async fn filtered_master(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Arc<Vec<AuditRecord>>, ApiError> {
    let dataset = state.dataset().await?;
    let sid = session_id(headers);
    Ok(state
        .sessions
        .with_session(&sid, |s| s.filtered_master(&dataset.master))
        .await)
}

pub async fn stats_categories(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<stats::ValueCount>>, ApiError> {
    let rows = filtered_master(&state, &headers).await?;
    Ok(Json(stats::value_counts(
        rows.iter().map(|r| r.categoria.as_str()),
    )))
}

pub async fn stats_types(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<stats::ValueCount>>, ApiError> {
    let rows = filtered_master(&state, &headers).await?;
    Ok(Json(stats::value_counts(
        rows.iter().map(|r| r.tipo_contenido.as_str()),
    )))
}

pub async fn stats_vigencia(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<stats::ValueCount>>, ApiError> {
    let rows = filtered_master(&state, &headers).await?;
    Ok(Json(stats::value_counts(
        rows.iter().map(|r| r.vigencia.as_str()),
    )))
}

pub async fn stats_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<stats::ValueCount>>, ApiError> {
    let rows = filtered_master(&state, &headers).await?;
    let codes: Vec<String> = rows.iter().map(|r| r.status_code.to_string()).collect();
    Ok(Json(stats::value_counts(codes.iter().map(String::as_str))))
}

pub async fn stats_timeline(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<stats::TimelineBucket>>, ApiError> {
    let rows = filtered_master(&state, &headers).await?;
    Ok(Json(stats::publication_timeline(&rows)))
}

pub async fn stats_crosstab(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<stats::CrosstabEntry>>, ApiError> {
    let rows = filtered_master(&state, &headers).await?;
    Ok(Json(stats::crosstab(&rows)))
}

pub async fn stats_carousel(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<stats::CarouselPenetration>>, ApiError> {
    let rows = filtered_master(&state, &headers).await?;
    Ok(Json(stats::carousel_penetration(&rows)))
}

#[derive(Debug, Deserialize)]
pub struct StaleQuery {
    pub limit: Option<usize>,
}

/// Refresh-priority list: expired/updatable content, oldest first.
pub async fn stats_stale(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<StaleQuery>,
) -> Result<Json<Vec<AuditRecord>>, ApiError> {
    let rows = filtered_master(&state, &headers).await?;
    let mut stale = stats::stale_content(&rows);
    stale.truncate(params.limit.unwrap_or(25));
    Ok(Json(stale))
}
