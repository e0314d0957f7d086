//! Filtered master-table endpoints.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::models::AuditRecord;
use crate::stats;

use super::types::ApiError;
use super::{session_id, AppState};

const DEFAULT_LIMIT: usize = 500;
const MAX_LIMIT: usize = 10_000;

#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    /// Row count of the unfiltered master.
    pub total: usize,
    /// Row count after the applied filter.
    pub filtered: usize,
    pub offset: usize,
    pub rows: Vec<AuditRecord>,
}

/// Page through the filtered master table.
pub async fn list_records(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<RecordsQuery>,
) -> Result<Json<RecordsResponse>, ApiError> {
    let dataset = state.dataset().await?;
    let sid = session_id(&headers);
    let filtered = state
        .sessions
        .with_session(&sid, |s| s.filtered_master(&dataset.master))
        .await;

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);
    let rows: Vec<AuditRecord> = filtered.iter().skip(offset).take(limit).cloned().collect();

    Ok(Json(RecordsResponse {
        total: dataset.master.len(),
        filtered: filtered.len(),
        offset,
        rows,
    }))
}

/// KPI block for the session's filtered view.
pub async fn summary(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<stats::Summary>, ApiError> {
    let dataset = state.dataset().await?;
    let sid = session_id(&headers);
    let filtered = state
        .sessions
        .with_session(&sid, |s| s.filtered_master(&dataset.master))
        .await;
    Ok(Json(stats::summary(&filtered)))
}
