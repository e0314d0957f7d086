//! Filter-state endpoints: the pending/applied pair and its lifecycle.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use crate::filter::FilterSpec;
use crate::stats;

use super::types::ApiError;
use super::{session_id, AppState};

#[derive(Debug, Serialize)]
pub struct FilterStateResponse {
    pub pending: FilterSpec,
    pub applied: FilterSpec,
    pub dirty: bool,
}

/// Current pending/applied specs and the dirty flag.
pub async fn get_filters(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<FilterStateResponse> {
    let sid = session_id(&headers);
    let response = state
        .sessions
        .with_session(&sid, |s| FilterStateResponse {
            pending: s.pending().clone(),
            applied: s.applied().clone(),
            dirty: s.is_dirty(),
        })
        .await;
    Json(response)
}

/// Replace the pending spec. Display state is untouched until apply.
pub async fn update_pending(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(spec): Json<FilterSpec>,
) -> Json<FilterStateResponse> {
    let sid = session_id(&headers);
    let response = state
        .sessions
        .with_session(&sid, |s| {
            s.update_pending(spec);
            FilterStateResponse {
                pending: s.pending().clone(),
                applied: s.applied().clone(),
                dirty: s.is_dirty(),
            }
        })
        .await;
    Json(response)
}

/// Commit pending filters to the applied slot.
pub async fn apply_filters(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<FilterStateResponse> {
    let sid = session_id(&headers);
    let response = state
        .sessions
        .with_session(&sid, |s| {
            s.apply();
            FilterStateResponse {
                pending: s.pending().clone(),
                applied: s.applied().clone(),
                dirty: s.is_dirty(),
            }
        })
        .await;
    Json(response)
}

/// Distinct values for the filter controls, with the subcategory pool
/// narrowed by the session's pending category selection.
pub async fn filter_options(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<stats::FilterOptions>, ApiError> {
    let dataset = state.dataset().await?;
    let sid = session_id(&headers);
    let selected = state
        .sessions
        .with_session(&sid, |s| s.pending().categorias.clone())
        .await;
    Ok(Json(stats::filter_options(&dataset.master, &selected)))
}
