//! Alerts-panel endpoint.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::models::Alert;
use crate::stats;

use super::types::ApiError;
use super::AppState;

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    /// Restrict the row list to these alert types (comma-separated).
    pub types: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub summary: stats::AlertSummary,
    /// Distinct types among active alerts, for the type selector.
    pub types: Vec<String>,
    /// Active alerts, highest severity first.
    pub rows: Vec<Alert>,
}

/// Active alerts with severity/type breakdowns. Alerts are not affected
/// by the master filters; they carry their own type selector.
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(params): Query<AlertsQuery>,
) -> Result<Json<AlertsResponse>, ApiError> {
    let dataset = state.dataset().await?;
    let summary = stats::alert_summary(&dataset.alerts);
    let mut rows = stats::active_alerts(&dataset.alerts);

    let types: Vec<String> = {
        let mut distinct: Vec<String> = rows
            .iter()
            .map(|a| a.alert_type.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        distinct.sort();
        distinct
    };

    if let Some(selected) = params.types.as_deref() {
        let wanted: Vec<&str> = selected
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        if !wanted.is_empty() {
            rows.retain(|a| wanted.contains(&a.alert_type.as_str()));
        }
    }

    Ok(Json(AlertsResponse {
        summary,
        types,
        rows,
    }))
}
