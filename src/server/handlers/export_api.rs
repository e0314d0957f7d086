//! Export endpoint: filtered tables as CSV or workbook attachments.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::export::{
    alert_export_rows, delta_export_rows, master_export_rows, to_csv, to_xlsx,
    ExportFormat, ExportTable, ALERT_HEADERS, DELTA_HEADERS, MASTER_HEADERS,
};
use crate::stats;

use super::types::ApiError;
use super::{session_id, AppState};

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default = "default_table")]
    pub table: ExportTable,
    #[serde(default = "default_format")]
    pub format: ExportFormat,
    /// Restrict the deltas export to one period.
    pub periodo: Option<String>,
}

fn default_table() -> ExportTable {
    ExportTable::Master
}

fn default_format() -> ExportFormat {
    ExportFormat::Csv
}

/// Serialize one filtered table as a download. The row set is exactly
/// what the corresponding view shows; no extra filtering happens here.
pub async fn export(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let dataset = state.dataset().await?;
    let sid = session_id(&headers);

    let (table_headers, rows): (&[&str], Vec<Vec<String>>) = match params.table {
        ExportTable::Master => {
            let filtered = state
                .sessions
                .with_session(&sid, |s| s.filtered_master(&dataset.master))
                .await;
            (&MASTER_HEADERS, master_export_rows(&filtered))
        }
        ExportTable::Alerts => {
            let active = stats::active_alerts(&dataset.alerts);
            (&ALERT_HEADERS, alert_export_rows(&active))
        }
        ExportTable::Deltas => {
            let mut deltas = state
                .sessions
                .with_session(&sid, |s| s.filtered_deltas(&dataset.master, &dataset.deltas))
                .await;
            if let Some(periodo) = params.periodo.as_deref() {
                deltas.retain(|d| d.periodo == periodo);
            }
            (&DELTA_HEADERS, delta_export_rows(&deltas))
        }
    };

    let filename = format!(
        "siteaudit_{}.{}",
        params.table.as_str(),
        params.format.extension()
    );
    let bytes = match params.format {
        ExportFormat::Csv => to_csv(table_headers, &rows),
        ExportFormat::Xlsx => to_xlsx(params.table.as_str(), table_headers, &rows)?,
    };

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, params.format.content_type())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from(bytes))
        .unwrap()
        .into_response())
}
