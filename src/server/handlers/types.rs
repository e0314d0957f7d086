//! Shared response plumbing for handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::export::ExportError;
use crate::sheets::FetchError;

/// Error envelope returned by every endpoint.
pub enum ApiError {
    Fetch(FetchError),
    Export(ExportError),
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Fetch(e) => {
                tracing::error!("dataset fetch failed: {e}");
                let hint = match &e {
                    FetchError::Configuration(_) => {
                        "check spreadsheet_id and credentials configuration"
                    }
                    FetchError::SourceNotFound(_) => {
                        "verify the spreadsheet id and table names"
                    }
                    FetchError::Schema { .. } => {
                        "the master table no longer matches the expected columns"
                    }
                    FetchError::Transport(_) => "the upstream source could not be reached",
                };
                (
                    StatusCode::BAD_GATEWAY,
                    Json(serde_json::json!({ "error": e.to_string(), "hint": hint })),
                )
                    .into_response()
            }
            ApiError::Export(e) => {
                tracing::error!("export failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": e.to_string() })),
                )
                    .into_response()
            }
        }
    }
}
