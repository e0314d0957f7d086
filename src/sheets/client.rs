//! HTTP client for the spreadsheet values API.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::Settings;

use super::{FetchError, TabularSource, Table};

/// Default values-API endpoint. Must end with a slash so sheet paths join
/// underneath it.
const DEFAULT_ENDPOINT: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

const USER_AGENT: &str = concat!("siteaudit/", env!("CARGO_PKG_VERSION"));

/// Transport-level errors from the source API.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The spreadsheet itself does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Credentials were rejected by the source.
    #[error("{0}")]
    Unauthorized(String),

    /// Any other non-success response.
    #[error("source returned HTTP {code}: {message}")]
    Status { code: u16, message: String },

    /// Response body could not be interpreted.
    #[error("invalid source response: {0}")]
    Decode(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Access-credential payload: structured key-value JSON carrying either an
/// API key or a bearer token.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub access_token: Option<String>,
}

impl Credentials {
    /// Parse the raw credential payload. Malformed JSON or a payload with
    /// neither field is a configuration error, not a transport error.
    pub fn from_payload(raw: &str) -> Result<Self, FetchError> {
        let creds: Credentials = serde_json::from_str(raw).map_err(|e| {
            FetchError::Configuration(format!("credentials payload is not valid JSON: {e}"))
        })?;
        if creds.api_key.is_none() && creds.access_token.is_none() {
            return Err(FetchError::Configuration(
                "credentials payload must contain `api_key` or `access_token`".to_string(),
            ));
        }
        Ok(creds)
    }
}

/// Shape of a values-API read.
#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Read-only client for one spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    client: Client,
    endpoint: Url,
    spreadsheet_id: String,
    credentials: Credentials,
}

impl SheetsClient {
    /// Build a client from settings, validating the source identifier and
    /// credential payload up front.
    pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
        let spreadsheet_id = settings.spreadsheet_id.trim().to_string();
        if spreadsheet_id.is_empty() {
            return Err(FetchError::Configuration(
                "missing `spreadsheet_id` (set it in the config file or SPREADSHEET_ID)"
                    .to_string(),
            ));
        }
        let payload = settings.credentials.as_deref().ok_or_else(|| {
            FetchError::Configuration(
                "missing credentials (set `credentials` in the config file or SHEETS_CREDENTIALS)"
                    .to_string(),
            )
        })?;
        let credentials = Credentials::from_payload(payload)?;

        let endpoint = Url::parse(DEFAULT_ENDPOINT)
            .map_err(|e| FetchError::Configuration(format!("invalid endpoint: {e}")))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(settings.request_timeout))
            .gzip(true)
            .build()
            .map_err(|e| FetchError::Configuration(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            spreadsheet_id,
            credentials,
        })
    }

    /// Point the client at a different endpoint (self-hosted proxies,
    /// tests).
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }
}

#[async_trait::async_trait]
impl TabularSource for SheetsClient {
    async fn read_table(&self, name: &str) -> Result<Option<Table>, SourceError> {
        let request_url = self
            .endpoint
            .join(&format!("{}/values/{}", self.spreadsheet_id, name))
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        let mut request = self.client.get(request_url);
        if let Some(key) = &self.credentials.api_key {
            request = request.query(&[("key", key.as_str())]);
        }
        if let Some(token) = &self.credentials.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        // The values API answers 400 for a range (sheet) it cannot
        // resolve inside an existing spreadsheet.
        if status == StatusCode::BAD_REQUEST {
            tracing::debug!(sheet = name, "source reported unknown table");
            return Ok(None);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(format!(
                "spreadsheet '{}' not found",
                self.spreadsheet_id
            )));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SourceError::Unauthorized(format!(
                "source rejected credentials (HTTP {})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                code: status.as_u16(),
                message,
            });
        }

        let payload: ValuesResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        let mut rows = payload.values.into_iter().map(|row| {
            row.into_iter()
                .map(|cell| match cell {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect::<Vec<String>>()
        });

        let headers = match rows.next() {
            Some(h) => h,
            None => return Ok(Some(Table::default())),
        };
        Ok(Some(Table::new(headers, rows.collect())))
    }
}
