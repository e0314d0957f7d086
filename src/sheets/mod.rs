//! Remote fetch of the audit dataset.
//!
//! Four named tables live in one spreadsheet-style source. Only the master
//! table is mandatory; the others degrade to empty tables when absent.
//! Everything returned here is fully type-coerced (see `coerce`).

pub mod client;
pub mod coerce;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::{Alert, AuditRecord, DeltaRow, PerformanceRow};

pub use client::{Credentials, SheetsClient, SourceError};

/// Table (worksheet) names inside the source.
pub const SHEET_MASTER: &str = "URLs_Master";
pub const SHEET_ALERTS: &str = "Alertas";
pub const SHEET_PERFORMANCE: &str = "GSC_Performance";
pub const SHEET_DELTAS: &str = "GSC_Deltas";

/// Columns the master table must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["url", "categoria", "status_code"];

/// A raw tabular read: first row of the sheet is the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}

/// Errors from the fetch pipeline.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Missing or malformed credentials / source identifier.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The dataset or its mandatory master table does not exist.
    #[error("source not found: {0}")]
    SourceNotFound(String),

    /// Mandatory columns absent from the master table.
    #[error("master table is missing mandatory columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    /// Transport-level failure talking to the source.
    #[error("source transport error: {0}")]
    Transport(#[from] SourceError),
}

/// The full coerced dataset, immutable once fetched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dataset {
    pub master: Vec<AuditRecord>,
    pub alerts: Vec<Alert>,
    pub performance: Vec<PerformanceRow>,
    pub deltas: Vec<DeltaRow>,
}

/// An opaque tabular data source: named tables, first-row-is-header.
#[async_trait]
pub trait TabularSource: Send + Sync {
    /// Read one table. `Ok(None)` means the table does not exist in the
    /// source, which is only an error for the master table.
    async fn read_table(&self, name: &str) -> Result<Option<Table>, SourceError>;
}

/// Fetch and coerce all four tables.
///
/// Pure with respect to program state: one network read, no side effects.
pub async fn fetch_dataset(source: &dyn TabularSource) -> Result<Dataset, FetchError> {
    let master_table = match source.read_table(SHEET_MASTER).await {
        Ok(Some(table)) => table,
        Ok(None) => {
            return Err(FetchError::SourceNotFound(format!(
                "mandatory table '{SHEET_MASTER}' not found"
            )))
        }
        Err(e) => return Err(map_source_error(e)),
    };

    if !master_table.is_empty() {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|col| master_table.column_index(col).is_none())
            .map(|col| col.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(FetchError::Schema { missing });
        }
    }

    let master = coerce::coerce_master(&master_table);
    tracing::info!(rows = master.len(), "loaded {}", SHEET_MASTER);

    let alerts = match read_optional(source, SHEET_ALERTS).await? {
        Some(table) => {
            let rows = coerce::coerce_alerts(&table);
            tracing::info!(rows = rows.len(), "loaded {}", SHEET_ALERTS);
            rows
        }
        None => Vec::new(),
    };

    let performance = match read_optional(source, SHEET_PERFORMANCE).await? {
        Some(table) => {
            let rows = coerce::coerce_performance(&table);
            tracing::info!(rows = rows.len(), "loaded {}", SHEET_PERFORMANCE);
            rows
        }
        None => Vec::new(),
    };

    let deltas = match read_optional(source, SHEET_DELTAS).await? {
        Some(table) => {
            let rows = coerce::coerce_deltas(&table);
            tracing::info!(rows = rows.len(), "loaded {}", SHEET_DELTAS);
            rows
        }
        None => Vec::new(),
    };

    Ok(Dataset {
        master,
        alerts,
        performance,
        deltas,
    })
}

async fn read_optional(
    source: &dyn TabularSource,
    name: &str,
) -> Result<Option<Table>, FetchError> {
    match source.read_table(name).await {
        Ok(Some(table)) => Ok(Some(table)),
        Ok(None) => {
            tracing::info!("table '{name}' not found, continuing without it");
            Ok(None)
        }
        Err(e) => Err(map_source_error(e)),
    }
}

fn map_source_error(e: SourceError) -> FetchError {
    match e {
        SourceError::NotFound(msg) => FetchError::SourceNotFound(msg),
        SourceError::Unauthorized(msg) => FetchError::Configuration(msg),
        other => FetchError::Transport(other),
    }
}

/// In-memory source backed by fixture tables. Used by tests and offline
/// tooling; absent tables behave exactly like missing worksheets.
#[derive(Debug, Default)]
pub struct MemorySource {
    tables: std::collections::HashMap<String, Table>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, table: Table) -> Self {
        self.tables.insert(name.to_string(), table);
        self
    }
}

#[async_trait]
impl TabularSource for MemorySource {
    async fn read_table(&self, name: &str) -> Result<Option<Table>, SourceError> {
        Ok(self.tables.get(name).cloned())
    }
}
