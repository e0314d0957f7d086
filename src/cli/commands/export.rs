//! `export` command: fetch and serialize one table to disk.

use std::path::PathBuf;

use console::style;

use crate::config::Settings;
use crate::export::{
    alert_export_rows, delta_export_rows, master_export_rows, to_csv, to_xlsx,
    ExportFormat, ExportTable, ALERT_HEADERS, DELTA_HEADERS, MASTER_HEADERS,
};
use crate::sheets::{fetch_dataset, SheetsClient};
use crate::stats;

pub async fn run(
    settings: &Settings,
    table: ExportTable,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let client = SheetsClient::from_settings(settings)?;
    let dataset = fetch_dataset(&client).await?;

    let (headers, rows): (&[&str], Vec<Vec<String>>) = match table {
        ExportTable::Master => (&MASTER_HEADERS, master_export_rows(&dataset.master)),
        ExportTable::Alerts => {
            let active = stats::active_alerts(&dataset.alerts);
            (&ALERT_HEADERS, alert_export_rows(&active))
        }
        ExportTable::Deltas => (&DELTA_HEADERS, delta_export_rows(&dataset.deltas)),
    };

    let path = output.unwrap_or_else(|| {
        PathBuf::from(format!("siteaudit_{}.{}", table.as_str(), format.extension()))
    });
    let bytes = match format {
        ExportFormat::Csv => to_csv(headers, &rows),
        ExportFormat::Xlsx => to_xlsx(table.as_str(), headers, &rows)?,
    };
    std::fs::write(&path, &bytes)?;

    println!(
        "{} {} rows to {}",
        style("Exported").green().bold(),
        rows.len(),
        path.display()
    );
    Ok(())
}
