//! `fetch` command: one-shot dataset pull with a terminal summary.

use console::style;

use crate::config::Settings;
use crate::sheets::{fetch_dataset, SheetsClient};
use crate::stats;

pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let client = SheetsClient::from_settings(settings)?;
    let dataset = fetch_dataset(&client).await?;

    println!("{}", style("Dataset loaded").green().bold());
    println!("  master:      {:>6} rows", dataset.master.len());
    println!("  alerts:      {:>6} rows", dataset.alerts.len());
    println!("  performance: {:>6} rows", dataset.performance.len());
    println!("  deltas:      {:>6} rows", dataset.deltas.len());

    let summary = stats::summary(&dataset.master);
    println!();
    println!("{}", style("Audit summary").bold());
    println!(
        "  status 200:    {} ({:.0}%)",
        summary.status_ok, summary.status_ok_pct
    );
    println!("  status != 200: {}", summary.status_other);
    println!(
        "  with alerts:   {} ({:.0}%)",
        summary.with_alerts, summary.with_alerts_pct
    );
    println!("  with carousel: {}", summary.with_carousel);
    println!("  avg words:     {}", summary.avg_word_count);

    let alerts = stats::alert_summary(&dataset.alerts);
    if alerts.active > 0 {
        println!();
        println!(
            "{} {} active ({} alta / {} media / {} baja)",
            style("Alerts:").red().bold(),
            alerts.active,
            alerts.alta,
            alerts.media,
            alerts.baja
        );
    }

    Ok(())
}
