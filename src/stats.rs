//! Aggregations feeding the dashboard's metrics, charts, and tables.
//!
//! Everything here is a pure function over already-filtered slices; the
//! consumer draws whatever shape it likes from the returned tables.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use chrono::Datelike;
use serde::Serialize;

use crate::models::{severity_rank, Alert, AuditRecord, DeltaRow, Severity};

/// One bar of a value-count chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Count distinct non-blank values, most frequent first (ties break on the
/// value itself for a stable order).
pub fn value_counts<'a, I>(values: I) -> Vec<ValueCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        *counts.entry(trimmed).or_insert(0) += 1;
    }
    let mut out: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    out
}

/// KPI block for the current filtered view.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total: usize,
    pub status_ok: usize,
    pub status_ok_pct: f64,
    pub status_other: usize,
    pub with_alerts: usize,
    pub with_alerts_pct: f64,
    pub with_carousel: usize,
    pub avg_word_count: i64,
}

pub fn summary(rows: &[AuditRecord]) -> Summary {
    let total = rows.len();
    let status_ok = rows.iter().filter(|r| r.status_code == 200).count();
    let with_alerts = rows.iter().filter(|r| r.has_alerts).count();
    let with_carousel = rows.iter().filter(|r| r.has_product_carousel).count();
    let words: i64 = rows.iter().map(|r| r.word_count).sum();
    let pct = |part: usize| {
        if total == 0 {
            0.0
        } else {
            part as f64 / total as f64 * 100.0
        }
    };
    Summary {
        total,
        status_ok,
        status_ok_pct: pct(status_ok),
        status_other: total - status_ok,
        with_alerts,
        with_alerts_pct: pct(with_alerts),
        with_carousel,
        avg_word_count: if total == 0 { 0 } else { words / total as i64 },
    }
}

/// Category × content-type cell of the coverage heatmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrosstabEntry {
    pub categoria: String,
    pub tipo_contenido: String,
    pub count: usize,
}

/// Cross-tabulation of category against content type, skipping rows where
/// either side is blank.
pub fn crosstab(rows: &[AuditRecord]) -> Vec<CrosstabEntry> {
    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for r in rows {
        let cat = r.categoria.trim();
        let tipo = r.tipo_contenido.trim();
        if cat.is_empty() || tipo.is_empty() {
            continue;
        }
        *counts.entry((cat, tipo)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|((categoria, tipo_contenido), count)| CrosstabEntry {
            categoria: categoria.to_string(),
            tipo_contenido: tipo_contenido.to_string(),
            count,
        })
        .collect()
}

/// Carousel coverage for one category.
#[derive(Debug, Clone, Serialize)]
pub struct CarouselPenetration {
    pub categoria: String,
    pub total: usize,
    pub with_carousel: usize,
    pub pct: f64,
}

/// Share of URLs with a product carousel per category, lowest penetration
/// first.
pub fn carousel_penetration(rows: &[AuditRecord]) -> Vec<CarouselPenetration> {
    let mut per_cat: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for r in rows {
        let cat = r.categoria.trim();
        if cat.is_empty() {
            continue;
        }
        let entry = per_cat.entry(cat).or_insert((0, 0));
        entry.0 += 1;
        if r.has_product_carousel {
            entry.1 += 1;
        }
    }
    let mut out: Vec<CarouselPenetration> = per_cat
        .into_iter()
        .map(|(categoria, (total, with_carousel))| CarouselPenetration {
            categoria: categoria.to_string(),
            total,
            with_carousel,
            pct: (with_carousel as f64 / total as f64 * 1000.0).round() / 10.0,
        })
        .collect();
    out.sort_by(|a, b| a.pct.partial_cmp(&b.pct).unwrap_or(std::cmp::Ordering::Equal));
    out
}

/// One month of the publication timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineBucket {
    /// `YYYY-MM`.
    pub year_month: String,
    pub count: usize,
}

/// Published articles per month, chronological. Rows without a parsed
/// publication date are skipped.
pub fn publication_timeline(rows: &[AuditRecord]) -> Vec<TimelineBucket> {
    let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
    for r in rows {
        if let Some(date) = r.pub_date_parsed {
            let key = format!("{:04}-{:02}", date.year(), date.month());
            *buckets.entry(key).or_insert(0) += 1;
        }
    }
    buckets
        .into_iter()
        .map(|(year_month, count)| TimelineBucket { year_month, count })
        .collect()
}

/// Severity/type breakdown of unresolved alerts.
#[derive(Debug, Clone, Serialize)]
pub struct AlertSummary {
    pub active: usize,
    pub alta: usize,
    pub media: usize,
    pub baja: usize,
    pub by_type: Vec<ValueCount>,
}

pub fn alert_summary(alerts: &[Alert]) -> AlertSummary {
    let active: Vec<&Alert> = alerts.iter().filter(|a| !a.resolved).collect();
    let count_level = |level: Severity| {
        active
            .iter()
            .filter(|a| a.severity == Some(level))
            .count()
    };
    AlertSummary {
        active: active.len(),
        alta: count_level(Severity::Alta),
        media: count_level(Severity::Media),
        baja: count_level(Severity::Baja),
        by_type: value_counts(active.iter().map(|a| a.alert_type.as_str())),
    }
}

/// Unresolved alerts, highest severity first. Unknown severities sort
/// last; the incoming order is kept within each level.
pub fn active_alerts(alerts: &[Alert]) -> Vec<Alert> {
    let mut out: Vec<Alert> = alerts.iter().filter(|a| !a.resolved).cloned().collect();
    out.sort_by_key(|a| severity_rank(a.severity));
    out
}

/// KPI block for one reporting period of the deltas table.
#[derive(Debug, Clone, Serialize)]
pub struct DeltaSummary {
    pub urls: usize,
    pub clicks: i64,
    pub clicks_prev: i64,
    pub clicks_delta_pct: f64,
    pub impressions: i64,
    pub avg_position: f64,
}

/// Summarize delta rows (already restricted to one period).
pub fn delta_summary(deltas: &[DeltaRow]) -> DeltaSummary {
    let urls: BTreeSet<&str> = deltas.iter().map(|d| d.url.as_str()).collect();
    let clicks: i64 = deltas.iter().map(|d| d.clicks).sum();
    let clicks_prev: i64 = deltas.iter().map(|d| d.clicks_prev).sum();
    let impressions: i64 = deltas.iter().map(|d| d.impressions).sum();
    let position_sum: f64 = deltas.iter().map(|d| d.position).sum();
    let delta_pct = (clicks - clicks_prev) as f64 / clicks_prev.max(1) as f64 * 100.0;
    DeltaSummary {
        urls: urls.len(),
        clicks,
        clicks_prev,
        clicks_delta_pct: (delta_pct * 10.0).round() / 10.0,
        impressions,
        avg_position: if deltas.is_empty() {
            0.0
        } else {
            (position_sum / deltas.len() as f64 * 10.0).round() / 10.0
        },
    }
}

/// Distinct periods present in the deltas table, sorted.
pub fn delta_periods(deltas: &[DeltaRow]) -> Vec<String> {
    let periods: BTreeSet<&str> = deltas.iter().map(|d| d.periodo.as_str()).collect();
    periods.into_iter().map(|p| p.to_string()).collect()
}

/// Top rows by current clicks.
pub fn top_urls_by_clicks(deltas: &[DeltaRow], limit: usize) -> Vec<DeltaRow> {
    let mut sorted = deltas.to_vec();
    sorted.sort_by(|a, b| b.clicks.cmp(&a.clicks));
    sorted.truncate(limit);
    sorted
}

/// Rows whose clicks dropped by more than `threshold_pct`, biggest
/// previous traffic first.
pub fn traffic_drops(deltas: &[DeltaRow], threshold_pct: f64, limit: usize) -> Vec<DeltaRow> {
    let mut drops: Vec<DeltaRow> = deltas
        .iter()
        .filter(|d| d.clicks_delta_pct < -threshold_pct)
        .cloned()
        .collect();
    drops.sort_by(|a, b| b.clicks_prev.cmp(&a.clicks_prev));
    drops.truncate(limit);
    drops
}

/// Expired or updatable content with a known last-modified date, oldest
/// first; the refresh priority list.
pub fn stale_content(rows: &[AuditRecord]) -> Vec<AuditRecord> {
    let mut out: Vec<AuditRecord> = rows
        .iter()
        .filter(|r| r.vigencia.needs_refresh() && r.lastmod_parsed.is_some())
        .cloned()
        .collect();
    out.sort_by_key(|r| r.lastmod_parsed);
    out
}

/// Distinct values available for each filter control.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub categorias: Vec<String>,
    pub subcategorias: Vec<String>,
    pub tipos_contenido: Vec<String>,
    pub vigencias: Vec<String>,
    pub status_codes: Vec<i64>,
    pub pub_date_min: Option<chrono::NaiveDate>,
    pub pub_date_max: Option<chrono::NaiveDate>,
}

/// Build the option pools for the filter controls from the unfiltered
/// master. When categories are selected, the subcategory pool narrows to
/// rows in those categories.
pub fn filter_options(rows: &[AuditRecord], selected_categorias: &BTreeSet<String>) -> FilterOptions {
    let distinct = |values: BTreeSet<&str>| -> Vec<String> {
        values.into_iter().map(|v| v.to_string()).collect()
    };

    let categorias: BTreeSet<&str> = rows
        .iter()
        .map(|r| r.categoria.trim())
        .filter(|v| !v.is_empty())
        .collect();

    let subcategorias: BTreeSet<&str> = rows
        .iter()
        .filter(|r| {
            selected_categorias.is_empty() || selected_categorias.contains(&r.categoria)
        })
        .map(|r| r.subcategoria.trim())
        .filter(|v| !v.is_empty())
        .collect();

    let tipos: BTreeSet<&str> = rows
        .iter()
        .map(|r| r.tipo_contenido.trim())
        .filter(|v| !v.is_empty())
        .collect();

    let vigencias: BTreeSet<&str> = rows
        .iter()
        .map(|r| r.vigencia.as_str())
        .filter(|v| !v.is_empty())
        .collect();

    let status_codes: BTreeSet<i64> = rows.iter().map(|r| r.status_code).collect();

    let dates: Vec<chrono::NaiveDate> = rows.iter().filter_map(|r| r.pub_date_parsed).collect();

    FilterOptions {
        categorias: distinct(categorias),
        subcategorias: distinct(subcategorias),
        tipos_contenido: distinct(tipos),
        vigencias: distinct(vigencias),
        status_codes: status_codes.into_iter().collect(),
        pub_date_min: dates.iter().min().copied(),
        pub_date_max: dates.iter().max().copied(),
    }
}
