//! Type coercion for raw sheet cells.
//!
//! The source delivers everything as strings. Each helper here is total:
//! integers default to 0, floats to 0.0, booleans to false, and dates to
//! `None` when the cell cannot be parsed. All helpers are idempotent with
//! respect to their own output format.

use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{Alert, AuditRecord, DeltaRow, PerformanceRow, Severity, Vigencia};

use super::Table;

/// Tokens recognized as boolean true, compared case-insensitively after
/// trimming. Anything else (including empty) coerces to false.
pub const TRUTHY_TOKENS: [&str; 6] = ["TRUE", "VERDADERO", "1", "YES", "SÍ", "SI"];

/// Coerce a cell to a boolean via the truthy-token allow-list.
pub fn parse_bool(raw: &str) -> bool {
    let normalized = raw.trim().to_uppercase();
    TRUTHY_TOKENS.contains(&normalized.as_str())
}

/// Coerce a cell to an integer, defaulting to 0 on parse failure.
/// Accepts decimal spellings of whole numbers ("200.0").
pub fn parse_int(raw: &str) -> i64 {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return n;
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return f as i64;
    }
    0
}

/// Coerce a cell to an integer, keeping absence distinct from zero.
pub fn parse_opt_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
}

/// Coerce a cell to a float, defaulting to 0.0 on parse failure.
pub fn parse_float(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(0.0)
}

/// Date formats the source has been observed to emit.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.fZ"];

/// Parse a date cell leniently. Unparseable values become `None`, never an
/// error.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Column accessor that tolerates absent columns and ragged rows.
struct Columns<'a> {
    table: &'a Table,
}

impl<'a> Columns<'a> {
    fn new(table: &'a Table) -> Self {
        Self { table }
    }

    fn idx(&self, name: &str) -> Option<usize> {
        self.table.column_index(name)
    }

    fn cell(row: &'a [String], idx: Option<usize>) -> &'a str {
        idx.and_then(|i| row.get(i)).map(String::as_str).unwrap_or("")
    }
}

/// Build master records from a raw table. Assumes mandatory columns were
/// already validated by the fetcher.
pub fn coerce_master(table: &Table) -> Vec<AuditRecord> {
    let cols = Columns::new(table);
    let url = cols.idx("url");
    let meta_title = cols.idx("meta_title");
    let sitemap_title = cols.idx("sitemap_title");
    let categoria = cols.idx("categoria");
    let subcategoria = cols.idx("subcategoria");
    let tipo_contenido = cols.idx("tipo_contenido");
    let vigencia = cols.idx("vigencia");
    let status_code = cols.idx("status_code");
    let word_count = cols.idx("word_count");
    let h2_count = cols.idx("h2_count");
    let product_count = cols.idx("product_count");
    let year_in_title = cols.idx("year_in_title");
    let has_noindex = cols.idx("has_noindex");
    let has_carousel = cols.idx("has_product_carousel");
    let has_alerts = cols.idx("has_alerts");
    let pub_date = cols.idx("pub_date");
    let lastmod = cols.idx("lastmod");

    table
        .rows
        .iter()
        .map(|row| {
            let pub_raw = Columns::cell(row, pub_date).to_string();
            let lastmod_raw = Columns::cell(row, lastmod).to_string();
            AuditRecord {
                url: Columns::cell(row, url).trim().to_string(),
                meta_title: Columns::cell(row, meta_title).trim().to_string(),
                sitemap_title: Columns::cell(row, sitemap_title).trim().to_string(),
                categoria: Columns::cell(row, categoria).trim().to_string(),
                subcategoria: Columns::cell(row, subcategoria).trim().to_string(),
                tipo_contenido: Columns::cell(row, tipo_contenido).trim().to_string(),
                vigencia: Vigencia::parse(Columns::cell(row, vigencia)),
                status_code: parse_int(Columns::cell(row, status_code)),
                word_count: parse_int(Columns::cell(row, word_count)),
                h2_count: parse_int(Columns::cell(row, h2_count)),
                product_count: parse_int(Columns::cell(row, product_count)),
                year_in_title: parse_opt_int(Columns::cell(row, year_in_title)),
                has_noindex: parse_bool(Columns::cell(row, has_noindex)),
                has_product_carousel: parse_bool(Columns::cell(row, has_carousel)),
                has_alerts: parse_bool(Columns::cell(row, has_alerts)),
                pub_date_parsed: parse_date(&pub_raw),
                lastmod_parsed: parse_date(&lastmod_raw),
                pub_date: pub_raw,
                lastmod: lastmod_raw,
            }
        })
        .collect()
}

/// Build alert rows from a raw table.
pub fn coerce_alerts(table: &Table) -> Vec<Alert> {
    let cols = Columns::new(table);
    let url = cols.idx("url");
    let alert_type = cols.idx("alert_type");
    let severity = cols.idx("severity");
    let detail = cols.idx("detail");
    let detected_date = cols.idx("detected_date");
    let resolved = cols.idx("resolved");

    table
        .rows
        .iter()
        .map(|row| Alert {
            url: Columns::cell(row, url).trim().to_string(),
            alert_type: Columns::cell(row, alert_type).trim().to_string(),
            severity: Severity::parse(Columns::cell(row, severity)),
            detail: Columns::cell(row, detail).trim().to_string(),
            detected_date: Columns::cell(row, detected_date).trim().to_string(),
            resolved: parse_bool(Columns::cell(row, resolved)),
        })
        .collect()
}

/// Build per-query performance rows from a raw table.
pub fn coerce_performance(table: &Table) -> Vec<PerformanceRow> {
    let cols = Columns::new(table);
    let url = cols.idx("url");
    let periodo = cols.idx("periodo");
    let query = cols.idx("query");
    let clicks = cols.idx("clicks");
    let impressions = cols.idx("impressions");
    let ctr = cols.idx("ctr");
    let position = cols.idx("position");

    table
        .rows
        .iter()
        .map(|row| PerformanceRow {
            url: Columns::cell(row, url).trim().to_string(),
            periodo: Columns::cell(row, periodo).trim().to_string(),
            query: Columns::cell(row, query).trim().to_string(),
            clicks: parse_int(Columns::cell(row, clicks)),
            impressions: parse_int(Columns::cell(row, impressions)),
            ctr: parse_float(Columns::cell(row, ctr)),
            position: parse_float(Columns::cell(row, position)),
        })
        .collect()
}

/// Build period-over-period delta rows from a raw table.
pub fn coerce_deltas(table: &Table) -> Vec<DeltaRow> {
    let cols = Columns::new(table);
    let url = cols.idx("url");
    let periodo = cols.idx("periodo");
    let clicks = cols.idx("clicks");
    let clicks_prev = cols.idx("clicks_prev");
    let impressions = cols.idx("impressions");
    let impressions_prev = cols.idx("impressions_prev");
    let clicks_delta_pct = cols.idx("clicks_delta_pct");
    let position = cols.idx("position");
    let position_prev = cols.idx("position_prev");
    let position_delta = cols.idx("position_delta");

    table
        .rows
        .iter()
        .map(|row| DeltaRow {
            url: Columns::cell(row, url).trim().to_string(),
            periodo: Columns::cell(row, periodo).trim().to_string(),
            clicks: parse_int(Columns::cell(row, clicks)),
            clicks_prev: parse_int(Columns::cell(row, clicks_prev)),
            impressions: parse_int(Columns::cell(row, impressions)),
            impressions_prev: parse_int(Columns::cell(row, impressions_prev)),
            clicks_delta_pct: parse_float(Columns::cell(row, clicks_delta_pct)),
            position: parse_float(Columns::cell(row, position)),
            position_prev: parse_float(Columns::cell(row, position_prev)),
            position_delta: parse_float(Columns::cell(row, position_delta)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_tokens_cover_both_languages() {
        for token in ["TRUE", "true", " verdadero ", "1", "yes", "SÍ", "si"] {
            assert!(parse_bool(token), "{token:?} should be truthy");
        }
        for token in ["", "0", "FALSE", "no", "falso", "2"] {
            assert!(!parse_bool(token), "{token:?} should be falsy");
        }
    }

    #[test]
    fn int_coercion_defaults_to_zero() {
        assert_eq!(parse_int("200"), 200);
        assert_eq!(parse_int(" 301 "), 301);
        assert_eq!(parse_int("404.0"), 404);
        assert_eq!(parse_int(""), 0);
        assert_eq!(parse_int("n/a"), 0);
    }

    #[test]
    fn optional_int_keeps_absence() {
        assert_eq!(parse_opt_int("2024"), Some(2024));
        assert_eq!(parse_opt_int(""), None);
        assert_eq!(parse_opt_int("soon"), None);
    }

    #[test]
    fn dates_parse_leniently() {
        assert_eq!(
            parse_date("2023-06-15"),
            NaiveDate::from_ymd_opt(2023, 6, 15)
        );
        assert_eq!(
            parse_date("15/06/2023"),
            NaiveDate::from_ymd_opt(2023, 6, 15)
        );
        assert_eq!(
            parse_date("2023-06-15T08:30:00"),
            NaiveDate::from_ymd_opt(2023, 6, 15)
        );
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("next week"), None);
    }

    #[test]
    fn coercion_is_idempotent() {
        // Re-coercing already-coerced output yields identical values.
        assert_eq!(parse_int(&parse_int("200.0").to_string()), 200);
        assert!(parse_bool("TRUE"));
        assert!(parse_bool(&parse_bool("sí").to_string().to_uppercase()));
        let once = parse_date("2023-01-02").unwrap();
        assert_eq!(parse_date(&once.to_string()), Some(once));
    }

    #[test]
    fn master_coercion_tolerates_missing_columns_and_ragged_rows() {
        let table = Table::new(
            vec!["url".into(), "categoria".into(), "status_code".into()],
            vec![
                vec!["https://a".into(), "reviews".into(), "200".into()],
                vec!["https://b".into()],
            ],
        );
        let records = coerce_master(&table);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status_code, 200);
        assert_eq!(records[1].status_code, 0);
        assert_eq!(records[1].categoria, "");
        assert!(!records[1].has_alerts);
        assert_eq!(records[1].pub_date_parsed, None);
    }
}
