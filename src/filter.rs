//! Filter specification and evaluation.
//!
//! A `FilterSpec` is a fixed-shape value object: one field per filterable
//! dimension, with "unrestricted" encoded explicitly (empty set, `Any`,
//! empty string, `None`). Evaluation is a pure AND of per-dimension
//! predicates over already-coerced records.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::AuditRecord;

/// Status codes with their own selector entries; the `Other` wildcard
/// matches the complement of this set.
pub const WELL_KNOWN_STATUS: [i64; 3] = [200, 301, 404];

/// Constraint on a boolean dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    #[default]
    Any,
    Require,
    Exclude,
}

impl TriState {
    fn accepts(&self, value: bool) -> bool {
        match self {
            Self::Any => true,
            Self::Require => value,
            Self::Exclude => !value,
        }
    }
}

/// Constraint on the HTTP status dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    Any,
    Exact(i64),
    /// Anything outside `WELL_KNOWN_STATUS`.
    Other,
}

impl StatusFilter {
    fn accepts(&self, code: i64) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => code == *expected,
            Self::Other => !WELL_KNOWN_STATUS.contains(&code),
        }
    }
}

/// User-selected filters over the master table. `Default` is the identity
/// filter: every dimension unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub categorias: BTreeSet<String>,
    pub subcategorias: BTreeSet<String>,
    pub tipos_contenido: BTreeSet<String>,
    pub vigencias: BTreeSet<String>,
    pub carousel: TriState,
    pub alerts: TriState,
    pub noindex: TriState,
    pub status_code: StatusFilter,
    pub search_text: String,
    /// Inclusive bounds over the parsed publication date. Only applies
    /// when both ends are present.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl FilterSpec {
    /// True when no dimension restricts anything.
    pub fn is_unrestricted(&self) -> bool {
        *self == Self::default()
    }

    /// Evaluate every dimension predicate against one record.
    pub fn matches(&self, record: &AuditRecord) -> bool {
        if !member_or_unrestricted(&self.categorias, &record.categoria) {
            return false;
        }
        if !member_or_unrestricted(&self.subcategorias, &record.subcategoria) {
            return false;
        }
        if !member_or_unrestricted(&self.tipos_contenido, &record.tipo_contenido) {
            return false;
        }
        if !member_or_unrestricted(&self.vigencias, record.vigencia.as_str()) {
            return false;
        }
        if !self.carousel.accepts(record.has_product_carousel) {
            return false;
        }
        if !self.alerts.accepts(record.has_alerts) {
            return false;
        }
        if !self.noindex.accepts(record.has_noindex) {
            return false;
        }
        if !self.status_code.accepts(record.status_code) {
            return false;
        }
        if !self.matches_search(record) {
            return false;
        }
        if let Some((from, to)) = self.date_range {
            match record.pub_date_parsed {
                Some(date) => {
                    if date < from || date > to {
                        return false;
                    }
                }
                // Rows without a parsed date never match an active range.
                None => return false,
            }
        }
        true
    }

    fn matches_search(&self, record: &AuditRecord) -> bool {
        let needle = self.search_text.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        record.url.to_lowercase().contains(&needle)
            || record.meta_title.to_lowercase().contains(&needle)
            || record.sitemap_title.to_lowercase().contains(&needle)
    }
}

fn member_or_unrestricted(accepted: &BTreeSet<String>, value: &str) -> bool {
    accepted.is_empty() || accepted.contains(value)
}

/// Return the matching subset, order preserved. The default spec is the
/// identity: it returns a full copy of the input.
pub fn apply_filters(rows: &[AuditRecord], spec: &FilterSpec) -> Vec<AuditRecord> {
    if rows.is_empty() || spec.is_unrestricted() {
        return rows.to_vec();
    }
    rows.iter().filter(|r| spec.matches(r)).cloned().collect()
}
