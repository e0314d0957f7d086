//! Master-table row model.
//!
//! One record per audited content URL. All numeric, boolean, and date
//! columns are coerced at fetch time (see `sheets::coerce`), so consumers
//! never see raw string forms for those fields.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Freshness classification of a piece of content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vigencia {
    #[serde(rename = "evergreen")]
    Evergreen,
    #[serde(rename = "evergreen_actualizable")]
    Actualizable,
    #[serde(rename = "caduco")]
    Caduco,
    #[default]
    #[serde(rename = "")]
    Unknown,
}

impl Vigencia {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Evergreen => "evergreen",
            Self::Actualizable => "evergreen_actualizable",
            Self::Caduco => "caduco",
            Self::Unknown => "",
        }
    }

    /// Parse the source's freshness label. Unrecognized values (including
    /// blank cells) map to `Unknown` rather than erroring.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "evergreen" => Self::Evergreen,
            "evergreen_actualizable" => Self::Actualizable,
            "caduco" => Self::Caduco,
            _ => Self::Unknown,
        }
    }

    /// Whether this row carries a recognized freshness label.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Content that should be reviewed: expired or flagged as updatable.
    pub fn needs_refresh(&self) -> bool {
        matches!(self, Self::Caduco | Self::Actualizable)
    }
}

/// One audited content URL from the master table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Canonical URL. Identifier for cross-table joins.
    pub url: String,
    /// Page `<title>` / meta title.
    pub meta_title: String,
    /// Title as listed in the sitemap.
    pub sitemap_title: String,
    pub categoria: String,
    pub subcategoria: String,
    pub tipo_contenido: String,
    pub vigencia: Vigencia,
    /// HTTP status observed during the audit crawl.
    pub status_code: i64,
    pub word_count: i64,
    pub h2_count: i64,
    pub product_count: i64,
    /// Year mentioned in the title, if any ("Best laptops 2024").
    pub year_in_title: Option<i64>,
    pub has_noindex: bool,
    pub has_product_carousel: bool,
    pub has_alerts: bool,
    /// Publication date as reported by the source.
    pub pub_date: String,
    /// Last-modified date as reported by the source.
    pub lastmod: String,
    /// Parsed form of `pub_date`; `None` when unparseable.
    pub pub_date_parsed: Option<NaiveDate>,
    /// Parsed form of `lastmod`; `None` when unparseable.
    pub lastmod_parsed: Option<NaiveDate>,
}
