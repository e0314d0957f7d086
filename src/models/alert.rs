//! Alert rows raised by the audit against individual URLs.

use serde::{Deserialize, Serialize};

/// Alert severity. Variant order is the sort precedence: high first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "ALTA")]
    Alta,
    #[serde(rename = "MEDIA")]
    Media,
    #[serde(rename = "BAJA")]
    Baja,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alta => "ALTA",
            Self::Media => "MEDIA",
            Self::Baja => "BAJA",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "ALTA" => Some(Self::Alta),
            "MEDIA" => Some(Self::Media),
            "BAJA" => Some(Self::Baja),
            _ => None,
        }
    }
}

/// Sort rank for an optionally-parsed severity: unknown sorts last.
pub(crate) fn severity_rank(severity: Option<Severity>) -> u8 {
    match severity {
        Some(Severity::Alta) => 0,
        Some(Severity::Media) => 1,
        Some(Severity::Baja) => 2,
        None => 3,
    }
}

/// One alert attached (by URL, not enforced) to a master row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub url: String,
    pub alert_type: String,
    /// `None` when the source carries an unrecognized severity label.
    pub severity: Option<Severity>,
    pub detail: String,
    pub detected_date: String,
    pub resolved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!(Severity::parse("alta"), Some(Severity::Alta));
        assert_eq!(Severity::parse(" Media "), Some(Severity::Media));
        assert_eq!(Severity::parse("BAJA"), Some(Severity::Baja));
        assert_eq!(Severity::parse("critical"), None);
    }

    #[test]
    fn severity_orders_high_first() {
        let mut levels = vec![Severity::Baja, Severity::Alta, Severity::Media];
        levels.sort();
        assert_eq!(levels, vec![Severity::Alta, Severity::Media, Severity::Baja]);
    }

    #[test]
    fn unknown_severity_ranks_last() {
        assert!(severity_rank(None) > severity_rank(Some(Severity::Baja)));
    }
}
