//! Configuration management.
//!
//! Settings come from a TOML file (auto-discovered `siteaudit.toml` or an
//! explicit `--config` path) with environment-variable overrides for the
//! source identifier and credential payload, so secrets stay out of the
//! config file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default config filename, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "siteaudit.toml";

/// Environment variable carrying the source identifier.
pub const ENV_SPREADSHEET_ID: &str = "SPREADSHEET_ID";
/// Environment variable carrying the credential JSON payload.
pub const ENV_CREDENTIALS: &str = "SHEETS_CREDENTIALS";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Identifier of the source spreadsheet.
    pub spreadsheet_id: String,
    /// Raw credential payload (JSON with `api_key` or `access_token`).
    /// Usually supplied via `SHEETS_CREDENTIALS` rather than the file.
    pub credentials: Option<String>,
    /// Heavy-cache time-to-live in seconds.
    pub cache_ttl_secs: u64,
    /// HTTP request timeout in seconds.
    pub request_timeout: u64,
    /// Bind address for the API server.
    pub host: String,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            credentials: None,
            cache_ttl_secs: 3600,
            request_timeout: 30,
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Settings {
    pub fn cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Load settings: explicit path, else `siteaudit.toml` if present, else
/// defaults; then apply environment overrides.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = match resolve_path(path) {
        Some(file) => {
            let raw = fs::read_to_string(&file)?;
            let parsed: Settings = toml::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("invalid config file {}: {e}", file.display()))?;
            tracing::debug!(file = %file.display(), "loaded config file");
            parsed
        }
        None => Settings::default(),
    };

    if let Ok(id) = std::env::var(ENV_SPREADSHEET_ID) {
        if !id.trim().is_empty() {
            settings.spreadsheet_id = id;
        }
    }
    if let Ok(payload) = std::env::var(ENV_CREDENTIALS) {
        if !payload.trim().is_empty() {
            settings.credentials = Some(payload);
        }
    }

    Ok(settings)
}

fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from(CONFIG_FILENAME);
    default.exists().then_some(default)
}
