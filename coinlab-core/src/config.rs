//! Provider configuration: endpoints, timeouts, and page-layout strategies.
//!
//! Stored as TOML. Every field has a default matching the public provider,
//! so a config file only needs to name what differs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable consulted for the API key when none is given.
pub const API_KEY_ENV: &str = "COINMARKETCAP_API_KEY";

/// Which table on a page holds the data.
///
/// The provider has moved auxiliary tables in front of and behind the data
/// table over the years, so the choice is configuration rather than code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSelection {
    First,
    Last,
    Index(usize),
}

impl TableSelection {
    /// Resolve against a page with `count` tables.
    pub fn position(self, count: usize) -> Option<usize> {
        match self {
            _ if count == 0 => None,
            Self::First => Some(0),
            Self::Last => Some(count - 1),
            Self::Index(i) if i < count => Some(i),
            Self::Index(_) => None,
        }
    }
}

/// Where the directory page keeps symbols and slugs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryLayout {
    /// Path of the full asset listing, relative to `web_base_url`.
    pub path: String,
    /// Header of the column holding the ticker symbol.
    pub symbol_column: String,
    /// Prefix in front of the slug in each row's `id` attribute.
    pub row_id_prefix: String,
}

impl Default for DirectoryLayout {
    fn default() -> Self {
        Self {
            path: "/all/views/all/".into(),
            symbol_column: "Symbol".into(),
            row_id_prefix: "id-".into(),
        }
    }
}

/// Complete provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub web_base_url: String,
    pub api_base_url: String,
    pub api_key_header: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub history_table: TableSelection,
    pub snapshot_table: TableSelection,
    /// First date the provider kept a snapshot for.
    pub snapshot_history_start: NaiveDate,
    pub directory: DirectoryLayout,
    /// Header renames applied to historical tables before footnote stripping.
    pub history_columns: BTreeMap<String, String>,
    /// Header renames applied to snapshot tables.
    pub snapshot_columns: BTreeMap<String, String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let history_columns = [
            ("Open*", "Open"),
            ("Close**", "Close"),
            ("Market Cap", "Market_cap"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let snapshot_columns = [("#", "Rank")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            web_base_url: "https://coinmarketcap.com".into(),
            api_base_url: "https://pro-api.coinmarketcap.com".into(),
            api_key_header: "X-CMC_PRO_API_KEY".into(),
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
            history_table: TableSelection::Last,
            snapshot_table: TableSelection::Last,
            snapshot_history_start: NaiveDate::from_ymd_opt(2013, 4, 28).unwrap_or_default(),
            directory: DirectoryLayout::default(),
            history_columns,
            snapshot_columns,
        }
    }
}

impl ProviderConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string and validate it.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, url) in [
            ("web_base_url", &self.web_base_url),
            ("api_base_url", &self.api_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be an http(s) URL, got '{url}'"
                )));
            }
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        if self.directory.symbol_column.is_empty() {
            return Err(ConfigError::Invalid(
                "directory.symbol_column must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Join a path onto the web base URL.
    pub fn web_url(&self, path: &str) -> String {
        join_url(&self.web_base_url, path)
    }

    /// Join a path onto the API base URL.
    pub fn api_url(&self, path: &str) -> String {
        join_url(&self.api_base_url, path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("parse config TOML: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
