use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::types::{OverridePatch, Theater};

pub const INDEX_URL: &str = "https://ticket.stardream48.com/api/performance/list";
pub const DETAIL_URL: &str = "https://ticket.stardream48.com/ticket/detail";
pub const AVAILABILITY_URL: &str = "https://ticket.stardream48.com/api/seat/list";

/// Settings file read from the working directory, if present.
pub const SETTINGS_FILE: &str = "settings.toml";

/// Hand-maintained per-performance field replacements, if present.
pub const OVERRIDES_FILE: &str = "overrides.toml";

#[derive(Debug, Clone)]
pub struct Config {
    /// Upper bound on concurrent fetch workers.
    pub max_pool_size: usize,
    /// Minimum wall-clock seconds each worker spends per item.
    pub min_request_duration: f64,
    pub db_path: String,
    pub out_dir: String,
    pub index_url: String,
    pub detail_url: String,
    pub availability_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_pool_size: 1,
            min_request_duration: 0.5,
            db_path: "performances.db".to_string(),
            out_dir: "reports".to_string(),
            index_url: INDEX_URL.to_string(),
            detail_url: DETAIL_URL.to_string(),
            availability_url: AVAILABILITY_URL.to_string(),
        }
    }
}

/// Recognized `settings.toml` keys. Every key is optional; unknown keys are
/// tolerated so an older binary can read a newer file.
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    max_pool_size: Option<usize>,
    min_request_duration: Option<f64>,
    db_path: Option<String>,
    out_dir: Option<String>,
    index_url: Option<String>,
    detail_url: Option<String>,
    availability_url: Option<String>,
}

impl Config {
    /// Load settings from `path`. A missing file is not an error; the
    /// defaults apply silently.
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            debug!("no settings file at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let text = std::fs::read_to_string(path)?;
        Config::from_toml(&text)
    }

    fn from_toml(text: &str) -> Result<Config> {
        let file: SettingsFile = toml::from_str(text)
            .map_err(|e| AppError::Config(format!("settings file: {e}")))?;

        let defaults = Config::default();
        let cfg = Config {
            max_pool_size: file.max_pool_size.unwrap_or(defaults.max_pool_size),
            min_request_duration: file
                .min_request_duration
                .unwrap_or(defaults.min_request_duration),
            db_path: file.db_path.unwrap_or(defaults.db_path),
            out_dir: file.out_dir.unwrap_or(defaults.out_dir),
            index_url: file.index_url.unwrap_or(defaults.index_url),
            detail_url: file.detail_url.unwrap_or(defaults.detail_url),
            availability_url: file.availability_url.unwrap_or(defaults.availability_url),
        };

        if cfg.max_pool_size == 0 {
            return Err(AppError::Config(
                "max_pool_size must be a positive integer".to_string(),
            ));
        }
        if !cfg.min_request_duration.is_finite() || cfg.min_request_duration < 0.0 {
            return Err(AppError::Config(
                "min_request_duration must be a non-negative number of seconds".to_string(),
            ));
        }
        Ok(cfg)
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct OverridesFile {
    #[serde(default)]
    performance: Vec<OverrideRaw>,
}

#[derive(Debug, Deserialize)]
struct OverrideRaw {
    id: u32,
    theater: Option<String>,
    date: Option<String>,
    team: Option<String>,
}

/// Load the override table from `path`. A missing file yields an empty
/// table; a present-but-invalid entry is a configuration error.
pub fn load_overrides(path: &Path) -> Result<HashMap<u32, OverridePatch>> {
    if !path.exists() {
        debug!("no overrides file at {}", path.display());
        return Ok(HashMap::new());
    }
    let text = std::fs::read_to_string(path)?;
    overrides_from_toml(&text)
}

fn overrides_from_toml(text: &str) -> Result<HashMap<u32, OverridePatch>> {
    let file: OverridesFile =
        toml::from_str(text).map_err(|e| AppError::Config(format!("overrides file: {e}")))?;

    let mut table = HashMap::with_capacity(file.performance.len());
    for raw in file.performance {
        let theater = raw.theater.as_deref().map(Theater::from_name).transpose()?;
        let date = raw
            .date
            .as_deref()
            .map(|d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|_| {
                    AppError::Config(format!("override for id {}: bad date {d:?}", raw.id))
                })
            })
            .transpose()?;
        table.insert(
            raw.id,
            OverridePatch { id: raw.id, theater, date, team: raw.team },
        );
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_settings_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(&dir.path().join("settings.toml")).unwrap();
        assert_eq!(cfg.max_pool_size, 1);
        assert_eq!(cfg.min_request_duration, 0.5);
    }

    #[test]
    fn settings_keys_override_defaults() {
        let cfg = Config::from_toml(
            "max_pool_size = 4\nmin_request_duration = 1.25\ndb_path = \"x.db\"\n",
        )
        .unwrap();
        assert_eq!(cfg.max_pool_size, 4);
        assert_eq!(cfg.min_request_duration, 1.25);
        assert_eq!(cfg.db_path, "x.db");
        assert_eq!(cfg.out_dir, "reports");
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        assert!(Config::from_toml("max_pool_size = 0\n").is_err());
    }

    #[test]
    fn negative_request_duration_is_rejected() {
        assert!(Config::from_toml("min_request_duration = -1.0\n").is_err());
    }

    #[test]
    fn unknown_settings_keys_are_tolerated() {
        let cfg = Config::from_toml("max_pool_size = 2\nfuture_flag = true\n").unwrap();
        assert_eq!(cfg.max_pool_size, 2);
    }

    #[test]
    fn overrides_parse_partial_fields() {
        let table = overrides_from_toml(
            r#"
[[performance]]
id = 100
team = "B"

[[performance]]
id = 101
theater = "北京"
date = "2026-08-10"
"#,
        )
        .unwrap();

        let a = &table[&100];
        assert_eq!(a.team.as_deref(), Some("B"));
        assert!(a.theater.is_none() && a.date.is_none());

        let b = &table[&101];
        assert_eq!(b.theater, Some(Theater::Beijing));
        assert_eq!(b.date, Some(NaiveDate::from_ymd_opt(2026, 8, 10).unwrap()));
    }

    #[test]
    fn override_with_unknown_theater_is_rejected() {
        let res = overrides_from_toml("[[performance]]\nid = 1\ntheater = \"杭州\"\n");
        assert!(matches!(res, Err(AppError::UnknownTheater(_))));
    }

    #[test]
    fn override_with_bad_date_is_rejected() {
        let res = overrides_from_toml("[[performance]]\nid = 1\ndate = \"8月10日\"\n");
        assert!(matches!(res, Err(AppError::Config(_))));
    }

    #[test]
    fn missing_overrides_file_yields_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let table = load_overrides(&dir.path().join("overrides.toml")).unwrap();
        assert!(table.is_empty());
    }
}
