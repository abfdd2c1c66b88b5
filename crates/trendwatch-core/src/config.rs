use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Service configuration, loadable from a JSON file. Every field has a
/// default so a partial file (or none at all) is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrendConfig {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub target_language: String,
    pub hour_limit: usize,
    pub recent_limit: usize,
    pub hourly_window_secs: u64,
    pub recent_window_secs: u64,
    pub overfetch: usize,
    pub retention_secs: u64,
    pub eviction_interval_secs: u64,
    pub settings_refresh_secs: u64,
    pub trending_refresh_secs: u64,
    pub channel_capacity: usize,
    pub max_pending_writes: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            data_dir: PathBuf::from("trendwatch_data"),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            hour_limit: DEFAULT_HOUR_LIMIT,
            recent_limit: DEFAULT_RECENT_LIMIT,
            hourly_window_secs: HOURLY_WINDOW_SECS,
            recent_window_secs: RECENT_WINDOW_SECS,
            overfetch: DEFAULT_OVERFETCH,
            retention_secs: RETENTION_SECS,
            eviction_interval_secs: EVICTION_INTERVAL_SECS,
            settings_refresh_secs: SETTINGS_REFRESH_SECS,
            trending_refresh_secs: TRENDING_REFRESH_SECS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            max_pending_writes: DEFAULT_MAX_PENDING_WRITES,
        }
    }
}

impl TrendConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: TrendConfig =
            serde_json::from_str(json).context("Failed to deserialize config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("hourlyWindowSecs", self.hourly_window_secs),
            ("recentWindowSecs", self.recent_window_secs),
            ("retentionSecs", self.retention_secs),
            ("evictionIntervalSecs", self.eviction_interval_secs),
            ("settingsRefreshSecs", self.settings_refresh_secs),
            ("trendingRefreshSecs", self.trending_refresh_secs),
        ];
        for (name, value) in durations {
            if value == 0 {
                bail!("{name} must be greater than zero");
            }
            if value > MAX_DURATION_SECS {
                bail!("{name} must be at most {MAX_DURATION_SECS} seconds");
            }
        }
        if self.channel_capacity == 0 {
            bail!("channelCapacity must be greater than zero");
        }
        if self.max_pending_writes == 0 {
            bail!("maxPendingWrites must be greater than zero");
        }
        if self.target_language.trim().is_empty() {
            bail!("targetLanguage must not be empty");
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("trendwatch.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_minimal() {
        let config = TrendConfig::from_json("{}").unwrap();
        assert_eq!(config.hour_limit, 15);
        assert_eq!(config.recent_limit, 10);
        assert_eq!(config.hourly_window_secs, 5400);
        assert_eq!(config.recent_window_secs, 600);
        assert_eq!(config.retention_secs, 10800);
        assert_eq!(config.target_language, "pt");
    }

    #[test]
    fn test_parse_config_overrides() {
        let json = r#"{"bindAddr": "127.0.0.1:8080", "hourLimit": 20, "targetLanguage": "en"}"#;
        let config = TrendConfig::from_json(json).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.hour_limit, 20);
        assert_eq!(config.target_language, "en");
        assert_eq!(config.recent_limit, 10);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = TrendConfig::from_json(r#"{"trendingRefreshSecs": 0}"#).unwrap_err();
        assert!(err.to_string().contains("trendingRefreshSecs"));
    }

    #[test]
    fn test_rejects_oversized_window() {
        let err = TrendConfig::from_json(r#"{"hourlyWindowSecs": 18446744073709551}"#).unwrap_err();
        assert!(err.to_string().contains("hourlyWindowSecs"));

        let year = TrendConfig::from_json(r#"{"retentionSecs": 31622400}"#).unwrap();
        assert_eq!(year.retention_secs, MAX_DURATION_SECS);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"dataDir": "/var/lib/trendwatch"}"#).unwrap();
        let config = TrendConfig::load(&path).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/var/lib/trendwatch/trendwatch.db"));
    }
}
