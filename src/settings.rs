use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{InsightError, Result};
use crate::forecast::DEFAULT_HORIZON;
use crate::pipeline::{DashboardConfig, Features};
use crate::reports::Granularity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    /// No colors at all.
    Plain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub granularity: Granularity,
    #[serde(default = "default_forecast_horizon")]
    pub forecast_horizon: usize,
    #[serde(default = "default_true")]
    pub heatmap: bool,
    #[serde(default = "default_true")]
    pub forecast: bool,
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
}

fn default_forecast_horizon() -> usize {
    DEFAULT_HORIZON
}

fn default_true() -> bool {
    true
}

fn default_export_dir() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("insightedge")
        .join("exports")
        .to_string_lossy()
        .to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            granularity: Granularity::default(),
            forecast_horizon: default_forecast_horizon(),
            heatmap: true,
            forecast: true,
            export_dir: default_export_dir(),
        }
    }
}

impl Settings {
    /// Dashboard defaults for this session; CLI flags override individual fields.
    pub fn dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            granularity: self.granularity,
            breakdown: None,
            features: Features {
                heatmap: self.heatmap,
                forecast: self.forecast,
            },
            forecast_horizon: self.forecast_horizon,
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("insightedge")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("ignoring invalid settings file {}: {e}", path.display());
            Settings::default()
        })
    } else {
        Settings::default()
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| InsightError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("settings.json");
        let settings = Settings {
            theme: Theme::Plain,
            granularity: Granularity::Week,
            forecast_horizon: 14,
            heatmap: false,
            forecast: true,
            export_dir: "/tmp/exports".to_string(),
        };
        save_settings_to(&settings, &path).unwrap();
        assert_eq!(load_settings_from(&path), settings);
    }

    #[test]
    fn test_load_returns_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_settings_from(&dir.path().join("nope.json"));
        assert_eq!(s.theme, Theme::Dark);
        assert_eq!(s.granularity, Granularity::Month);
        assert_eq!(s.forecast_horizon, 30);
        assert!(s.heatmap && s.forecast);
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"theme": "light", "granularity": "day"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.theme, Theme::Light);
        assert_eq!(s.granularity, Granularity::Day);
        assert_eq!(s.forecast_horizon, 30);
        assert!(!s.export_dir.is_empty());
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(load_settings_from(&path).forecast_horizon, 30);
    }

    #[test]
    fn test_dashboard_config_follows_settings() {
        let s = Settings {
            heatmap: false,
            granularity: Granularity::Day,
            ..Settings::default()
        };
        let c = s.dashboard_config();
        assert_eq!(c.granularity, Granularity::Day);
        assert!(!c.features.heatmap);
        assert!(c.features.forecast);
        assert_eq!(c.breakdown, None);
    }
}
