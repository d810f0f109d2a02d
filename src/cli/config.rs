use crate::error::{InsightError, Result};
use crate::reports::Granularity;
use crate::settings::{save_settings, settings_path, Settings, Theme};

pub fn show(settings: &Settings) -> Result<()> {
    let json = serde_json::to_string_pretty(settings)?;
    println!("{json}");
    println!("Stored at {}", settings_path().display());
    Ok(())
}

#[derive(Debug, Default)]
pub struct SettingsChange {
    pub theme: Option<Theme>,
    pub granularity: Option<Granularity>,
    pub forecast_horizon: Option<usize>,
    pub heatmap: Option<bool>,
    pub forecast: Option<bool>,
    pub export_dir: Option<String>,
}

impl SettingsChange {
    pub fn is_empty(&self) -> bool {
        self.theme.is_none()
            && self.granularity.is_none()
            && self.forecast_horizon.is_none()
            && self.heatmap.is_none()
            && self.forecast.is_none()
            && self.export_dir.is_none()
    }

    pub fn apply(self, mut settings: Settings) -> Result<Settings> {
        if let Some(h) = self.forecast_horizon {
            if h == 0 {
                return Err(InsightError::Settings(
                    "forecast horizon must be at least 1 day".into(),
                ));
            }
            settings.forecast_horizon = h;
        }
        if let Some(t) = self.theme {
            settings.theme = t;
        }
        if let Some(g) = self.granularity {
            settings.granularity = g;
        }
        if let Some(b) = self.heatmap {
            settings.heatmap = b;
        }
        if let Some(b) = self.forecast {
            settings.forecast = b;
        }
        if let Some(dir) = self.export_dir {
            settings.export_dir = dir;
        }
        Ok(settings)
    }
}

pub fn set(change: SettingsChange, settings: Settings) -> Result<()> {
    if change.is_empty() {
        return Err(InsightError::Settings(
            "nothing to change; pass at least one option".into(),
        ));
    }
    let updated = change.apply(settings)?;
    save_settings(&updated)?;
    println!("Saved {}", settings_path().display());
    Ok(())
}
