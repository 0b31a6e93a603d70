use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::render::chart::{BUNDLED_FONT_FAMILY, ChartConfig, MAX_CHART_SAMPLES};

/// Connection settings for api.weather.gov.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoaaConfig {
    pub base_url: String,

    /// NOAA rejects anonymous clients; put a contact address in here.
    pub user_agent: String,

    /// Upper bound on one forecast fetch, both round trips included. There
    /// is no retry.
    pub timeout_secs: u64,
}

impl Default for NoaaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.weather.gov".to_string(),
            user_agent: concat!("forecast-dash/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
        }
    }
}

/// How many leading periods each display shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub text_periods: usize,
    pub chart_periods: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { text_periods: 4, chart_periods: MAX_CHART_SAMPLES }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0:8000".to_string() }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// [noaa]
/// user_agent = "(my-dash, me@example.com)"
///
/// [display]
/// text_periods = 4
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub noaa: NoaaConfig,
    pub display: DisplayConfig,
    pub chart: ChartConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "forecast-dash", "forecast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    fn validate(&self) -> Result<()> {
        if self.display.text_periods == 0 || self.display.chart_periods == 0 {
            return Err(anyhow!("display.text_periods and display.chart_periods must be at least 1"));
        }
        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(anyhow!("chart.width and chart.height must be non-zero"));
        }
        if self.chart.font_path.is_none() && self.chart.font_family != BUNDLED_FONT_FAMILY {
            return Err(anyhow!(
                "chart.font_family '{}' needs chart.font_path; only '{BUNDLED_FONT_FAMILY}' is built in",
                self.chart.font_family
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_display_geometry() {
        let cfg = Config::default();

        assert_eq!(cfg.noaa.base_url, "https://api.weather.gov");
        assert_eq!(cfg.display.text_periods, 4);
        assert_eq!(cfg.display.chart_periods, 24);
        assert_eq!((cfg.chart.width, cfg.chart.height), (400, 200));
        assert_eq!(cfg.chart.title, "Temperature");
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let cfg = Config::from_toml(
            r#"
            [noaa]
            user_agent = "(dash, me@example.com)"

            [display]
            text_periods = 3
            "#,
        )
        .expect("valid config");

        assert_eq!(cfg.noaa.user_agent, "(dash, me@example.com)");
        assert_eq!(cfg.noaa.timeout_secs, 30);
        assert_eq!(cfg.display.text_periods, 3);
        assert_eq!(cfg.display.chart_periods, 24);
        assert_eq!(cfg.server.bind, "0.0.0.0:8000");
    }

    #[test]
    fn zero_period_counts_are_rejected() {
        let err = Config::from_toml("[display]\ntext_periods = 0\n").unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn custom_font_family_needs_a_font_file() {
        let err = Config::from_toml("[chart]\nfont_family = \"Inter\"\n").unwrap_err();
        assert!(err.to_string().contains("font_path"));

        let cfg = Config::from_toml("[chart]\nfont_family = \"Inter\"\nfont_path = \"/fonts/Inter.ttf\"\n")
            .expect("font file given");
        assert_eq!(cfg.chart.font_family, "Inter");
    }

    #[test]
    fn toml_roundtrip() {
        let mut cfg = Config::default();
        cfg.chart.font_path = Some(PathBuf::from("/usr/share/fonts/DejaVuSans.ttf"));

        let text = toml::to_string_pretty(&cfg).unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), cfg);
    }
}
