use crate::core::currency::{CurrencyCode, CurrencyPair};
use crate::core::market::{ForecastModel, PredictionOptions};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: "http://localhost:8000".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
    pub amount: f64,
    pub refresh_interval_secs: u64,
    pub news_limit: usize,
    pub history_days: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            base: CurrencyCode::from_static("USD"),
            target: CurrencyCode::from_static("AUD"),
            amount: 1000.0,
            refresh_interval_secs: 60,
            news_limit: 5,
            history_days: 30,
        }
    }
}

impl DashboardConfig {
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.base.clone(), self.target.clone())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PredictionsConfig {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
    pub amount: f64,
    pub horizon_days: u32,
    pub model: ForecastModel,
    pub volatility_days: u32,
    pub anomaly_days: u32,
}

impl Default for PredictionsConfig {
    fn default() -> Self {
        PredictionsConfig {
            base: CurrencyCode::from_static("USD"),
            target: CurrencyCode::from_static("AUD"),
            amount: 1.0,
            horizon_days: 7,
            model: ForecastModel::Auto,
            volatility_days: 30,
            anomaly_days: 90,
        }
    }
}

impl PredictionsConfig {
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.base.clone(), self.target.clone())
    }

    pub fn prediction_options(&self) -> PredictionOptions {
        PredictionOptions {
            horizon_days: self.horizon_days,
            model: self.model.clone(),
            ..PredictionOptions::default()
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub predictions: PredictionsConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    /// Loads the config from the platform location, or the built-in defaults
    /// if `setup` has not been run yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "fxcast", "fxcast")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "fxcast", "fxcast")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
api:
  base_url: "http://example.com/fx"
dashboard:
  base: "eur"
  target: "GBP"
  amount: 250.0
  refresh_interval_secs: 30
predictions:
  base: "USD"
  target: "JPY"
  horizon_days: 14
  model: statistical
  anomaly_days: 60
data_path: "/tmp/fxcast"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.api.base_url, "http://example.com/fx");
        assert_eq!(config.dashboard.pair().to_string(), "EUR/GBP");
        assert_eq!(config.dashboard.amount, 250.0);
        assert_eq!(config.dashboard.refresh_interval(), Duration::from_secs(30));
        assert_eq!(config.dashboard.news_limit, 5);

        assert_eq!(config.predictions.pair().to_string(), "USD/JPY");
        assert_eq!(config.predictions.model, ForecastModel::Statistical);
        assert_eq!(config.predictions.volatility_days, 30);
        assert_eq!(config.predictions.anomaly_days, 60);
        let options = config.predictions.prediction_options();
        assert_eq!(options.horizon_days, 14);
        assert!(options.backtest);
        assert!(options.refresh);

        assert_eq!(config.data_path().unwrap(), PathBuf::from("/tmp/fxcast"));
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("data_path: ~").unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.dashboard.pair().to_string(), "USD/AUD");
        assert_eq!(config.dashboard.refresh_interval(), Duration::from_secs(60));
        assert_eq!(config.predictions.horizon_days, 7);
        assert_eq!(config.predictions.model, ForecastModel::Auto);
        assert_eq!(config.predictions.volatility_days, 30);
        assert_eq!(config.predictions.anomaly_days, 90);
    }

    #[test]
    fn test_invalid_currency_is_rejected() {
        let yaml_str = r#"
dashboard:
  base: "DOLLARS"
"#;
        assert!(serde_yaml::from_str::<AppConfig>(yaml_str).is_err());
    }
}
