//! Market data types and the remote data client abstraction

use crate::core::currency::CurrencyPair;
use crate::core::error::ApiError;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Z-score magnitude above which a point counts as anomalous.
pub const ANOMALY_Z_THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    pub pair: CurrencyPair,
    pub rate: f64,
    pub as_of: DateTime<Utc>,
}

/// A past closing rate for the conversion chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatePoint {
    pub timestamp: DateTime<Utc>,
    pub rate: f64,
}

/// Low, high and overall move across a rate history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateRange {
    pub low: f64,
    pub high: f64,
    pub change_percent: f64,
}

impl RateRange {
    /// Summarizes points in chronological order. `None` without any points or
    /// when the first rate is not positive.
    pub fn of(points: &[RatePoint]) -> Option<Self> {
        let first = points.first()?.rate;
        let last = points.last()?.rate;
        if first <= 0.0 {
            return None;
        }
        let (low, high) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.rate), hi.max(p.rate))
            });
        Some(Self {
            low,
            high,
            change_percent: (last - first) / first * 100.0,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub source: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub sentiment: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ForecastModel {
    #[default]
    Auto,
    Statistical,
    Named(String),
}

impl Display for ForecastModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastModel::Auto => f.write_str("auto"),
            ForecastModel::Statistical => f.write_str("statistical"),
            ForecastModel::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for ForecastModel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        match name.as_str() {
            "auto" => Ok(ForecastModel::Auto),
            "statistical" => Ok(ForecastModel::Statistical),
            _ if !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') =>
            {
                Ok(ForecastModel::Named(name))
            }
            _ => Err(anyhow!("Invalid forecast model: {}", s)),
        }
    }
}

impl TryFrom<String> for ForecastModel {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ForecastModel> for String {
    fn from(model: ForecastModel) -> Self {
        model.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionOptions {
    pub horizon_days: u32,
    pub model: ForecastModel,
    pub refresh: bool,
    pub backtest: bool,
}

impl Default for PredictionOptions {
    fn default() -> Self {
        Self {
            horizon_days: 7,
            model: ForecastModel::Auto,
            refresh: true,
            backtest: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionPoint {
    pub timestamp: DateTime<Utc>,
    pub mean: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionSeries {
    pub pair: CurrencyPair,
    pub horizon_days: u32,
    pub current_rate: f64,
    /// `None` when the backend sent no usable score.
    pub confidence_score: Option<f64>,
    pub model: Option<String>,
    pub input_data_range: Option<String>,
    pub forecast: Vec<PredictionPoint>,
    pub backtest: Option<Vec<PredictionPoint>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatilityLevel {
    Low,
    Normal,
    High,
}

impl VolatilityLevel {
    /// Level shown to users; NORMAL is presented as LOW.
    pub fn display_level(self) -> VolatilityLevel {
        match self {
            VolatilityLevel::Normal => VolatilityLevel::Low,
            other => other,
        }
    }
}

impl Display for VolatilityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            VolatilityLevel::Low => "LOW",
            VolatilityLevel::Normal => "NORMAL",
            VolatilityLevel::High => "HIGH",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatilityTrend {
    Increasing,
    Decreasing,
    Stable,
}

impl Display for VolatilityTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            VolatilityTrend::Increasing => "INCREASING",
            VolatilityTrend::Decreasing => "DECREASING",
            VolatilityTrend::Stable => "STABLE",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolatilitySummary {
    pub pair: CurrencyPair,
    pub level: VolatilityLevel,
    pub current: f64,
    pub average: f64,
    pub trend: VolatilityTrend,
}

/// A factor entry as received. Either side may be missing or malformed;
/// validation happens when the heatmap is projected.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FactorEntry {
    pub name: Option<String>,
    pub coefficient: Option<f64>,
}

impl FactorEntry {
    pub fn new(name: &str, coefficient: f64) -> Self {
        Self {
            name: Some(name.to_string()),
            coefficient: Some(coefficient),
        }
    }

    pub fn validate(&self) -> Option<CorrelationFactor> {
        let name = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
        let coefficient = self.coefficient.filter(|c| c.is_finite())?;
        Some(CorrelationFactor {
            name: name.to_string(),
            coefficient,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationFactor {
    pub name: String,
    pub coefficient: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationAnalysis {
    pub pair: CurrencyPair,
    pub period_days: Option<u32>,
    pub confidence_percent: Option<f64>,
    pub factors: Vec<FactorEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub z_score: f64,
    pub description: Option<String>,
}

impl AnomalyPoint {
    pub fn is_significant(&self) -> bool {
        self.z_score.abs() > ANOMALY_Z_THRESHOLD
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyReport {
    pub pair: CurrencyPair,
    pub period_days: u32,
    pub count: usize,
    pub points: Vec<AnomalyPoint>,
}

/// Remote API for every data source the screens display.
///
/// Implementations never retry; a failed call is reported once and the caller
/// decides whether to invoke it again.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    async fn fetch_rate(&self, pair: &CurrencyPair) -> Result<RateQuote, ApiError>;

    async fn fetch_news(&self, pair: &CurrencyPair, limit: usize)
    -> Result<Vec<NewsItem>, ApiError>;

    /// Daily rates for the last `days` days, oldest first.
    async fn fetch_history(&self, pair: &CurrencyPair, days: u32)
    -> Result<Vec<RatePoint>, ApiError>;

    async fn fetch_prediction(
        &self,
        pair: &CurrencyPair,
        options: &PredictionOptions,
    ) -> Result<PredictionSeries, ApiError>;

    async fn fetch_volatility(
        &self,
        pair: &CurrencyPair,
        days: u32,
    ) -> Result<VolatilitySummary, ApiError>;

    async fn fetch_correlation(&self, pair: &CurrencyPair)
    -> Result<CorrelationAnalysis, ApiError>;

    async fn fetch_anomalies(&self, pair: &CurrencyPair, days: u32)
    -> Result<AnomalyReport, ApiError>;
}
