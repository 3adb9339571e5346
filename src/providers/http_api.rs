use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::{debug, instrument, warn};

use crate::core::currency::CurrencyPair;
use crate::core::error::ApiError;
use crate::core::market::{
    AnomalyPoint, AnomalyReport, CorrelationAnalysis, FactorEntry, MarketDataClient, NewsItem,
    PredictionOptions, PredictionPoint, PredictionSeries, RatePoint, RateQuote, VolatilityLevel,
    VolatilitySummary, VolatilityTrend,
};

/// Client for the forecasting service's JSON API.
pub struct HttpMarketDataClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpMarketDataClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fxcast/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpMarketDataClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        resource: &str,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Requesting {} from {}", resource, url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!(error = %e, %url, "Request failed");
            ApiError::network(&e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, %url, "Unsuccessful response");
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                resource: resource.to_string(),
            });
        }

        let text = response.text().await.map_err(|e| ApiError::network(&e))?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, response = %text, "Failed to parse {}", resource);
            ApiError::malformed(resource, e)
        })
    }
}

#[derive(Debug, Deserialize)]
struct RateResponse {
    rate: f64,
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    rates: Vec<HistoryItem>,
}

#[derive(Debug, Deserialize)]
struct HistoryItem {
    timestamp: DateTime<Utc>,
    rate: f64,
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Vec<ArticleItem>,
}

#[derive(Debug, Deserialize)]
struct ArticleItem {
    title: String,
    source: Option<String>,
    url: Option<String>,
    #[serde(alias = "publishedAt")]
    published_at: Option<DateTime<Utc>>,
    summary: Option<String>,
    sentiment: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    #[serde(alias = "currentRate")]
    current_rate: f64,
    #[serde(alias = "confidenceScore", deserialize_with = "lenient_number", default)]
    confidence_score: Option<f64>,
    #[serde(alias = "modelUsed")]
    model_used: Option<String>,
    #[serde(alias = "inputDataRange")]
    input_data_range: Option<String>,
    #[serde(alias = "predictionValues", default)]
    prediction_values: Vec<PredictionValue>,
    #[serde(alias = "backtestValues")]
    backtest_values: Option<Vec<PredictionValue>>,
}

#[derive(Debug, Deserialize)]
struct PredictionValue {
    timestamp: DateTime<Utc>,
    mean: f64,
    #[serde(alias = "lowerBound")]
    lower_bound: f64,
    #[serde(alias = "upperBound")]
    upper_bound: f64,
}

impl From<PredictionValue> for PredictionPoint {
    fn from(value: PredictionValue) -> Self {
        PredictionPoint {
            timestamp: value.timestamp,
            mean: value.mean,
            lower_bound: value.lower_bound,
            upper_bound: value.upper_bound,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VolatilityResponse {
    #[serde(alias = "volatilityLevel")]
    volatility_level: String,
    #[serde(alias = "currentVolatility")]
    current_volatility: f64,
    #[serde(alias = "averageVolatility")]
    average_volatility: f64,
    trend: String,
}

#[derive(Debug, Deserialize)]
struct CorrelationResponse {
    #[serde(alias = "analysisPeriodDays")]
    analysis_period_days: Option<u32>,
    #[serde(alias = "confidenceLevel")]
    confidence_level: Option<f64>,
    #[serde(alias = "influencingFactors", default)]
    influencing_factors: Vec<Option<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct AnomalyResponse {
    #[serde(alias = "analysisPeriodDays")]
    analysis_period_days: Option<u32>,
    #[serde(alias = "anomalyCount")]
    anomaly_count: Option<usize>,
    #[serde(alias = "anomalyPoints", default)]
    anomaly_points: Vec<AnomalyItem>,
}

#[derive(Debug, Deserialize)]
struct AnomalyItem {
    timestamp: DateTime<Utc>,
    value: f64,
    #[serde(alias = "zScore")]
    z_score: f64,
    description: Option<String>,
}

/// Accepts a number or a numeric string. Anything else reads as `None`.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Other(serde_json::Value),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Some(n),
        Raw::Text(s) => s.trim().parse().ok().filter(|n: &f64| n.is_finite()),
        Raw::Other(_) => None,
    })
}

fn parse_level(raw: &str) -> Option<VolatilityLevel> {
    match raw.trim().to_uppercase().as_str() {
        "LOW" => Some(VolatilityLevel::Low),
        "NORMAL" | "MEDIUM" => Some(VolatilityLevel::Normal),
        "HIGH" => Some(VolatilityLevel::High),
        _ => None,
    }
}

fn parse_trend(raw: &str) -> Option<VolatilityTrend> {
    match raw.trim().to_uppercase().as_str() {
        "INCREASING" | "UP" => Some(VolatilityTrend::Increasing),
        "DECREASING" | "DOWN" => Some(VolatilityTrend::Decreasing),
        "STABLE" | "FLAT" => Some(VolatilityTrend::Stable),
        _ => None,
    }
}

fn factor_entry(raw: Option<serde_json::Value>) -> FactorEntry {
    let Some(value) = raw else {
        return FactorEntry::default();
    };
    FactorEntry {
        name: value
            .get("factor")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        coefficient: value.get("correlation").and_then(|v| v.as_f64()),
    }
}

#[async_trait]
impl MarketDataClient for HttpMarketDataClient {
    #[instrument(name = "RateFetch", skip(self), fields(pair = %pair))]
    async fn fetch_rate(&self, pair: &CurrencyPair) -> Result<RateQuote, ApiError> {
        let endpoint = format!("/api/v1/exchange-rate?from={}&to={}", pair.base, pair.target);
        let resource = format!("exchange rate {pair}");
        let data: RateResponse = self.get_json(&endpoint, &resource).await?;

        if !data.rate.is_finite() || data.rate <= 0.0 {
            return Err(ApiError::malformed(
                resource,
                format!("rate must be positive, got {}", data.rate),
            ));
        }

        Ok(RateQuote {
            pair: pair.clone(),
            rate: data.rate,
            as_of: data.timestamp.unwrap_or_else(Utc::now),
        })
    }

    #[instrument(name = "NewsFetch", skip(self), fields(pair = %pair))]
    async fn fetch_news(
        &self,
        pair: &CurrencyPair,
        limit: usize,
    ) -> Result<Vec<NewsItem>, ApiError> {
        let endpoint = format!(
            "/api/v1/news?currencies={},{}&limit={}",
            pair.base, pair.target, limit
        );
        let data: NewsResponse = self.get_json(&endpoint, &format!("news {pair}")).await?;

        Ok(data
            .articles
            .into_iter()
            .take(limit)
            .map(|a| NewsItem {
                title: a.title,
                source: a.source,
                url: a.url,
                published_at: a.published_at,
                summary: a.summary,
                sentiment: a.sentiment,
            })
            .collect())
    }

    #[instrument(name = "HistoryFetch", skip(self), fields(pair = %pair))]
    async fn fetch_history(
        &self,
        pair: &CurrencyPair,
        days: u32,
    ) -> Result<Vec<RatePoint>, ApiError> {
        let endpoint = format!(
            "/api/v1/exchange-rate/history?from={}&to={}&days={}",
            pair.base, pair.target, days
        );
        let data: HistoryResponse = self
            .get_json(&endpoint, &format!("rate history {pair}"))
            .await?;

        let received = data.rates.len();
        let mut points: Vec<RatePoint> = data
            .rates
            .into_iter()
            .filter(|item| item.rate.is_finite() && item.rate > 0.0)
            .map(|item| RatePoint {
                timestamp: item.timestamp,
                rate: item.rate,
            })
            .collect();
        if points.len() < received {
            warn!(dropped = received - points.len(), "Skipping unusable history points");
        }
        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }

    #[instrument(name = "PredictionFetch", skip(self), fields(pair = %pair, model = %options.model))]
    async fn fetch_prediction(
        &self,
        pair: &CurrencyPair,
        options: &PredictionOptions,
    ) -> Result<PredictionSeries, ApiError> {
        let endpoint = format!(
            "/api/v1/predictions/{}/{}?forecast_horizon={}&model={}&refresh={}&backtest={}",
            pair.base,
            pair.target,
            options.horizon_days,
            options.model,
            options.refresh,
            options.backtest
        );
        let data: PredictionResponse = self
            .get_json(&endpoint, &format!("prediction {pair}"))
            .await?;
        debug!(
            confidence = ?data.confidence_score,
            points = data.prediction_values.len(),
            "Received prediction"
        );

        Ok(PredictionSeries {
            pair: pair.clone(),
            horizon_days: options.horizon_days,
            current_rate: data.current_rate,
            confidence_score: data.confidence_score,
            model: data.model_used,
            input_data_range: data.input_data_range,
            forecast: data.prediction_values.into_iter().map(Into::into).collect(),
            backtest: data
                .backtest_values
                .map(|values| values.into_iter().map(Into::into).collect()),
        })
    }

    #[instrument(name = "VolatilityFetch", skip(self), fields(pair = %pair))]
    async fn fetch_volatility(
        &self,
        pair: &CurrencyPair,
        days: u32,
    ) -> Result<VolatilitySummary, ApiError> {
        let endpoint = format!(
            "/api/v1/analytics/volatility/{}/{}?days={}",
            pair.base, pair.target, days
        );
        let resource = format!("volatility {pair}");
        let data: VolatilityResponse = self.get_json(&endpoint, &resource).await?;

        let level = parse_level(&data.volatility_level).ok_or_else(|| {
            ApiError::malformed(&resource, format!("unknown level {}", data.volatility_level))
        })?;
        let trend = parse_trend(&data.trend).ok_or_else(|| {
            ApiError::malformed(&resource, format!("unknown trend {}", data.trend))
        })?;

        Ok(VolatilitySummary {
            pair: pair.clone(),
            level,
            current: data.current_volatility,
            average: data.average_volatility,
            trend,
        })
    }

    #[instrument(name = "CorrelationFetch", skip(self), fields(pair = %pair))]
    async fn fetch_correlation(
        &self,
        pair: &CurrencyPair,
    ) -> Result<CorrelationAnalysis, ApiError> {
        let endpoint = format!("/api/v1/analytics/correlation/{}/{}", pair.base, pair.target);
        let data: CorrelationResponse = self
            .get_json(&endpoint, &format!("correlation {pair}"))
            .await?;

        Ok(CorrelationAnalysis {
            pair: pair.clone(),
            period_days: data.analysis_period_days,
            confidence_percent: data.confidence_level,
            factors: data.influencing_factors.into_iter().map(factor_entry).collect(),
        })
    }

    #[instrument(name = "AnomalyFetch", skip(self), fields(pair = %pair))]
    async fn fetch_anomalies(
        &self,
        pair: &CurrencyPair,
        days: u32,
    ) -> Result<AnomalyReport, ApiError> {
        let endpoint = format!(
            "/api/v1/analytics/anomalies/{}/{}?days={}",
            pair.base, pair.target, days
        );
        let data: AnomalyResponse = self
            .get_json(&endpoint, &format!("anomalies {pair}"))
            .await?;

        let points: Vec<AnomalyPoint> = data
            .anomaly_points
            .into_iter()
            .map(|p| AnomalyPoint {
                timestamp: p.timestamp,
                value: p.value,
                z_score: p.z_score,
                description: p.description,
            })
            .collect();

        Ok(AnomalyReport {
            pair: pair.clone(),
            period_days: data.analysis_period_days.unwrap_or(days),
            count: data.anomaly_count.unwrap_or(points.len()),
            points,
        })
    }
}
