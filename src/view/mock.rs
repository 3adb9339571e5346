//! In-memory market data client for controller tests.

use crate::core::currency::CurrencyPair;
use crate::core::error::ApiError;
use crate::core::market::{
    AnomalyPoint, AnomalyReport, CorrelationAnalysis, FactorEntry, MarketDataClient, NewsItem,
    PredictionOptions, PredictionPoint, PredictionSeries, RatePoint, RateQuote, VolatilityLevel,
    VolatilitySummary, VolatilityTrend,
};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, watch};

#[derive(Default)]
pub(crate) struct MockMarket {
    calls: Mutex<Vec<(&'static str, String)>>,
    models: Mutex<Vec<String>>,
    failures: Mutex<HashMap<&'static str, ApiError>>,
    gates: Mutex<HashMap<(&'static str, String), Arc<Notify>>>,
    factors: Mutex<Option<Vec<FactorEntry>>>,
}

pub(crate) fn http(status: u16) -> ApiError {
    ApiError::HttpStatus {
        status,
        resource: "mock".to_string(),
    }
}

pub(crate) fn rate_for(pair: &CurrencyPair) -> f64 {
    match pair.target.as_str() {
        "AUD" => 1.5,
        "JPY" => 150.0,
        "EUR" => 0.9,
        _ => 1.1,
    }
}

impl MockMarket {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, kind: &'static str, error: ApiError) {
        self.failures.lock().unwrap().insert(kind, error);
    }

    pub fn recover(&self, kind: &'static str) {
        self.failures.lock().unwrap().remove(kind);
    }

    /// Blocks the next `kind` fetch for `pair` until the returned handle is notified.
    pub fn hold(&self, kind: &'static str, pair: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert((kind, pair.to_string()), Arc::clone(&gate));
        gate
    }

    pub fn set_factors(&self, factors: Vec<FactorEntry>) {
        *self.factors.lock().unwrap() = Some(factors);
    }

    pub fn calls(&self, kind: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    pub fn calls_for(&self, kind: &str, pair: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, p)| *k == kind && p == pair)
            .count()
    }

    pub fn models(&self) -> Vec<String> {
        self.models.lock().unwrap().clone()
    }

    async fn enter(&self, kind: &'static str, pair: &CurrencyPair) -> Result<(), ApiError> {
        let key = pair.to_string();
        self.calls.lock().unwrap().push((kind, key.clone()));
        let gate = self.gates.lock().unwrap().remove(&(kind, key));
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.failures.lock().unwrap().get(kind) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

fn point(day: i64, mean: f64) -> PredictionPoint {
    PredictionPoint {
        timestamp: Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap() + ChronoDuration::days(day),
        mean,
        lower_bound: mean * 0.99,
        upper_bound: mean * 1.01,
    }
}

#[async_trait]
impl MarketDataClient for MockMarket {
    async fn fetch_rate(&self, pair: &CurrencyPair) -> Result<RateQuote, ApiError> {
        self.enter("rate", pair).await?;
        Ok(RateQuote {
            pair: pair.clone(),
            rate: rate_for(pair),
            as_of: Utc::now(),
        })
    }

    async fn fetch_news(
        &self,
        pair: &CurrencyPair,
        limit: usize,
    ) -> Result<Vec<NewsItem>, ApiError> {
        self.enter("news", pair).await?;
        Ok((0..limit.min(2))
            .map(|i| NewsItem {
                title: format!("{} headline {}", pair, i + 1),
                source: Some("Wire".to_string()),
                url: None,
                published_at: None,
                summary: None,
                sentiment: None,
            })
            .collect())
    }

    async fn fetch_history(
        &self,
        pair: &CurrencyPair,
        _days: u32,
    ) -> Result<Vec<RatePoint>, ApiError> {
        self.enter("history", pair).await?;
        let rate = rate_for(pair);
        Ok([0.98, 1.02, 1.0]
            .iter()
            .zip(-3..)
            .map(|(factor, day)| RatePoint {
                timestamp: point(day, rate).timestamp,
                rate: rate * factor,
            })
            .collect())
    }

    async fn fetch_prediction(
        &self,
        pair: &CurrencyPair,
        options: &PredictionOptions,
    ) -> Result<PredictionSeries, ApiError> {
        self.models.lock().unwrap().push(options.model.to_string());
        self.enter("prediction", pair).await?;
        let rate = rate_for(pair);
        Ok(PredictionSeries {
            pair: pair.clone(),
            horizon_days: options.horizon_days,
            current_rate: rate,
            confidence_score: Some(82.0),
            model: Some(options.model.to_string()),
            input_data_range: None,
            forecast: vec![point(1, rate * 1.01), point(2, rate * 1.02)],
            backtest: Some(vec![point(-1, rate * 0.99), point(0, rate)]),
        })
    }

    async fn fetch_volatility(
        &self,
        pair: &CurrencyPair,
        _days: u32,
    ) -> Result<VolatilitySummary, ApiError> {
        self.enter("volatility", pair).await?;
        Ok(VolatilitySummary {
            pair: pair.clone(),
            level: VolatilityLevel::Normal,
            current: 7.5,
            average: 8.1,
            trend: VolatilityTrend::Stable,
        })
    }

    async fn fetch_correlation(
        &self,
        pair: &CurrencyPair,
    ) -> Result<CorrelationAnalysis, ApiError> {
        self.enter("correlation", pair).await?;
        let factors = self.factors.lock().unwrap().clone().unwrap_or_else(|| {
            vec![
                FactorEntry::new("GDP", 0.62),
                FactorEntry::new("Interest Rate", -0.41),
            ]
        });
        Ok(CorrelationAnalysis {
            pair: pair.clone(),
            period_days: Some(365),
            confidence_percent: Some(95.0),
            factors,
        })
    }

    async fn fetch_anomalies(
        &self,
        pair: &CurrencyPair,
        days: u32,
    ) -> Result<AnomalyReport, ApiError> {
        self.enter("anomalies", pair).await?;
        let points = vec![AnomalyPoint {
            timestamp: Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
            value: rate_for(pair) * 1.05,
            z_score: 2.7,
            description: None,
        }];
        Ok(AnomalyReport {
            pair: pair.clone(),
            period_days: days,
            count: points.len(),
            points,
        })
    }
}

/// Waits for revisions until `done` holds.
pub(crate) async fn until(revisions: &mut watch::Receiver<u64>, done: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !done() {
            revisions.changed().await.unwrap();
        }
    })
    .await
    .unwrap();
}
