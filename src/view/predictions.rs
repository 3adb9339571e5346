//! Forecast screen.
//!
//! Four independent sources feed it: the forecast itself, volatility,
//! correlation and anomalies. Each one loads, fails and renders on its own, so
//! a broken analytics endpoint never hides the chart. The analytics sources
//! are only meaningful for a real pair and are skipped for identity pairs.

use crate::core::config::PredictionsConfig;
use crate::core::currency::{CurrencyCode, CurrencyPair};
use crate::core::error::ApiError;
use crate::core::heatmap::{self, Heatmap};
use crate::core::market::{
    AnomalyReport, CorrelationAnalysis, ForecastModel, MarketDataClient, PredictionOptions,
    PredictionSeries, VolatilitySummary,
};
use crate::core::series::{self, ChartPoint, RateCardRow};
use crate::view::source::{Panel, Scope, Source, SourceState, TaskSet, load};
use crate::view::visibility::{SectionObserver, VISIBILITY_THRESHOLD, Viewport};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

pub const VOLATILITY_FAILURE: &str = "Failed to load volatility data. Please try again.";
pub const CORRELATION_FAILURE: &str = "Failed to load correlation data. Please try again later.";
pub const ANOMALY_FAILURE: &str = "Failed to load anomaly data. Please try again later.";

/// Guidance shown next to a failed forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryHint {
    /// The model ran out of time; the statistical model is faster.
    SlowBackend,
    /// The server failed while computing the forecast.
    ServerError,
    Other,
}

impl RetryHint {
    pub fn for_error(error: &ApiError) -> Self {
        if error.is_slow_backend() {
            RetryHint::SlowBackend
        } else if error.status() == Some(500) {
            RetryHint::ServerError
        } else {
            RetryHint::Other
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            RetryHint::SlowBackend => {
                "The prediction request timed out. Try the statistical model, which is faster, or try again later."
            }
            RetryHint::ServerError => {
                "The server could not process the request. This might be a temporary issue; try again with different settings."
            }
            RetryHint::Other => "Try again in a moment.",
        }
    }

    /// Model a retry button should offer.
    pub fn suggested_model(self) -> ForecastModel {
        match self {
            RetryHint::SlowBackend => ForecastModel::Statistical,
            _ => ForecastModel::Auto,
        }
    }
}

pub struct PredictionsController {
    client: Arc<dyn MarketDataClient>,
    pair: CurrencyPair,
    amount: f64,
    options: PredictionOptions,
    volatility_days: u32,
    anomaly_days: u32,
    show_historical: bool,
    scope: Arc<Scope>,
    tasks: Arc<TaskSet>,
    prediction: Arc<Source<PredictionSeries>>,
    volatility: Arc<Source<VolatilitySummary>>,
    correlation: Arc<Source<CorrelationAnalysis>>,
    anomalies: Arc<Source<AnomalyReport>>,
    viewport: Viewport,
    analysis: SectionObserver,
}

impl PredictionsController {
    /// Creates the screen and fetches every source for the configured pair.
    /// Must be called from within a tokio runtime.
    pub fn mount(client: Arc<dyn MarketDataClient>, config: &PredictionsConfig) -> Self {
        let scope = Scope::new();
        let viewport = Viewport::default();
        let analysis =
            SectionObserver::observe("analysis", viewport.subscribe(), VISIBILITY_THRESHOLD);
        let controller = Self {
            client,
            pair: config.pair(),
            amount: config.amount,
            options: config.prediction_options(),
            volatility_days: config.volatility_days,
            anomaly_days: config.anomaly_days,
            show_historical: true,
            // Forecast errors are shown verbatim with a retry hint
            prediction: Source::new("prediction", &scope, None),
            volatility: Source::new("volatility", &scope, Some(VOLATILITY_FAILURE)),
            correlation: Source::new("correlation", &scope, Some(CORRELATION_FAILURE)),
            anomalies: Source::new("anomalies", &scope, Some(ANOMALY_FAILURE)),
            scope,
            tasks: Arc::new(TaskSet::default()),
            viewport,
            analysis,
        };
        info!(pair = %controller.pair, "Predictions mounted");
        controller.load_all();
        controller
    }

    fn load_all(&self) {
        if self.pair.is_identity() {
            debug!(pair = %self.pair, "Identity pair, nothing to fetch");
            return;
        }
        self.load_prediction(self.options.clone());

        let client = Arc::clone(&self.client);
        let pair = self.pair.clone();
        let days = self.volatility_days;
        load(&self.tasks, &self.volatility, async move {
            client.fetch_volatility(&pair, days).await
        });

        let client = Arc::clone(&self.client);
        let pair = self.pair.clone();
        load(&self.tasks, &self.correlation, async move {
            client.fetch_correlation(&pair).await
        });

        let client = Arc::clone(&self.client);
        let pair = self.pair.clone();
        let days = self.anomaly_days;
        load(&self.tasks, &self.anomalies, async move {
            client.fetch_anomalies(&pair, days).await
        });
    }

    fn load_prediction(&self, options: PredictionOptions) {
        let client = Arc::clone(&self.client);
        let pair = self.pair.clone();
        load(&self.tasks, &self.prediction, async move {
            client.fetch_prediction(&pair, &options).await
        });
    }

    fn on_pair_changed(&mut self, previous: CurrencyPair) {
        if self.pair == previous || !self.scope.is_mounted() {
            return;
        }
        debug!(from = %previous, to = %self.pair, "Pair changed");
        self.prediction.reset();
        self.volatility.reset();
        self.correlation.reset();
        self.anomalies.reset();
        self.load_all();
    }

    pub fn select_base(&mut self, code: CurrencyCode) {
        let previous = self.pair.clone();
        self.pair.select_base(code);
        self.on_pair_changed(previous);
    }

    pub fn select_target(&mut self, code: CurrencyCode) {
        let previous = self.pair.clone();
        self.pair.select_target(code);
        self.on_pair_changed(previous);
    }

    /// Fetches the forecast again, optionally with a different model for this
    /// attempt only. The analytics panels are left as they are.
    pub fn retry_prediction(&self, model: Option<ForecastModel>) {
        if self.pair.is_identity() {
            return;
        }
        let mut options = self.options.clone();
        if let Some(model) = model {
            options.model = model;
        }
        info!(pair = %self.pair, model = %options.model, "Retrying prediction");
        self.load_prediction(options);
    }

    pub fn pair(&self) -> &CurrencyPair {
        &self.pair
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn set_amount(&mut self, amount: f64) {
        self.amount = if amount.is_finite() { amount } else { 0.0 };
    }

    pub fn set_amount_input(&mut self, raw: &str) {
        self.set_amount(raw.trim().parse().unwrap_or(0.0));
    }

    pub fn show_historical(&self) -> bool {
        self.show_historical
    }

    pub fn toggle_historical(&mut self) {
        self.show_historical = !self.show_historical;
    }

    pub fn set_show_historical(&mut self, show: bool) {
        self.show_historical = show;
    }

    pub fn prediction(&self) -> SourceState<PredictionSeries> {
        self.prediction.snapshot()
    }

    pub fn volatility(&self) -> SourceState<VolatilitySummary> {
        self.volatility.snapshot()
    }

    pub fn correlation(&self) -> SourceState<CorrelationAnalysis> {
        self.correlation.snapshot()
    }

    pub fn anomalies(&self) -> SourceState<AnomalyReport> {
        self.anomalies.snapshot()
    }

    pub fn prediction_hint(&self) -> Option<RetryHint> {
        self.prediction
            .snapshot()
            .error
            .map(|e| RetryHint::for_error(&e.cause))
    }

    /// Forecast and backtest merged in time order. Empty until a forecast is held.
    pub fn chart_data(&self) -> Vec<ChartPoint> {
        match self.prediction.snapshot().data {
            Some(prediction) => series::merge_series(
                &prediction.forecast,
                prediction.backtest.as_deref(),
                self.show_historical,
            ),
            None => Vec::new(),
        }
    }

    pub fn rate_card(&self) -> Vec<RateCardRow> {
        series::rate_card_rows(&self.chart_data())
    }

    /// Amount converted at the forecast's current rate.
    pub fn converted_amount(&self) -> Option<f64> {
        if self.pair.is_identity() {
            return Some(self.amount);
        }
        self.prediction
            .snapshot()
            .data
            .map(|prediction| self.amount * prediction.current_rate)
    }

    pub fn volatility_panel(&self) -> Panel<VolatilitySummary> {
        self.volatility.snapshot().into_panel()
    }

    /// A successful response without usable factors is `Empty`, not `Failed`.
    pub fn heatmap_panel(&self) -> Panel<Heatmap> {
        self.correlation
            .snapshot()
            .into_panel()
            .map(|analysis| heatmap::project(&analysis.factors))
            .empty_if(Heatmap::is_empty)
    }

    pub fn anomaly_panel(&self) -> Panel<AnomalyReport> {
        self.anomalies
            .snapshot()
            .into_panel()
            .empty_if(|report| report.points.is_empty())
    }

    /// Reports how much of the analysis section is on screen, from 0.0 to 1.0.
    pub fn report_viewport(&self, ratio: f64) {
        self.viewport.report(ratio);
    }

    pub fn analysis_visible(&self) -> bool {
        self.analysis.is_visible()
    }

    pub fn subscribe_analysis_visibility(&self) -> watch::Receiver<bool> {
        self.analysis.subscribe()
    }

    pub fn revision(&self) -> u64 {
        self.scope.revision()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.scope.subscribe()
    }

    pub fn is_mounted(&self) -> bool {
        self.scope.is_mounted()
    }

    pub async fn settle(&self) {
        self.tasks.settle().await;
    }

    pub fn unmount(&mut self) {
        if !self.scope.is_mounted() {
            return;
        }
        self.scope.close();
        self.analysis.disconnect();
        info!(pair = %self.pair, "Predictions unmounted");
    }
}

impl Drop for PredictionsController {
    fn drop(&mut self) {
        self.unmount();
    }
}
