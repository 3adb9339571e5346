//! Home screen: live conversion for the selected pair, its recent rate history
//! and market news.

use crate::core::config::DashboardConfig;
use crate::core::currency::{CurrencyCode, CurrencyPair};
use crate::core::market::{MarketDataClient, NewsItem, RatePoint, RateQuote, RateRange};
use crate::view::refresh::RefreshTask;
use crate::view::source::{Panel, Scope, Source, SourceState, TaskSet, load};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

pub const RATE_FAILURE: &str = "Failed to fetch exchange rate. Please try again later.";
pub const NEWS_FAILURE: &str = "Failed to load market news.";
pub const HISTORY_FAILURE: &str = "Failed to load historical rates.";

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub pair: CurrencyPair,
    pub amount: f64,
    pub rate: f64,
    pub converted: f64,
    pub as_of: DateTime<Utc>,
}

pub struct DashboardController {
    client: Arc<dyn MarketDataClient>,
    pair: CurrencyPair,
    amount: f64,
    news_limit: usize,
    history_days: u32,
    refresh_interval: Duration,
    scope: Arc<Scope>,
    tasks: Arc<TaskSet>,
    rate: Arc<Source<RateQuote>>,
    news: Arc<Source<Vec<NewsItem>>>,
    history: Arc<Source<Vec<RatePoint>>>,
    refresh: Option<RefreshTask>,
}

/// Identity pairs convert at exactly 1.0 without asking the server.
fn load_rate(
    client: &Arc<dyn MarketDataClient>,
    tasks: &TaskSet,
    rate: &Arc<Source<RateQuote>>,
    pair: &CurrencyPair,
) {
    if pair.is_identity() {
        rate.set_local(RateQuote {
            pair: pair.clone(),
            rate: 1.0,
            as_of: Utc::now(),
        });
        return;
    }
    let client = Arc::clone(client);
    let pair = pair.clone();
    load(tasks, rate, async move { client.fetch_rate(&pair).await });
}

impl DashboardController {
    /// Creates the screen and starts its initial fetches and refresh timer.
    /// Must be called from within a tokio runtime.
    pub fn mount(client: Arc<dyn MarketDataClient>, config: &DashboardConfig) -> Self {
        let scope = Scope::new();
        let mut controller = Self {
            client,
            pair: config.pair(),
            amount: config.amount,
            news_limit: config.news_limit,
            history_days: config.history_days,
            refresh_interval: config.refresh_interval(),
            rate: Source::new("rate", &scope, Some(RATE_FAILURE)),
            news: Source::new("news", &scope, Some(NEWS_FAILURE)),
            history: Source::new("history", &scope, Some(HISTORY_FAILURE)),
            scope,
            tasks: Arc::new(TaskSet::default()),
            refresh: None,
        };
        info!(pair = %controller.pair, "Dashboard mounted");
        controller.load_all();
        controller
    }

    fn load_all(&mut self) {
        load_rate(&self.client, &self.tasks, &self.rate, &self.pair);

        let client = Arc::clone(&self.client);
        let pair = self.pair.clone();
        let limit = self.news_limit;
        load(&self.tasks, &self.news, async move {
            client.fetch_news(&pair, limit).await
        });

        if !self.pair.is_identity() {
            let client = Arc::clone(&self.client);
            let pair = self.pair.clone();
            let days = self.history_days;
            load(&self.tasks, &self.history, async move {
                client.fetch_history(&pair, days).await
            });
        }

        self.restart_refresh();
    }

    fn restart_refresh(&mut self) {
        if let Some(task) = self.refresh.take() {
            task.cancel();
        }
        if self.pair.is_identity() || !self.scope.is_mounted() {
            return;
        }
        let client = Arc::clone(&self.client);
        let tasks = Arc::clone(&self.tasks);
        let rate = Arc::clone(&self.rate);
        let pair = self.pair.clone();
        self.refresh = Some(RefreshTask::spawn(self.refresh_interval, move || {
            load_rate(&client, &tasks, &rate, &pair)
        }));
    }

    fn on_pair_changed(&mut self, previous: CurrencyPair) {
        if self.pair == previous || !self.scope.is_mounted() {
            return;
        }
        debug!(from = %previous, to = %self.pair, "Pair changed");
        self.rate.reset();
        self.news.reset();
        self.history.reset();
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

    pub fn pair(&self) -> &CurrencyPair {
        &self.pair
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn set_amount(&mut self, amount: f64) {
        self.amount = if amount.is_finite() { amount } else { 0.0 };
    }

    /// Text that does not parse as a number counts as zero.
    pub fn set_amount_input(&mut self, raw: &str) {
        self.set_amount(raw.trim().parse().unwrap_or(0.0));
    }

    /// Fetches the rate now without waiting for the next tick.
    pub fn refresh_rate(&self) {
        load_rate(&self.client, &self.tasks, &self.rate, &self.pair);
    }

    pub fn rate(&self) -> SourceState<RateQuote> {
        self.rate.snapshot()
    }

    pub fn news(&self) -> SourceState<Vec<NewsItem>> {
        self.news.snapshot()
    }

    pub fn news_panel(&self) -> Panel<Vec<NewsItem>> {
        self.news.snapshot().into_panel().empty_if(Vec::is_empty)
    }

    pub fn history(&self) -> SourceState<Vec<RatePoint>> {
        self.history.snapshot()
    }

    /// Rate history for the chart. Stays `Idle` for identity pairs.
    pub fn history_panel(&self) -> Panel<Vec<RatePoint>> {
        self.history.snapshot().into_panel().empty_if(Vec::is_empty)
    }

    pub fn history_range(&self) -> Option<RateRange> {
        RateRange::of(self.history.snapshot().data.as_deref()?)
    }

    /// The converted amount, available as long as a quote for the current pair
    /// is held, even while a refresh is failing.
    pub fn conversion(&self) -> Option<Conversion> {
        let quote = self.rate.snapshot().data?;
        if quote.pair != self.pair {
            return None;
        }
        Some(Conversion {
            pair: quote.pair,
            amount: self.amount,
            rate: quote.rate,
            converted: self.amount * quote.rate,
            as_of: quote.as_of,
        })
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

    /// Waits for every fetch started so far.
    pub async fn settle(&self) {
        self.tasks.settle().await;
    }

    /// Tears the screen down. Results still in flight are discarded.
    pub fn unmount(&mut self) {
        if !self.scope.is_mounted() {
            return;
        }
        self.scope.close();
        if let Some(task) = self.refresh.take() {
            task.cancel();
        }
        info!(pair = %self.pair, "Dashboard unmounted");
    }
}

impl Drop for DashboardController {
    fn drop(&mut self) {
        self.unmount();
    }
}
