//! Rate alerts kept in the local store next to the session.
//!
//! An alert remembers the rate it was set against, so a threshold above that
//! rate fires when the rate climbs to it and one below fires when it falls.

use crate::core::currency::CurrencyPair;
use crate::core::market::RateQuote;
use crate::store::KeyValueStore;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const ALERTS_KEY: &str = "alerts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertDirection {
    Above,
    Below,
}

impl AlertDirection {
    pub fn relative_to(threshold: f64, current_rate: f64) -> Self {
        if threshold >= current_rate {
            AlertDirection::Above
        } else {
            AlertDirection::Below
        }
    }
}

impl Display for AlertDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AlertDirection::Above => "above",
            AlertDirection::Below => "below",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateAlert {
    pub pair: CurrencyPair,
    pub threshold: f64,
    pub direction: AlertDirection,
    pub set_at_rate: f64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl RateAlert {
    pub fn is_triggered_by(&self, quote: &RateQuote) -> bool {
        if quote.pair != self.pair {
            return false;
        }
        match self.direction {
            AlertDirection::Above => quote.rate >= self.threshold,
            AlertDirection::Below => quote.rate <= self.threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlertError {
    #[error("Alert threshold must be a positive number")]
    InvalidThreshold,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Alerts need two different currencies")]
    IdentityPair,
    #[error("No alert number {0}")]
    NotFound(usize),
}

pub struct AlertBook {
    store: Arc<dyn KeyValueStore>,
    alerts: Vec<RateAlert>,
}

impl AlertBook {
    /// Reads the stored alerts. An unreadable record counts as no alerts.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let stored = store
            .get(ALERTS_KEY)
            .await
            .context("Failed to read rate alerts")?;

        let alerts = match stored {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Ignoring malformed alert record");
                Vec::new()
            }),
            None => Vec::new(),
        };
        debug!(count = alerts.len(), "Alerts loaded");
        Ok(Self { store, alerts })
    }

    pub fn alerts(&self) -> &[RateAlert] {
        &self.alerts
    }

    /// Adds an alert for the quote's pair, pointing away from the quoted rate.
    pub async fn subscribe(
        &mut self,
        quote: &RateQuote,
        threshold: f64,
        email: &str,
    ) -> Result<RateAlert> {
        if quote.pair.is_identity() {
            return Err(AlertError::IdentityPair.into());
        }
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(AlertError::InvalidThreshold.into());
        }
        let email = email.trim();
        if !is_plausible_email(email) {
            return Err(AlertError::InvalidEmail.into());
        }

        let alert = RateAlert {
            pair: quote.pair.clone(),
            threshold,
            direction: AlertDirection::relative_to(threshold, quote.rate),
            set_at_rate: quote.rate,
            email: email.to_string(),
            created_at: Utc::now(),
        };
        self.alerts.push(alert.clone());
        self.save().await?;
        info!(pair = %alert.pair, threshold, direction = %alert.direction, "Alert added");
        Ok(alert)
    }

    /// Removes the alert at the 1-based position shown by `alerts list`.
    pub async fn remove(&mut self, number: usize) -> Result<RateAlert> {
        if number == 0 || number > self.alerts.len() {
            return Err(AlertError::NotFound(number).into());
        }
        let removed = self.alerts.remove(number - 1);
        self.save().await?;
        info!(pair = %removed.pair, threshold = removed.threshold, "Alert removed");
        Ok(removed)
    }

    pub fn triggered(&self, quote: &RateQuote) -> Vec<&RateAlert> {
        self.alerts
            .iter()
            .filter(|a| a.is_triggered_by(quote))
            .collect()
    }

    async fn save(&self) -> Result<()> {
        let raw = serde_json::to_string(&self.alerts)?;
        self.store
            .put(ALERTS_KEY, &raw)
            .await
            .context("Failed to persist rate alerts")
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((user, domain)) => !user.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn quote(base: &str, target: &str, rate: f64) -> RateQuote {
        RateQuote {
            pair: CurrencyPair::new(base.parse().unwrap(), target.parse().unwrap()),
            rate,
            as_of: Utc::now(),
        }
    }

    #[test]
    fn test_direction_follows_current_rate() {
        assert_eq!(AlertDirection::relative_to(1.6, 1.5), AlertDirection::Above);
        assert_eq!(AlertDirection::relative_to(1.4, 1.5), AlertDirection::Below);
    }

    #[tokio::test]
    async fn test_subscribe_and_trigger() {
        let store = Arc::new(MemoryStore::new());
        let mut book = AlertBook::load(store.clone()).await.unwrap();

        book.subscribe(&quote("USD", "AUD", 1.5), 1.6, "ada@example.com")
            .await
            .unwrap();
        book.subscribe(&quote("USD", "AUD", 1.5), 1.4, "ada@example.com")
            .await
            .unwrap();

        assert!(book.triggered(&quote("USD", "AUD", 1.55)).is_empty());
        let high = book.triggered(&quote("USD", "AUD", 1.61));
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].direction, AlertDirection::Above);
        let low = book.triggered(&quote("USD", "AUD", 1.4));
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].threshold, 1.4);
        assert!(book.triggered(&quote("AUD", "USD", 1.7)).is_empty());

        let reloaded = AlertBook::load(store).await.unwrap();
        assert_eq!(reloaded.alerts(), book.alerts());
    }

    #[tokio::test]
    async fn test_subscribe_validation() {
        let mut book = AlertBook::load(Arc::new(MemoryStore::new())).await.unwrap();
        let usd_aud = quote("USD", "AUD", 1.5);

        let err = book.subscribe(&usd_aud, 0.0, "ada@example.com").await.unwrap_err();
        assert_eq!(err.downcast_ref::<AlertError>(), Some(&AlertError::InvalidThreshold));
        let err = book.subscribe(&usd_aud, 1.6, "not-an-email").await.unwrap_err();
        assert_eq!(err.downcast_ref::<AlertError>(), Some(&AlertError::InvalidEmail));
        let err = book
            .subscribe(&quote("EUR", "EUR", 1.0), 1.1, "ada@example.com")
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<AlertError>(), Some(&AlertError::IdentityPair));
        assert!(book.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_remove_by_number() {
        let store = Arc::new(MemoryStore::new());
        let mut book = AlertBook::load(store.clone()).await.unwrap();
        book.subscribe(&quote("USD", "AUD", 1.5), 1.6, "ada@example.com")
            .await
            .unwrap();
        book.subscribe(&quote("USD", "JPY", 150.0), 140.0, "ada@example.com")
            .await
            .unwrap();

        let err = book.remove(3).await.unwrap_err();
        assert_eq!(err.downcast_ref::<AlertError>(), Some(&AlertError::NotFound(3)));
        let removed = book.remove(1).await.unwrap();
        assert_eq!(removed.threshold, 1.6);

        let reloaded = AlertBook::load(store).await.unwrap();
        assert_eq!(reloaded.alerts().len(), 1);
        assert_eq!(reloaded.alerts()[0].pair.to_string(), "USD/JPY");
    }

    #[tokio::test]
    async fn test_malformed_record_is_ignored() {
        let store = Arc::new(MemoryStore::new());
        store.put(ALERTS_KEY, "[{").await.unwrap();
        let book = AlertBook::load(store).await.unwrap();
        assert!(book.alerts().is_empty());
    }
}
