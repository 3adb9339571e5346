//! Core business logic abstractions

pub mod alerts;
pub mod catalog;
pub mod config;
pub mod currency;
pub mod error;
pub mod heatmap;
pub mod log;
pub mod market;
pub mod series;
pub mod session;

// Re-export main types for cleaner imports
pub use currency::{CurrencyCode, CurrencyPair};
pub use error::ApiError;
pub use market::{ForecastModel, MarketDataClient, PredictionOptions};
