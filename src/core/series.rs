//! Shapes prediction results into chart-ready sequences.
use crate::core::market::PredictionPoint;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesOrigin {
    Historical,
    Forecast,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub mean: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub origin: SeriesOrigin,
}

impl ChartPoint {
    fn tagged(point: &PredictionPoint, origin: SeriesOrigin) -> Self {
        Self {
            timestamp: point.timestamp,
            mean: point.mean,
            lower_bound: point.lower_bound,
            upper_bound: point.upper_bound,
            origin,
        }
    }

    pub fn is_historical(&self) -> bool {
        self.origin == SeriesOrigin::Historical
    }
}

/// One row of the prediction rate card.
#[derive(Debug, Clone, PartialEq)]
pub struct RateCardRow {
    pub date: String,
    pub high: f64,
    pub mean: f64,
    pub low: f64,
    pub historical: bool,
}

/// Merges backtest and forecast points into one chronological sequence.
///
/// With `show_historical` off the backtest is dropped entirely. Points sharing a
/// timestamp keep their relative order, historical first.
pub fn merge_series(
    forecast: &[PredictionPoint],
    historical: Option<&[PredictionPoint]>,
    show_historical: bool,
) -> Vec<ChartPoint> {
    let kept = if show_historical {
        historical.unwrap_or_default()
    } else {
        &[]
    };

    let mut merged: Vec<ChartPoint> = kept
        .iter()
        .map(|p| ChartPoint::tagged(p, SeriesOrigin::Historical))
        .chain(
            forecast
                .iter()
                .map(|p| ChartPoint::tagged(p, SeriesOrigin::Forecast)),
        )
        .collect();

    // sort_by_key is stable
    merged.sort_by_key(|p| p.timestamp);
    merged
}

pub fn rate_card_rows(points: &[ChartPoint]) -> Vec<RateCardRow> {
    points
        .iter()
        .map(|p| RateCardRow {
            date: p.timestamp.format("%d/%m/%Y").to_string(),
            high: p.upper_bound,
            mean: p.mean,
            low: p.lower_bound,
            historical: p.is_historical(),
        })
        .collect()
}
