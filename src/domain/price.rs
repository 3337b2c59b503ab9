//! Daily price observations for one instrument.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::error::PairtraderError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
    /// Shares traded that day; zero means unavailable.
    pub volume: i64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64, volume: i64) -> Self {
        PricePoint {
            date,
            close,
            volume,
        }
    }
}

/// Immutable, strictly date-ordered price history with O(1) date lookup.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub symbol: String,
    points: Vec<PricePoint>,
    date_index: HashMap<NaiveDate, usize>,
}

impl PriceSeries {
    /// Builds a series, rejecting duplicate or out-of-order dates and
    /// non-positive closes (their logarithm is undefined).
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, PairtraderError> {
        let symbol = symbol.into();
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(PairtraderError::InvalidSeries {
                    reason: format!(
                        "{symbol}: dates must be strictly increasing ({} followed by {})",
                        pair[0].date, pair[1].date
                    ),
                });
            }
        }
        if let Some(bad) = points.iter().find(|p| !(p.close.is_finite() && p.close > 0.0)) {
            return Err(PairtraderError::InvalidSeries {
                reason: format!("{symbol}: non-positive close {} on {}", bad.close, bad.date),
            });
        }

        let date_index = points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.date, i))
            .collect();
        Ok(PriceSeries {
            symbol,
            points,
            date_index,
        })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&PricePoint> {
        self.date_index.get(&date).map(|&i| &self.points[i])
    }

    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.get(date).map(|p| p.close)
    }
}
