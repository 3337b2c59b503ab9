//! Price data acquisition port trait.

use crate::domain::error::PairtraderError;
use crate::domain::price::{PricePoint, PriceSeries};
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily observations for `symbol` within `[start_date, end_date]`,
    /// sorted by date. Missing days are gaps, never interpolated.
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, PairtraderError>;

    /// Fetches and validates into a [`PriceSeries`].
    fn load_series(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, PairtraderError> {
        let points = self.fetch_prices(symbol, start_date, end_date)?;
        PriceSeries::new(symbol, points)
    }
}
