//! Log-return series.
//!
//! r[t] = ln(close[t]) - ln(close[t-1]), where t-1 is the previous observation
//! in the same series. Gaps in the calendar are not filled.

use super::error::{DateSpan, PairtraderError};
use super::price::PriceSeries;
use super::series::DatedSeries;

pub fn log_returns(prices: &PriceSeries) -> Result<DatedSeries, PairtraderError> {
    let points = prices.points();
    if points.len() < 2 {
        return Err(PairtraderError::InsufficientData {
            what: format!("{} returns", prices.symbol),
            observations: points.len(),
            minimum: 2,
            span: DateSpan::of(points.iter().map(|p| p.date)),
        });
    }

    let mut returns = DatedSeries::with_capacity(points.len() - 1);
    for pair in points.windows(2) {
        returns.push(pair[1].date, pair[1].close.ln() - pair[0].close.ln());
    }
    Ok(returns)
}
