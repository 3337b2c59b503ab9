//! Rolling-window OLS hedge ratio.
//!
//! For aligned observation i >= window, beta[i] is the slope of the regression
//! (with intercept) of stock returns on ETF returns over observations
//! [i - window, i). The observation at i itself is never in its own window.

use chrono::NaiveDate;

use super::error::PairtraderError;
use super::series::DatedSeries;

#[derive(Debug, Clone, Default)]
pub struct BetaEstimate {
    pub betas: DatedSeries,
    /// Dates left undefined because the regressor window had zero variance.
    pub degenerate_dates: Vec<NaiveDate>,
}

/// Slope of y on x with intercept.
pub fn ols_slope(x: &[f64], y: &[f64], date: NaiveDate) -> Result<f64, PairtraderError> {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        sxx += dx * dx;
        sxy += dx * (yi - mean_y);
    }

    let scale: f64 = x.iter().map(|v| v * v).sum();
    if !(sxx > f64::EPSILON * scale) {
        return Err(PairtraderError::DegenerateRegression {
            date,
            window: x.len(),
        });
    }
    Ok(sxy / sxx)
}

/// Pairs the two return series on their common dates.
pub fn align(etf: &DatedSeries, stock: &DatedSeries) -> Vec<(NaiveDate, f64, f64)> {
    etf.iter()
        .filter_map(|(date, x)| stock.get(date).map(|y| (date, x, y)))
        .collect()
}

pub fn estimate_dynamic_beta(
    etf_returns: &DatedSeries,
    stock_returns: &DatedSeries,
    window: usize,
) -> BetaEstimate {
    let aligned = align(etf_returns, stock_returns);
    let xs: Vec<f64> = aligned.iter().map(|(_, x, _)| *x).collect();
    let ys: Vec<f64> = aligned.iter().map(|(_, _, y)| *y).collect();

    let mut estimate = BetaEstimate {
        betas: DatedSeries::with_capacity(aligned.len().saturating_sub(window)),
        degenerate_dates: Vec::new(),
    };

    for i in window..aligned.len() {
        let date = aligned[i].0;
        match ols_slope(&xs[i - window..i], &ys[i - window..i], date) {
            Ok(beta) => estimate.betas.push(date, beta),
            Err(e) => {
                tracing::warn!(%date, error = %e, "beta undefined");
                estimate.degenerate_dates.push(date);
            }
        }
    }

    tracing::debug!(
        window,
        defined = estimate.betas.len(),
        degenerate = estimate.degenerate_dates.len(),
        "dynamic beta estimated"
    );
    estimate
}
