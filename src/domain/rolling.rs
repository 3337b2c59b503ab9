//! Trailing-window statistics over a [`DatedSeries`].
//!
//! The window ending at observation i covers [i + 1 - period, i], so the
//! current observation is included. The first (period - 1) observations have
//! no value and are absent from the output rather than zero-filled.

use super::series::DatedSeries;

/// Arithmetic mean over `period` observations.
pub fn rolling_mean(series: &DatedSeries, period: usize) -> DatedSeries {
    rolling(series, period, |window| {
        window.iter().sum::<f64>() / window.len() as f64
    })
}

/// Sample standard deviation (n - 1 denominator) over `period` observations.
pub fn rolling_std(series: &DatedSeries, period: usize) -> DatedSeries {
    if period < 2 {
        return DatedSeries::new();
    }
    rolling(series, period, |window| {
        let n = window.len() as f64;
        let mean = window.iter().sum::<f64>() / n;
        let ss: f64 = window
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum();
        (ss / (n - 1.0)).sqrt()
    })
}

fn rolling<F>(series: &DatedSeries, period: usize, stat: F) -> DatedSeries
where
    F: Fn(&[f64]) -> f64,
{
    if period == 0 || series.len() < period {
        return DatedSeries::new();
    }

    let dates: Vec<_> = series.dates().collect();
    let values: Vec<f64> = series.values().collect();
    let mut out = DatedSeries::with_capacity(values.len() + 1 - period);
    for i in (period - 1)..values.len() {
        let start = i + 1 - period;
        out.push(dates[i], stat(&values[start..=i]));
    }
    out
}
