#![allow(dead_code)]

use chrono::NaiveDate;
use pairtrader::domain::config::StrategyConfig;
use pairtrader::domain::error::PairtraderError;
pub use pairtrader::domain::price::{PricePoint, PriceSeries};
use pairtrader::domain::series::DatedSeries;
use pairtrader::ports::data_port::DataPort;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::path::Path;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_points(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(symbol.to_string(), points);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, PairtraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(PairtraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Trading day `i` of the synthetic calendar.
pub fn day(i: usize) -> NaiveDate {
    date(2020, 1, 1) + chrono::Duration::days(i as i64)
}

/// Deterministic standard normal draws (LCG + Box-Muller).
pub fn normals(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    let mut uniform = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 11) as f64 + 0.5) / (1u64 << 53) as f64
    };
    (0..n)
        .map(|_| {
            let u1 = uniform();
            let u2 = uniform();
            (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
        })
        .collect()
}

/// GARCH(1,1) innovations with the given parameters.
pub fn garch_noise(n: usize, seed: u64, omega: f64, alpha: f64, beta: f64) -> Vec<f64> {
    let mut sigma2 = omega / (1.0 - alpha - beta);
    normals(n, seed)
        .into_iter()
        .map(|z| {
            let e = sigma2.sqrt() * z;
            sigma2 = omega + alpha * e * e + beta * sigma2;
            e
        })
        .collect()
}

fn compound(symbol: &str, returns: &[f64], start_price: f64, volume: i64) -> PriceSeries {
    let mut price = start_price;
    let mut points = vec![PricePoint::new(day(0), price, volume)];
    for (i, r) in returns.iter().enumerate() {
        price *= r.exp();
        points.push(PricePoint::new(day(i + 1), price, volume));
    }
    PriceSeries::new(symbol, points).unwrap()
}

/// `n` daily prices for an ETF and a stock whose log returns satisfy
/// stock = beta * etf + GARCH noise.
pub fn synthetic_pair(n: usize, beta: f64, seed: u64) -> (PriceSeries, PriceSeries) {
    synthetic_pair_with_shock(n, beta, seed, &[])
}

/// Like [`synthetic_pair`], with `shock` added to the stock's log return on
/// each listed day.
pub fn synthetic_pair_with_shock(
    n: usize,
    beta: f64,
    seed: u64,
    shocks: &[(usize, f64)],
) -> (PriceSeries, PriceSeries) {
    let etf_returns: Vec<f64> = normals(n - 1, seed).iter().map(|z| 0.01 * z).collect();
    let mut noise = garch_noise(n - 1, seed.wrapping_add(1), 1e-6, 0.1, 0.85);
    for &(at, shock) in shocks {
        noise[at - 1] += shock;
    }
    let stock_returns: Vec<f64> = etf_returns
        .iter()
        .zip(&noise)
        .map(|(r, e)| beta * r + e)
        .collect();
    (
        compound("XLK", &etf_returns, 150.0, 5_000_000),
        compound("MSFT", &stock_returns, 300.0, 2_000_000),
    )
}

pub fn flat_series(symbol: &str, n: usize, close: f64, volume: i64) -> PriceSeries {
    let points = (0..n).map(|i| PricePoint::new(day(i), close, volume)).collect();
    PriceSeries::new(symbol, points).unwrap()
}

/// z alternating +1/-1 on days `0..n`, with `overrides` applied.
pub fn alternating_z(n: usize, overrides: &[(usize, f64)]) -> DatedSeries {
    (0..n)
        .map(|i| {
            let base = if i % 2 == 0 { 1.0 } else { -1.0 };
            let value = overrides
                .iter()
                .find(|(at, _)| *at == i)
                .map_or(base, |(_, v)| *v);
            (day(i), value)
        })
        .collect()
}

pub fn sample_strategy() -> StrategyConfig {
    StrategyConfig::new("XLK", "MSFT", 1_000_000.0, 2.0, 0.5, 60, 20, 21, 0.02, 0.2, 0.001)
}

/// Writes `<dir>/<symbol>.csv` in the layout the CSV adapter reads.
pub fn write_price_csv(dir: &Path, series: &PriceSeries) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for p in series.points() {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            p.date.format("%Y-%m-%d"),
            p.close,
            p.close,
            p.close,
            p.close,
            p.volume
        ));
    }
    std::fs::write(dir.join(format!("{}.csv", series.symbol)), content).unwrap();
}
