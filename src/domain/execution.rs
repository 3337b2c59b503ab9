//! Fill simulation with size-dependent slippage.
//!
//! slippage = k * (price / volume)^1.5. Buys fill at price + slippage, sells at
//! price - slippage.

use chrono::NaiveDate;

use super::config::DEFAULT_SLIPPAGE_K;
use super::error::PairtraderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionModel {
    pub k: f64,
}

impl Default for ExecutionModel {
    fn default() -> Self {
        ExecutionModel {
            k: DEFAULT_SLIPPAGE_K,
        }
    }
}

impl ExecutionModel {
    pub fn new(k: f64) -> Self {
        ExecutionModel { k }
    }

    /// Slippage for trading at `price` on a day with `volume` shares traded.
    pub fn slippage(&self, price: f64, volume: i64, date: NaiveDate) -> Result<f64, PairtraderError> {
        if volume <= 0 {
            return Err(PairtraderError::MissingVolume { date });
        }
        Ok(self.k * (price / volume as f64).powf(1.5))
    }

    pub fn fill_price(
        &self,
        side: Side,
        price: f64,
        volume: i64,
        date: NaiveDate,
    ) -> Result<f64, PairtraderError> {
        let slippage = self.slippage(price, volume, date)?;
        Ok(match side {
            Side::Buy => price + slippage,
            Side::Sell => price - slippage,
        })
    }
}
