//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::config::StrategyConfig;
use crate::domain::error::PairtraderError;

/// Port for writing backtest reports. Implementations consume only the
/// closed-trade records of the result.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        config: &StrategyConfig,
        output_path: &str,
    ) -> Result<(), PairtraderError>;
}
