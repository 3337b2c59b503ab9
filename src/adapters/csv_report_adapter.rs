//! Closed-trade log as CSV.

use crate::domain::backtest::BacktestResult;
use crate::domain::config::StrategyConfig;
use crate::domain::error::PairtraderError;
use crate::domain::position::ClosedTrade;
use crate::ports::report_port::ReportPort;
use std::fs::File;
use std::io::{BufWriter, Write};

pub const TRADE_LOG_HEADER: [&str; 8] = [
    "entry_date",
    "exit_date",
    "direction",
    "entry_price",
    "exit_price",
    "size",
    "exit_reason",
    "net_pl",
];

/// Writes `trades` in the order given.
pub fn write_trade_log<W: Write>(writer: W, trades: &[ClosedTrade]) -> Result<(), PairtraderError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(TRADE_LOG_HEADER)?;
    for t in trades {
        wtr.write_record([
            t.entry_date.format("%Y-%m-%d").to_string(),
            t.exit_date.format("%Y-%m-%d").to_string(),
            t.direction.to_string(),
            t.entry_price.to_string(),
            t.exit_price.to_string(),
            t.size.to_string(),
            t.exit_reason.to_string(),
            t.net_pnl.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        config: &StrategyConfig,
        output_path: &str,
    ) -> Result<(), PairtraderError> {
        let file = File::create(output_path)?;
        write_trade_log(BufWriter::new(file), &result.trades)?;
        tracing::info!(
            pair = %format!("{}/{}", config.etf, config.stock),
            trades = result.trades.len(),
            path = output_path,
            "trade log written"
        );
        Ok(())
    }
}
