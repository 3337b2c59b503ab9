//! Backtest engine and event loop.
//!
//! Derived series are computed once up front ([`prepare_signals`]); the
//! simulation then walks the stock's trading dates across the span of z,
//! strictly in order.
//! On each date the entry decision runs first, then exit monitoring of every
//! Open position.

use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fmt;

use super::beta::{estimate_dynamic_beta, BetaEstimate};
use super::config::StrategyConfig;
use super::error::PairtraderError;
use super::execution::ExecutionModel;
use super::garch::GarchFitter;
use super::portfolio::{EntryRequest, OpenOutcome, PositionManager};
use super::position::{ClosedTrade, Direction, Position};
use super::price::PriceSeries;
use super::residuals::{raw_residuals, standardize, StandardizedResiduals};
use super::returns::log_returns;
use super::rolling::rolling_std;
use super::series::DatedSeries;
use super::signal::{generate_signal, Signal};

/// Date range requested from the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    MissingVolume,
    MissingPrice,
    UndefinedVolatility,
    ExposureRejected,
    NonPositiveSize,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingVolume => write!(f, "MissingVolume"),
            SkipReason::MissingPrice => write!(f, "MissingPrice"),
            SkipReason::UndefinedVolatility => write!(f, "UndefinedVolatility"),
            SkipReason::ExposureRejected => write!(f, "ExposureRejected"),
            SkipReason::NonPositiveSize => write!(f, "NonPositiveSize"),
        }
    }
}

/// An entry signal that did not become a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedEntry {
    pub date: NaiveDate,
    pub direction: Direction,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    /// Closed trades in close order.
    pub trades: Vec<ClosedTrade>,
    /// Positions still Open when the data ran out.
    pub open_positions: Vec<Position>,
    pub skipped: Vec<SkippedEntry>,
    pub degenerate_dates: Vec<NaiveDate>,
    /// Number of simulated dates.
    pub steps: usize,
}

/// Everything the simulation reads, computed before it starts.
#[derive(Debug, Clone)]
pub struct SignalSeries {
    pub etf_returns: DatedSeries,
    pub stock_returns: DatedSeries,
    pub beta: BetaEstimate,
    pub residuals: StandardizedResiduals,
}

impl SignalSeries {
    pub fn z(&self) -> &DatedSeries {
        &self.residuals.z
    }
}

/// prices -> returns -> betas -> standardized residuals.
pub fn prepare_signals(
    etf: &PriceSeries,
    stock: &PriceSeries,
    config: &StrategyConfig,
    fitter: &GarchFitter,
) -> Result<SignalSeries, PairtraderError> {
    let etf_returns = log_returns(etf)?;
    let stock_returns = log_returns(stock)?;
    let beta = estimate_dynamic_beta(&etf_returns, &stock_returns, config.beta_window);
    let raw = raw_residuals(&etf_returns, &stock_returns, &beta.betas);
    let residuals = standardize(&raw, config.residual_window, fitter)?;

    tracing::debug!(
        returns = stock_returns.len(),
        betas = beta.betas.len(),
        residuals = residuals.raw.len(),
        z = residuals.z.len(),
        "signal series prepared"
    );
    Ok(SignalSeries {
        etf_returns,
        stock_returns,
        beta,
        residuals,
    })
}

/// Mutable state of one simulation instance, advanced one date at a time.
struct SimulationContext<'a> {
    config: &'a StrategyConfig,
    execution: ExecutionModel,
    stock: &'a PriceSeries,
    z_volatility: DatedSeries,
    positions: PositionManager,
    trades: Vec<ClosedTrade>,
    skipped: Vec<SkippedEntry>,
    steps: usize,
}

impl<'a> SimulationContext<'a> {
    fn new(config: &'a StrategyConfig, stock: &'a PriceSeries, z: &DatedSeries) -> Self {
        SimulationContext {
            config,
            execution: ExecutionModel::new(config.slippage_k),
            stock,
            z_volatility: rolling_std(z, config.residual_window),
            positions: PositionManager::new(),
            trades: Vec::new(),
            skipped: Vec::new(),
            steps: 0,
        }
    }

    fn step(
        &mut self,
        step: usize,
        date: NaiveDate,
        z: Option<f64>,
    ) -> Result<(), PairtraderError> {
        self.steps += 1;
        let point = self.stock.get(date).copied();
        let (Some(point), Some(z)) = (point, z) else {
            if self.positions.has_open() {
                let missing = match point {
                    None => format!("{} close", self.stock.symbol),
                    Some(_) => "standardized residual".to_string(),
                };
                return Err(PairtraderError::DataConsistency {
                    date,
                    reason: format!("no {missing} for an open position"),
                });
            }
            if let (None, Some(z)) = (point, z) {
                if let Signal::Enter(direction) =
                    generate_signal(z, false, self.config.entry_threshold)
                {
                    self.skip(date, direction, SkipReason::MissingPrice);
                }
            }
            return Ok(());
        };

        let signal = generate_signal(z, self.positions.has_open(), self.config.entry_threshold);
        if let Signal::Enter(direction) = signal {
            let request = EntryRequest {
                date,
                step,
                direction,
                price: point.close,
                volume: point.volume,
                volatility: self.z_volatility.get(date),
            };
            match self.positions.try_open(self.config, &self.execution, request) {
                Ok(OpenOutcome::Opened(_)) => {}
                Ok(OpenOutcome::Rejected {
                    open_exposure,
                    candidate,
                    cap,
                }) => {
                    tracing::debug!(%date, open_exposure, candidate, cap, "entry exceeds exposure cap");
                    self.skip(date, direction, SkipReason::ExposureRejected);
                }
                Ok(OpenOutcome::NonPositiveSize { size }) => {
                    tracing::debug!(%date, size, "entry size not positive");
                    self.skip(date, direction, SkipReason::NonPositiveSize);
                }
                Err(PairtraderError::MissingVolume { .. }) => {
                    self.skip(date, direction, SkipReason::MissingVolume);
                }
                Err(PairtraderError::UndefinedVolatility { .. }) => {
                    self.skip(date, direction, SkipReason::UndefinedVolatility);
                }
                Err(e) => return Err(e),
            }
        }

        let closed = self.positions.monitor(
            date,
            step,
            point.close,
            z,
            self.config.transaction_cost,
        );
        self.trades.extend(closed);
        Ok(())
    }

    fn skip(&mut self, date: NaiveDate, direction: Direction, reason: SkipReason) {
        tracing::warn!(%date, %direction, %reason, "entry skipped");
        self.skipped.push(SkippedEntry {
            date,
            direction,
            reason,
        });
    }

    fn finish(self) -> BacktestResult {
        BacktestResult {
            trades: self.trades,
            open_positions: self.positions.open_positions().cloned().collect(),
            skipped: self.skipped,
            degenerate_dates: Vec::new(),
            steps: self.steps,
        }
    }
}

/// Simulation dates: every stock trading date and every z date between the
/// first and last z date.
fn timeline(stock: &PriceSeries, z: &DatedSeries) -> Vec<NaiveDate> {
    let (Some(first), Some(last)) = (z.first_date(), z.last_date()) else {
        return Vec::new();
    };
    let dates: BTreeSet<NaiveDate> = stock
        .points()
        .iter()
        .map(|p| p.date)
        .filter(|d| (first..=last).contains(d))
        .chain(z.dates())
        .collect();
    dates.into_iter().collect()
}

/// Runs the trading loop over a precomputed z series.
///
/// A date without z opens nothing. With a position Open it is a
/// `DataConsistency` error, as is a date without a stock close.
pub fn simulate(
    stock: &PriceSeries,
    z: &DatedSeries,
    config: &StrategyConfig,
) -> Result<BacktestResult, PairtraderError> {
    if z.is_empty() {
        tracing::warn!(symbol = %stock.symbol, "no standardized residuals, nothing to simulate");
    }
    let mut ctx = SimulationContext::new(config, stock, z);
    for (step, date) in timeline(stock, z).into_iter().enumerate() {
        ctx.step(step, date, z.get(date))?;
    }
    Ok(ctx.finish())
}

pub fn run_backtest(
    etf: &PriceSeries,
    stock: &PriceSeries,
    config: &StrategyConfig,
) -> Result<BacktestResult, PairtraderError> {
    run_backtest_with(etf, stock, config, &GarchFitter::default())
}

pub fn run_backtest_with(
    etf: &PriceSeries,
    stock: &PriceSeries,
    config: &StrategyConfig,
    fitter: &GarchFitter,
) -> Result<BacktestResult, PairtraderError> {
    config.validate()?;
    let signals = prepare_signals(etf, stock, config, fitter)?;
    let mut result = simulate(stock, signals.z(), config)?;
    result.degenerate_dates = signals.beta.degenerate_dates;

    tracing::info!(
        etf = %etf.symbol,
        stock = %stock.symbol,
        steps = result.steps,
        trades = result.trades.len(),
        open = result.open_positions.len(),
        skipped = result.skipped.len(),
        "backtest complete"
    );
    Ok(result)
}

/// One independent pair/config run.
#[derive(Debug, Clone)]
pub struct BacktestJob {
    pub name: String,
    pub etf: PriceSeries,
    pub stock: PriceSeries,
    pub config: StrategyConfig,
}

/// Runs every job on the rayon pool. Results come back in job order.
pub fn run_batch(jobs: &[BacktestJob]) -> Vec<Result<BacktestResult, PairtraderError>> {
    jobs.par_iter()
        .map(|job| {
            let _span = tracing::info_span!("job", name = %job.name).entered();
            run_backtest(&job.etf, &job.stock, &job.config)
        })
        .collect()
}
