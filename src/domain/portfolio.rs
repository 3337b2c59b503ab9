//! Position lifecycle: sizing, exposure-capped entry, exit monitoring.

use chrono::NaiveDate;

use super::config::{StrategyConfig, TRADING_DAYS_PER_YEAR};
use super::error::PairtraderError;
use super::execution::ExecutionModel;
use super::position::{
    ClosedTrade, Direction, ExitConditions, Position, PositionId, PositionStatus,
};

/// size = (f_risk * C_total) / (vol * sqrt(T_max / 252)).
///
/// Volatility below the configured floor is raised to the floor; a missing,
/// zero, negative or non-finite volatility is `UndefinedVolatility`.
pub fn position_size(
    config: &StrategyConfig,
    volatility: Option<f64>,
    date: NaiveDate,
) -> Result<f64, PairtraderError> {
    let vol = match volatility {
        Some(v) if v > 0.0 && v.is_finite() => v.max(config.volatility_floor),
        _ => return Err(PairtraderError::UndefinedVolatility { date }),
    };
    let horizon = (config.max_holding_days as f64 / TRADING_DAYS_PER_YEAR).sqrt();
    Ok(config.risk_fraction * config.total_capital / (vol * horizon))
}

/// Market inputs for one candidate entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryRequest {
    pub date: NaiveDate,
    pub step: usize,
    pub direction: Direction,
    pub price: f64,
    pub volume: i64,
    /// Rolling standard deviation of z ending at `date`, if defined.
    pub volatility: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpenOutcome {
    Opened(PositionId),
    Rejected {
        open_exposure: f64,
        candidate: f64,
        cap: f64,
    },
    NonPositiveSize {
        size: f64,
    },
}

/// Owns every position of one simulation. Positions live in an arena indexed
/// by their sequence number, so iteration order is id order.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionManager {
    positions: Vec<Position>,
}

impl Default for PositionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionManager {
    pub fn new() -> Self {
        PositionManager {
            positions: Vec::new(),
        }
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn get(&self, id: PositionId) -> Option<&Position> {
        self.positions.get(id.seq).filter(|p| p.id == id)
    }

    pub fn open_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter().filter(|p| p.is_open())
    }

    pub fn has_open(&self) -> bool {
        self.positions.iter().any(Position::is_open)
    }

    /// Sum of `size` over Open positions.
    pub fn open_exposure(&self) -> f64 {
        self.open_positions().map(|p| p.size).sum()
    }

    /// Sizes, fills, checks the exposure cap and opens, as one step.
    ///
    /// Nothing is mutated unless the result is `Ok(OpenOutcome::Opened)`.
    pub fn try_open(
        &mut self,
        config: &StrategyConfig,
        execution: &ExecutionModel,
        request: EntryRequest,
    ) -> Result<OpenOutcome, PairtraderError> {
        let size = position_size(config, request.volatility, request.date)?;
        if !(size > 0.0 && size.is_finite()) {
            return Ok(OpenOutcome::NonPositiveSize { size });
        }

        let entry_price = execution.fill_price(
            request.direction.entry_side(),
            request.price,
            request.volume,
            request.date,
        )?;

        let open_exposure = self.open_exposure();
        let cap = config.exposure_cap();
        if open_exposure + size > cap {
            return Ok(OpenOutcome::Rejected {
                open_exposure,
                candidate: size,
                cap,
            });
        }

        let id = PositionId {
            entry_date: request.date,
            seq: self.positions.len(),
        };
        self.positions.push(Position {
            id,
            direction: request.direction,
            entry_price,
            size,
            entry_step: request.step,
            exit_conditions: ExitConditions::snapshot(config),
            status: PositionStatus::Open,
        });
        tracing::info!(
            date = %request.date,
            direction = %request.direction,
            entry_price,
            size,
            "position opened"
        );
        Ok(OpenOutcome::Opened(id))
    }

    /// Evaluates the exit rules of every Open position against today's close
    /// and z, closing those that trigger. Returns the trades closed today in
    /// id order.
    ///
    /// Exits are filled at the raw close with no slippage; the execution
    /// model prices entry fills only.
    pub fn monitor(
        &mut self,
        date: NaiveDate,
        step: usize,
        price: f64,
        z: f64,
        transaction_cost: f64,
    ) -> Vec<ClosedTrade> {
        let mut closed = Vec::new();
        for position in self.positions.iter_mut().filter(|p| p.is_open()) {
            let pnl = position.unrealized_pnl(price);
            let days_held = position.days_held(step);
            let Some(reason) = position.exit_conditions.evaluate(days_held, pnl, z) else {
                continue;
            };
            position.status = PositionStatus::Closed {
                exit_date: date,
                exit_price: price,
                net_pnl: pnl - transaction_cost,
                reason,
            };
            tracing::info!(
                %date,
                entry_date = %position.entry_date(),
                %reason,
                days_held,
                net_pnl = pnl - transaction_cost,
                "position closed"
            );
            if let Some(trade) = position.closed_trade() {
                closed.push(trade);
            }
        }
        closed
    }
}
