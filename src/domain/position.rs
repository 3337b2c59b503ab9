//! Positions and closed-trade records.

use chrono::NaiveDate;
use std::fmt;

use super::config::StrategyConfig;
use super::execution::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Side of the order that opens a position in this direction.
    pub fn entry_side(self) -> Side {
        match self {
            Direction::Long => Side::Buy,
            Direction::Short => Side::Sell,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "Long"),
            Direction::Short => write!(f, "Short"),
        }
    }
}

/// Stable identity: entry date plus arena sequence index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionId {
    pub entry_date: NaiveDate,
    pub seq: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    TimeExit,
    StopLoss,
    ProfitTarget,
    ResidualExit,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::TimeExit => write!(f, "TimeExit"),
            ExitReason::StopLoss => write!(f, "StopLoss"),
            ExitReason::ProfitTarget => write!(f, "ProfitTarget"),
            ExitReason::ResidualExit => write!(f, "ResidualExit"),
        }
    }
}

/// Exit limits captured from the config when the position opens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitConditions {
    pub stop_loss: f64,
    pub profit_target: f64,
    pub max_days: usize,
    pub residual_threshold: f64,
}

impl ExitConditions {
    pub fn snapshot(config: &StrategyConfig) -> Self {
        ExitConditions {
            stop_loss: config.stop_loss(),
            profit_target: config.profit_target(),
            max_days: config.max_holding_days,
            residual_threshold: config.exit_threshold,
        }
    }

    /// First matching rule wins: time, stop-loss, profit target, residual.
    pub fn evaluate(&self, days_held: usize, unrealized_pnl: f64, z: f64) -> Option<ExitReason> {
        if days_held >= self.max_days {
            Some(ExitReason::TimeExit)
        } else if unrealized_pnl <= self.stop_loss {
            Some(ExitReason::StopLoss)
        } else if unrealized_pnl >= self.profit_target {
            Some(ExitReason::ProfitTarget)
        } else if z.abs() <= self.residual_threshold {
            Some(ExitReason::ResidualExit)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PositionStatus {
    Open,
    Closed {
        exit_date: NaiveDate,
        exit_price: f64,
        net_pnl: f64,
        reason: ExitReason,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub id: PositionId,
    pub direction: Direction,
    /// Post-slippage fill price.
    pub entry_price: f64,
    pub size: f64,
    /// Timeline step on which the position opened.
    pub entry_step: usize,
    pub exit_conditions: ExitConditions,
    pub status: PositionStatus,
}

impl Position {
    pub fn entry_date(&self) -> NaiveDate {
        self.id.entry_date
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, PositionStatus::Open)
    }

    /// Per-unit mark-to-market P&L at `price`.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self.direction {
            Direction::Long => price - self.entry_price,
            Direction::Short => self.entry_price - price,
        }
    }

    pub fn days_held(&self, step: usize) -> usize {
        step.saturating_sub(self.entry_step)
    }

    /// The trade-log record, once closed.
    pub fn closed_trade(&self) -> Option<ClosedTrade> {
        match self.status {
            PositionStatus::Open => None,
            PositionStatus::Closed {
                exit_date,
                exit_price,
                net_pnl,
                reason,
            } => Some(ClosedTrade {
                entry_date: self.entry_date(),
                exit_date,
                direction: self.direction,
                entry_price: self.entry_price,
                exit_price,
                size: self.size,
                exit_reason: reason,
                net_pnl,
            }),
        }
    }
}

/// What the reporting side consumes; carries no reference to engine state.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: f64,
    pub exit_reason: ExitReason,
    pub net_pnl: f64,
}
