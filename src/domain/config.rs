//! Strategy parameters for one ETF/stock pair.

use super::error::PairtraderError;

/// Trading days per year used to scale the holding horizon in sizing.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

pub const DEFAULT_EXPOSURE_CAP: f64 = 0.3;
pub const DEFAULT_STOP_LOSS: f64 = 0.02;
pub const DEFAULT_PROFIT_TARGET: f64 = 0.03;
pub const DEFAULT_SLIPPAGE_K: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub etf: String,
    pub stock: String,
    /// C_total
    pub total_capital: f64,
    pub entry_threshold: f64,
    pub exit_threshold: f64,
    pub beta_window: usize,
    pub residual_window: usize,
    pub max_holding_days: usize,
    pub risk_fraction: f64,
    /// Floor applied to the sizing volatility.
    pub volatility_floor: f64,
    /// Flat cost charged once per closed trade.
    pub transaction_cost: f64,
    pub exposure_cap_fraction: f64,
    pub stop_loss_fraction: f64,
    pub profit_target_fraction: f64,
    pub slippage_k: f64,
}

impl StrategyConfig {
    /// Builds a config with the default exposure cap, stop-loss, profit-target
    /// and slippage coefficient.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        etf: impl Into<String>,
        stock: impl Into<String>,
        total_capital: f64,
        entry_threshold: f64,
        exit_threshold: f64,
        beta_window: usize,
        residual_window: usize,
        max_holding_days: usize,
        risk_fraction: f64,
        volatility_floor: f64,
        transaction_cost: f64,
    ) -> Self {
        StrategyConfig {
            etf: etf.into(),
            stock: stock.into(),
            total_capital,
            entry_threshold,
            exit_threshold,
            beta_window,
            residual_window,
            max_holding_days,
            risk_fraction,
            volatility_floor,
            transaction_cost,
            exposure_cap_fraction: DEFAULT_EXPOSURE_CAP,
            stop_loss_fraction: DEFAULT_STOP_LOSS,
            profit_target_fraction: DEFAULT_PROFIT_TARGET,
            slippage_k: DEFAULT_SLIPPAGE_K,
        }
    }

    pub fn exposure_cap(&self) -> f64 {
        self.exposure_cap_fraction * self.total_capital
    }

    pub fn stop_loss(&self) -> f64 {
        -self.stop_loss_fraction * self.total_capital
    }

    pub fn profit_target(&self) -> f64 {
        self.profit_target_fraction * self.total_capital
    }

    /// Checks every range constraint on the typed values.
    pub fn validate(&self) -> Result<(), PairtraderError> {
        let invalid = |key: &str, reason: &str| PairtraderError::ConfigInvalid {
            section: "strategy".into(),
            key: key.into(),
            reason: reason.into(),
        };

        if self.etf.trim().is_empty() {
            return Err(PairtraderError::ConfigMissing {
                section: "pair".into(),
                key: "etf".into(),
            });
        }
        if self.stock.trim().is_empty() {
            return Err(PairtraderError::ConfigMissing {
                section: "pair".into(),
                key: "stock".into(),
            });
        }
        if !(self.total_capital > 0.0 && self.total_capital.is_finite()) {
            return Err(invalid("capital", "capital must be positive"));
        }
        if !(self.entry_threshold > 0.0) {
            return Err(invalid("theta_entry", "theta_entry must be positive"));
        }
        if !(self.exit_threshold >= 0.0 && self.exit_threshold < self.entry_threshold) {
            return Err(invalid(
                "theta_exit",
                "theta_exit must be non-negative and below theta_entry",
            ));
        }
        if self.beta_window < 2 {
            return Err(invalid("beta_window", "beta_window must be at least 2"));
        }
        if self.residual_window < 10 {
            return Err(invalid("residual_window", "residual_window must be at least 10"));
        }
        if self.max_holding_days < 1 {
            return Err(invalid("max_holding_days", "max_holding_days must be at least 1"));
        }
        if !(self.risk_fraction > 0.0 && self.risk_fraction <= 1.0) {
            return Err(invalid("risk_fraction", "risk_fraction must be in (0, 1]"));
        }
        if !(self.volatility_floor >= 0.0) {
            return Err(invalid("volatility_floor", "volatility_floor must be non-negative"));
        }
        if !(self.transaction_cost >= 0.0) {
            return Err(invalid("transaction_cost", "transaction_cost must be non-negative"));
        }
        if !(self.exposure_cap_fraction > 0.0 && self.exposure_cap_fraction <= 1.0) {
            return Err(invalid("exposure_cap", "exposure_cap must be in (0, 1]"));
        }
        if !(self.stop_loss_fraction >= 0.0) {
            return Err(invalid("stop_loss", "stop_loss must be non-negative"));
        }
        if !(self.profit_target_fraction >= 0.0) {
            return Err(invalid("profit_target", "profit_target must be non-negative"));
        }
        if !(self.slippage_k >= 0.0) {
            return Err(invalid("slippage_k", "slippage_k must be non-negative"));
        }
        Ok(())
    }
}
