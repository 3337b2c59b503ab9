//! Configuration validation.
//!
//! Checks presence and ranges of every key before a backtest runs, and builds
//! the typed configs from a [`ConfigPort`].

use crate::domain::backtest::BacktestConfig;
use crate::domain::config::{
    StrategyConfig, DEFAULT_EXPOSURE_CAP, DEFAULT_PROFIT_TARGET, DEFAULT_SLIPPAGE_K,
    DEFAULT_STOP_LOSS,
};
use crate::domain::error::PairtraderError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

/// Validates the `[pair]`, `[strategy]` and `[backtest]` sections.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    build_strategy_config(config)?;
    build_backtest_config(config)?;
    Ok(())
}

pub fn build_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, PairtraderError> {
    let strategy = StrategyConfig {
        etf: required_string(config, "pair", "etf")?,
        stock: required_string(config, "pair", "stock")?,
        total_capital: required_double(config, "capital")?,
        entry_threshold: required_double(config, "theta_entry")?,
        exit_threshold: required_double(config, "theta_exit")?,
        beta_window: required_count(config, "beta_window")?,
        residual_window: required_count(config, "residual_window")?,
        max_holding_days: required_count(config, "max_holding_days")?,
        risk_fraction: required_double(config, "risk_fraction")?,
        volatility_floor: required_double(config, "volatility_floor")?,
        transaction_cost: required_double(config, "transaction_cost")?,
        exposure_cap_fraction: optional_double(config, "exposure_cap", DEFAULT_EXPOSURE_CAP)?,
        stop_loss_fraction: optional_double(config, "stop_loss", DEFAULT_STOP_LOSS)?,
        profit_target_fraction: optional_double(config, "profit_target", DEFAULT_PROFIT_TARGET)?,
        slippage_k: optional_double(config, "slippage_k", DEFAULT_SLIPPAGE_K)?,
    };
    strategy.validate()?;
    Ok(strategy)
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, PairtraderError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(PairtraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok(BacktestConfig {
        start_date,
        end_date,
    })
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, PairtraderError> {
    match value {
        None => Err(PairtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            PairtraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn required_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, PairtraderError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(PairtraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn not_a_number(key: &str, raw: &str) -> PairtraderError {
    PairtraderError::ConfigInvalid {
        section: "strategy".to_string(),
        key: key.to_string(),
        reason: format!("'{raw}' is not a number"),
    }
}

fn required_double(config: &dyn ConfigPort, key: &str) -> Result<f64, PairtraderError> {
    let raw = required_string(config, "strategy", key)?;
    raw.parse::<f64>().map_err(|_| not_a_number(key, &raw))
}

fn optional_double(
    config: &dyn ConfigPort,
    key: &str,
    default: f64,
) -> Result<f64, PairtraderError> {
    match config.get_string("strategy", key) {
        Some(raw) if !raw.trim().is_empty() => {
            let raw = raw.trim();
            raw.parse::<f64>().map_err(|_| not_a_number(key, raw))
        }
        _ => Ok(default),
    }
}

/// Window lengths and day counts: non-negative integers.
fn required_count(config: &dyn ConfigPort, key: &str) -> Result<usize, PairtraderError> {
    let raw = required_string(config, "strategy", key)?;
    raw.parse::<usize>()
        .map_err(|_| PairtraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: key.to_string(),
            reason: format!("'{raw}' is not a non-negative integer"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const VALID: &str = r#"
[pair]
etf = XLK
stock = MSFT

[strategy]
capital = 1000000
theta_entry = 2.0
theta_exit = 0.5
beta_window = 60
residual_window = 90
max_holding_days = 21
risk_fraction = 0.02
volatility_floor = 0.2
transaction_cost = 0.001

[backtest]
start_date = 2020-01-01
end_date = 2024-12-31
"#;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn replace(key_line: &str, with: &str) -> FileConfigAdapter {
        make_config(&VALID.replace(key_line, with))
    }

    fn invalid_key(err: PairtraderError) -> String {
        match err {
            PairtraderError::ConfigInvalid { key, .. } | PairtraderError::ConfigMissing { key, .. } => key,
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_config(&make_config(VALID)).is_ok());
    }

    #[test]
    fn builds_strategy_with_defaults() {
        let s = build_strategy_config(&make_config(VALID)).unwrap();
        assert_eq!(s.etf, "XLK");
        assert_eq!(s.stock, "MSFT");
        assert_eq!(s.beta_window, 60);
        assert_eq!(s.residual_window, 90);
        assert_eq!(s.max_holding_days, 21);
        assert!((s.exposure_cap_fraction - 0.3).abs() < f64::EPSILON);
        assert!((s.stop_loss_fraction - 0.02).abs() < f64::EPSILON);
        assert!((s.profit_target_fraction - 0.03).abs() < f64::EPSILON);
        assert!((s.slippage_k - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn optional_overrides_are_read() {
        let content = VALID.replace(
            "transaction_cost = 0.001",
            "transaction_cost = 0.001\nexposure_cap = 0.5\nslippage_k = 0.1",
        );
        let s = build_strategy_config(&make_config(&content)).unwrap();
        assert!((s.exposure_cap_fraction - 0.5).abs() < f64::EPSILON);
        assert!((s.slippage_k - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn builds_backtest_dates() {
        let b = build_backtest_config(&make_config(VALID)).unwrap();
        assert_eq!(b.start_date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(b.end_date, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn missing_etf_fails() {
        let err = validate_config(&replace("etf = XLK", "")).unwrap_err();
        assert!(matches!(err, PairtraderError::ConfigMissing { ref section, .. } if section == "pair"));
        assert_eq!(invalid_key(err), "etf");
    }

    #[test]
    fn missing_capital_fails() {
        let err = validate_config(&replace("capital = 1000000", "")).unwrap_err();
        assert!(matches!(err, PairtraderError::ConfigMissing { .. }));
        assert_eq!(invalid_key(err), "capital");
    }

    #[test]
    fn non_numeric_theta_fails() {
        let err = validate_config(&replace("theta_entry = 2.0", "theta_entry = high")).unwrap_err();
        assert_eq!(invalid_key(err), "theta_entry");
    }

    #[test]
    fn unparsable_optional_value_fails_instead_of_defaulting() {
        let content = VALID.replace(
            "transaction_cost = 0.001",
            "transaction_cost = 0.001\nexposure_cap = lots",
        );
        let err = validate_config(&make_config(&content)).unwrap_err();
        assert!(matches!(err, PairtraderError::ConfigInvalid { .. }));
        assert_eq!(invalid_key(err), "exposure_cap");
    }

    #[test]
    fn capital_must_be_positive() {
        let err = validate_config(&replace("capital = 1000000", "capital = 0")).unwrap_err();
        assert_eq!(invalid_key(err), "capital");
    }

    #[test]
    fn theta_exit_must_be_below_entry() {
        let err = validate_config(&replace("theta_exit = 0.5", "theta_exit = 2.5")).unwrap_err();
        assert_eq!(invalid_key(err), "theta_exit");
    }

    #[test]
    fn beta_window_minimum() {
        let err = validate_config(&replace("beta_window = 60", "beta_window = 1")).unwrap_err();
        assert_eq!(invalid_key(err), "beta_window");
    }

    #[test]
    fn residual_window_minimum() {
        let err =
            validate_config(&replace("residual_window = 90", "residual_window = 9")).unwrap_err();
        assert_eq!(invalid_key(err), "residual_window");
    }

    #[test]
    fn negative_window_is_not_a_count() {
        let err =
            validate_config(&replace("beta_window = 60", "beta_window = -5")).unwrap_err();
        assert_eq!(invalid_key(err), "beta_window");
    }

    #[test]
    fn max_holding_days_at_least_one() {
        let err =
            validate_config(&replace("max_holding_days = 21", "max_holding_days = 0")).unwrap_err();
        assert_eq!(invalid_key(err), "max_holding_days");
    }

    #[test]
    fn risk_fraction_above_one_fails() {
        let err =
            validate_config(&replace("risk_fraction = 0.02", "risk_fraction = 1.5")).unwrap_err();
        assert_eq!(invalid_key(err), "risk_fraction");
    }

    #[test]
    fn negative_transaction_cost_fails() {
        let err = validate_config(&replace("transaction_cost = 0.001", "transaction_cost = -1"))
            .unwrap_err();
        assert_eq!(invalid_key(err), "transaction_cost");
    }

    #[test]
    fn invalid_start_date_format_fails() {
        let err =
            validate_config(&replace("start_date = 2020-01-01", "start_date = 01/01/2020")).unwrap_err();
        assert_eq!(invalid_key(err), "start_date");
    }

    #[test]
    fn missing_end_date_fails() {
        let err = validate_config(&replace("end_date = 2024-12-31", "")).unwrap_err();
        assert!(matches!(err, PairtraderError::ConfigMissing { .. }));
    }

    #[test]
    fn start_date_after_end_date_fails() {
        let err =
            validate_config(&replace("start_date = 2020-01-01", "start_date = 2025-06-01")).unwrap_err();
        assert_eq!(invalid_key(err), "start_date");
    }
}
