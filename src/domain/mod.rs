//! Core domain types and logic.

pub mod price;
pub mod series;
pub mod returns;
pub mod beta;
pub mod rolling;
pub mod garch;
pub mod residuals;
pub mod signal;
pub mod execution;
pub mod position;
pub mod portfolio;
pub mod config;
pub mod config_validation;
pub mod backtest;
pub mod error;
