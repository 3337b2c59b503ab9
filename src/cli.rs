//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::{write_trade_log, CsvReportAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_backtest, run_batch, BacktestJob, BacktestResult};
use crate::domain::config::StrategyConfig;
use crate::domain::config_validation::{
    build_backtest_config, build_strategy_config, validate_config,
};
use crate::domain::error::PairtraderError;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "pairtrader", about = "ETF/stock pairs-trading backtester")]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest for one pair
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [data] csv_dir
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Trade log destination; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run independent configurations in parallel
    Batch {
        #[arg(short, long = "config", required = true)]
        configs: Vec<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        output_dir: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            data_dir,
            output,
        } => run_single(&config, data_dir.as_deref(), output.as_deref()),
        Command::Batch {
            configs,
            data_dir,
            output_dir,
        } => run_many(&configs, data_dir.as_deref(), &output_dir),
        Command::Validate { config } => run_validate(&config),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, PairtraderError> {
    tracing::info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

fn resolve_data_dir(
    adapter: &dyn ConfigPort,
    override_dir: Option<&Path>,
) -> Result<PathBuf, PairtraderError> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }
    match adapter.get_string("data", "csv_dir") {
        Some(dir) if !dir.trim().is_empty() => Ok(PathBuf::from(dir.trim())),
        _ => Err(PairtraderError::ConfigMissing {
            section: "data".to_string(),
            key: "csv_dir".to_string(),
        }),
    }
}

/// Loads the config and both price series for one run.
fn prepare_job(
    config_path: &Path,
    data_dir: Option<&Path>,
) -> Result<BacktestJob, PairtraderError> {
    let adapter = load_config(config_path)?;
    let strategy = build_strategy_config(&adapter)?;
    let window = build_backtest_config(&adapter)?;
    let data = CsvAdapter::new(resolve_data_dir(&adapter, data_dir)?);

    let etf = data.load_series(&strategy.etf, window.start_date, window.end_date)?;
    let stock = data.load_series(&strategy.stock, window.start_date, window.end_date)?;

    let name = config_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}_{}", strategy.etf, strategy.stock));
    Ok(BacktestJob {
        name,
        etf,
        stock,
        config: strategy,
    })
}

fn report_summary(config: &StrategyConfig, result: &BacktestResult) {
    let net: f64 = result.trades.iter().map(|t| t.net_pnl).sum();
    eprintln!(
        "{}/{}: {} trades, {} still open, {} entries skipped, net P&L {:.4}",
        config.etf,
        config.stock,
        result.trades.len(),
        result.open_positions.len(),
        result.skipped.len(),
        net
    );
}

fn run_single(
    config_path: &Path,
    data_dir: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), PairtraderError> {
    let job = prepare_job(config_path, data_dir)?;
    let result = run_backtest(&job.etf, &job.stock, &job.config)?;

    match output {
        Some(path) => CsvReportAdapter::new().write(&result, &job.config, &path.to_string_lossy())?,
        None => write_trade_log(io::stdout().lock(), &result.trades)?,
    }
    report_summary(&job.config, &result);
    Ok(())
}

/// Every job runs even if another fails; the first failure decides the exit
/// code. Jobs are named by config file stem, and a stem seen twice is
/// rejected rather than overwriting the earlier log.
fn run_many(
    config_paths: &[PathBuf],
    data_dir: Option<&Path>,
    output_dir: &Path,
) -> Result<(), PairtraderError> {
    std::fs::create_dir_all(output_dir)?;

    let mut first_error: Option<PairtraderError> = None;
    let mut jobs = Vec::with_capacity(config_paths.len());
    let mut claimed = HashSet::new();
    for path in config_paths {
        let prepared = prepare_job(path, data_dir).and_then(|job| {
            if claimed.insert(job.name.clone()) {
                Ok(job)
            } else {
                Err(PairtraderError::Io(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{}.csv is already written by an earlier config", job.name),
                )))
            }
        });
        match prepared {
            Ok(job) => jobs.push(job),
            Err(e) => {
                eprintln!("error: {}: {e}", path.display());
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    let report = CsvReportAdapter::new();
    for (job, result) in jobs.iter().zip(run_batch(&jobs)) {
        let written = result.and_then(|r| {
            let path = output_dir.join(format!("{}.csv", job.name));
            report.write(&r, &job.config, &path.to_string_lossy())?;
            report_summary(&job.config, &r);
            Ok(())
        });
        if let Err(e) = written {
            eprintln!("error: {}: {e}", job.name);
            if first_error.is_none() {
                first_error = Some(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn run_validate(config_path: &Path) -> Result<(), PairtraderError> {
    let adapter = load_config(config_path)?;
    validate_config(&adapter)?;
    let strategy = build_strategy_config(&adapter)?;
    println!(
        "Configuration valid: {}/{} (theta_entry={}, theta_exit={}, beta_window={}, residual_window={})",
        strategy.etf,
        strategy.stock,
        strategy.entry_threshold,
        strategy.exit_threshold,
        strategy.beta_window,
        strategy.residual_window
    );
    Ok(())
}
