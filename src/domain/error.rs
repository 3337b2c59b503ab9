//! Domain error types.

use chrono::NaiveDate;
use std::fmt;

/// First and last date of the observations an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateSpan {
    pub first: Option<NaiveDate>,
    pub last: Option<NaiveDate>,
}

impl DateSpan {
    pub fn new(first: NaiveDate, last: NaiveDate) -> Self {
        DateSpan {
            first: Some(first),
            last: Some(last),
        }
    }

    pub fn empty() -> Self {
        DateSpan::default()
    }

    /// Span covering an already date-ordered iterator.
    pub fn of<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Self {
        let mut iter = dates.into_iter();
        match iter.next() {
            Some(first) => {
                let last = iter.last().unwrap_or(first);
                DateSpan::new(first, last)
            }
            None => DateSpan::empty(),
        }
    }
}

impl fmt::Display for DateSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.first, self.last) {
            (Some(first), Some(last)) => write!(f, "{first}..{last}"),
            _ => write!(f, "<empty>"),
        }
    }
}

/// Top-level error type for pairtrader.
#[derive(Debug, thiserror::Error)]
pub enum PairtraderError {
    #[error("insufficient data for {what}: have {observations} observations over {span}, need {minimum}")]
    InsufficientData {
        what: String,
        observations: usize,
        minimum: usize,
        span: DateSpan,
    },

    #[error("degenerate regression at {date}: regressor has zero variance over {window} observations")]
    DegenerateRegression { date: NaiveDate, window: usize },

    #[error("volatility model fit failed ({observations} observations over {span}): {reason}")]
    ModelFit {
        reason: String,
        observations: usize,
        span: DateSpan,
    },

    #[error("undefined sizing volatility on {date}")]
    UndefinedVolatility { date: NaiveDate },

    #[error("missing or zero volume on {date}, cannot price slippage")]
    MissingVolume { date: NaiveDate },

    #[error("data consistency error on {date}: {reason}")]
    DataConsistency { date: NaiveDate, reason: String },

    #[error("invalid price series: {reason}")]
    InvalidSeries { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PairtraderError {
    /// Date-local failures: the simulation skips that date's action and continues.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PairtraderError::DegenerateRegression { .. }
                | PairtraderError::UndefinedVolatility { .. }
                | PairtraderError::MissingVolume { .. }
        )
    }
}

impl From<&PairtraderError> for std::process::ExitCode {
    fn from(err: &PairtraderError) -> Self {
        let code: u8 = match err {
            PairtraderError::Io(_) => 1,
            PairtraderError::ConfigParse { .. }
            | PairtraderError::ConfigMissing { .. }
            | PairtraderError::ConfigInvalid { .. } => 2,
            PairtraderError::Data { .. }
            | PairtraderError::Csv(_)
            | PairtraderError::InvalidSeries { .. }
            | PairtraderError::InsufficientData { .. }
            | PairtraderError::DataConsistency { .. } => 3,
            PairtraderError::ModelFit { .. } => 4,
            PairtraderError::DegenerateRegression { .. }
            | PairtraderError::UndefinedVolatility { .. }
            | PairtraderError::MissingVolume { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
