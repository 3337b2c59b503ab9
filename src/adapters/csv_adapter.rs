//! CSV file data adapter.
//!
//! Reads `<base_path>/<SYMBOL>.csv`. Columns are located by header name
//! (`date`, `close`, `volume`); any other columns are ignored.

use crate::domain::error::PairtraderError;
use crate::domain::price::PricePoint;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    close: usize,
    volume: usize,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn columns(headers: &csv::StringRecord, path: &str) -> Result<Columns, PairtraderError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| PairtraderError::Data {
                    reason: format!("{path}: missing {name} column"),
                })
        };
        Ok(Columns {
            date: find("date")?,
            close: find("close")?,
            volume: find("volume")?,
        })
    }

    /// Empty cell means the volume is unavailable.
    fn parse_volume(raw: &str) -> Option<i64> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Some(0);
        }
        raw.parse::<i64>()
            .ok()
            .or_else(|| raw.parse::<f64>().ok().map(|v| v.round() as i64))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, PairtraderError> {
        let path = self.csv_path(symbol);
        let path_label = path.display().to_string();
        let content = fs::read_to_string(&path).map_err(|e| PairtraderError::Data {
            reason: format!("failed to read {}: {}", path_label, e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let cols = Self::columns(rdr.headers()?, &path_label)?;
        let mut points = Vec::new();

        for (line, result) in rdr.records().enumerate() {
            let record = result?;
            let field = |idx: usize, name: &str| {
                record.get(idx).ok_or_else(|| PairtraderError::Data {
                    reason: format!("{path_label} row {}: missing {name}", line + 1),
                })
            };

            let date_str = field(cols.date, "date")?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                PairtraderError::Data {
                    reason: format!("{path_label} row {}: invalid date '{date_str}': {e}", line + 1),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            let close_str = field(cols.close, "close")?;
            let close: f64 = close_str.trim().parse().map_err(|e| PairtraderError::Data {
                reason: format!("{path_label} row {}: invalid close '{close_str}': {e}", line + 1),
            })?;

            let volume_str = field(cols.volume, "volume")?;
            let volume = Self::parse_volume(volume_str).ok_or_else(|| PairtraderError::Data {
                reason: format!("{path_label} row {}: invalid volume '{volume_str}'", line + 1),
            })?;

            points.push(PricePoint::new(date, close, volume));
        }

        points.sort_by_key(|p| p.date);
        tracing::debug!(symbol, rows = points.len(), path = %path_label, "prices loaded");
        Ok(points)
    }
}
