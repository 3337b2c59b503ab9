//! Date-keyed numeric series.
//!
//! Every derived series (returns, betas, residuals, volatilities, z-scores) is a
//! [`DatedSeries`]: values sorted by strictly increasing date, with an explicit
//! "is this date defined" query instead of sentinel values.

use chrono::NaiveDate;

use super::error::DateSpan;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatedSeries {
    points: Vec<(NaiveDate, f64)>,
}

impl DatedSeries {
    pub fn new() -> Self {
        DatedSeries { points: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        DatedSeries {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Appends a point. Dates must arrive in strictly increasing order.
    pub fn push(&mut self, date: NaiveDate, value: f64) {
        debug_assert!(
            self.points.last().is_none_or(|(last, _)| *last < date),
            "dated series must be strictly increasing"
        );
        self.points.push((date, value));
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.position(date).map(|i| self.points[i].1)
    }

    pub fn is_defined(&self, date: NaiveDate) -> bool {
        self.position(date).is_some()
    }

    /// Index of `date` within the series, if defined.
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.points.binary_search_by_key(&date, |(d, _)| *d).ok()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|(d, _)| *d)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.points.iter().copied()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(d, _)| *d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(d, _)| *d)
    }

    pub fn span(&self) -> DateSpan {
        match (self.first_date(), self.last_date()) {
            (Some(first), Some(last)) => DateSpan::new(first, last),
            _ => DateSpan::empty(),
        }
    }
}

impl FromIterator<(NaiveDate, f64)> for DatedSeries {
    /// Collects points, sorting by date. Later duplicates are dropped.
    fn from_iter<I: IntoIterator<Item = (NaiveDate, f64)>>(iter: I) -> Self {
        let mut points: Vec<(NaiveDate, f64)> = iter.into_iter().collect();
        points.sort_by_key(|(d, _)| *d);
        points.dedup_by_key(|(d, _)| *d);
        DatedSeries { points }
    }
}
