//! Cycle-Differ: turns an unordered set of start dates into the ordered
//! sequence of day gaps between consecutive occurrences.

use chrono::NaiveDate;

use crate::constants::DATE_FORMAT;
use crate::error::{ForecastError, Result};

/// Parse a `YYYY-MM-DD` calendar date. Surrounding whitespace is ignored.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|_| {
        ForecastError::MalformedDate {
            input: input.to_string(),
        }
    })
}

/// Days between consecutive dates after sorting ascending.
/// Duplicate dates yield zero gaps; fewer than two dates yield none.
pub fn diff_between_dates(dates: &[NaiveDate]) -> Vec<i64> {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable();
    sorted
        .windows(2)
        .map(|pair| pair[1].signed_duration_since(pair[0]).num_days())
        .collect()
}

/// A parsed, sorted occurrence history and its gap sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleHistory {
    dates: Vec<NaiveDate>,
    gaps: Vec<i64>,
}

impl CycleHistory {
    /// Parse every date string. One malformed entry fails the whole history.
    pub fn parse<S: AsRef<str>>(inputs: &[S]) -> Result<Self> {
        let dates = inputs
            .iter()
            .map(|s| parse_date(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_dates(dates))
    }

    pub fn from_dates(mut dates: Vec<NaiveDate>) -> Self {
        dates.sort_unstable();
        let gaps = diff_between_dates(&dates);
        Self { dates, gaps }
    }

    /// Sorted occurrence dates, duplicates included.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Raw gap sequence, `len() - 1` entries, zeros where dates repeat.
    pub fn gaps(&self) -> &[i64] {
        &self.gaps
    }

    /// Gaps that can count as a cycle length (strictly positive), in order.
    pub fn usable_gaps(&self) -> Vec<i64> {
        let usable: Vec<i64> = self.gaps.iter().copied().filter(|&g| g > 0).collect();
        let dropped = self.gaps.len() - usable.len();
        if dropped > 0 {
            tracing::debug!("ignoring {dropped} zero-length gap(s) from duplicate dates");
        }
        usable
    }

    /// Number of entries that repeat an earlier date.
    pub fn duplicate_count(&self) -> usize {
        self.gaps.iter().filter(|&&g| g == 0).count()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}
