use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use selene_core::{DATE_FORMAT, DEFAULT_CYCLE_LENGTH, parse_date};

use crate::error::{Result, StoreError};

/// One recorded period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodEntry {
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
}

impl PeriodEntry {
    fn start(&self) -> Option<NaiveDate> {
        parse_date(&self.start_date).ok()
    }

    fn end(&self) -> Option<NaiveDate> {
        self.end_date.as_deref().and_then(|e| parse_date(e).ok())
    }

    /// Inclusive length in days, when an end date was recorded.
    pub fn duration_days(&self) -> Option<i64> {
        let (start, end) = (self.start()?, self.end()?);
        Some(end.signed_duration_since(start).num_days() + 1)
    }
}

fn default_average() -> u32 {
    DEFAULT_CYCLE_LENGTH
}

/// On-disk document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryData {
    #[serde(default)]
    pub periods: Vec<PeriodEntry>,
    #[serde(default = "default_average")]
    pub average_cycle_length: u32,
}

impl Default for HistoryData {
    fn default() -> Self {
        Self {
            periods: Vec::new(),
            average_cycle_length: DEFAULT_CYCLE_LENGTH,
        }
    }
}

/// Simple next-period guess from the store's own integer average.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NaivePrediction {
    pub last_start: NaiveDate,
    pub average_cycle_length: u32,
    pub next_start: NaiveDate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub total_periods: usize,
    pub average_cycle_length: u32,
    pub average_duration: Option<i64>,
}

fn canonical(input: &str) -> Result<String> {
    let date = parse_date(input).map_err(|_| StoreError::InvalidDate(input.to_string()))?;
    Ok(date.format(DATE_FORMAT).to_string())
}

/// JSON-file record of periods plus a running integer average cycle length.
///
/// The average is the floor of the unweighted mean of positive gaps between
/// consecutive start dates. It is maintained independently of the
/// forecasting engine's weighted estimate and the two can disagree.
pub struct HistoryStore {
    path: Option<PathBuf>,
    data: HistoryData,
}

impl HistoryStore {
    /// Open the history file, starting empty when it does not exist yet.
    pub fn open(path: &Path) -> Result<Self> {
        let data = if path.exists() {
            let raw = fs::read_to_string(path)?;
            let data: HistoryData = serde_json::from_str(&raw)?;
            for entry in &data.periods {
                if entry.start().is_none() {
                    return Err(StoreError::InvalidData(format!(
                        "{}: bad start_date {:?}",
                        path.display(),
                        entry.start_date
                    )));
                }
            }
            tracing::debug!(
                "loaded {} periods from {}",
                data.periods.len(),
                path.display()
            );
            data
        } else {
            HistoryData::default()
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            data,
        })
    }

    pub fn open_in_memory() -> Self {
        Self {
            path: None,
            data: HistoryData::default(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn data(&self) -> &HistoryData {
        &self.data
    }

    pub fn periods(&self) -> &[PeriodEntry] {
        &self.data.periods
    }

    pub fn average_cycle_length(&self) -> u32 {
        self.data.average_cycle_length
    }

    /// Record a period. Dates must be `YYYY-MM-DD`; the end may not precede
    /// the start. Persists immediately.
    pub fn add_period(
        &mut self,
        start_date: &str,
        end_date: Option<&str>,
        symptoms: Option<Vec<String>>,
    ) -> Result<&PeriodEntry> {
        let start = canonical(start_date)?;
        let end = end_date.map(canonical).transpose()?;
        if let Some(end) = &end
            && end < &start
        {
            return Err(StoreError::InvalidData(format!(
                "end date {end} is before start date {start}"
            )));
        }

        self.data.periods.push(PeriodEntry {
            start_date: start,
            end_date: end,
            symptoms: symptoms.unwrap_or_default(),
        });
        self.recalculate_average();
        self.save()?;
        let index = self.data.periods.len() - 1;
        Ok(&self.data.periods[index])
    }

    fn sorted_starts(&self) -> Vec<NaiveDate> {
        let mut starts: Vec<NaiveDate> =
            self.data.periods.iter().filter_map(PeriodEntry::start).collect();
        starts.sort_unstable();
        starts
    }

    fn recalculate_average(&mut self) {
        let starts = self.sorted_starts();
        if starts.len() < 2 {
            return;
        }
        let lengths: Vec<i64> = starts
            .windows(2)
            .map(|w| w[1].signed_duration_since(w[0]).num_days())
            .filter(|&days| days > 0)
            .collect();
        if lengths.is_empty() {
            return;
        }
        let floor = lengths.iter().sum::<i64>() / lengths.len() as i64;
        self.data.average_cycle_length = u32::try_from(floor).unwrap_or(u32::MAX);
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        fs::write(path, json)?;
        tracing::debug!("saved {} periods to {}", self.data.periods.len(), path.display());
        Ok(())
    }

    /// Up to `limit` entries, most recent start first.
    pub fn history(&self, limit: usize) -> Vec<&PeriodEntry> {
        let mut entries: Vec<&PeriodEntry> = self.data.periods.iter().collect();
        entries.sort_by(|a, b| b.start().cmp(&a.start()));
        entries.truncate(limit);
        entries
    }

    /// Start dates in the engine's input format.
    pub fn start_dates(&self) -> Vec<String> {
        self.data
            .periods
            .iter()
            .map(|p| p.start_date.clone())
            .collect()
    }

    pub fn last_period(&self) -> Option<&PeriodEntry> {
        self.data.periods.iter().max_by_key(|p| p.start())
    }

    /// Last start plus the integer average cycle length.
    pub fn naive_next(&self) -> Option<NaivePrediction> {
        let last_start = self.last_period()?.start()?;
        let average = self.data.average_cycle_length;
        let next_start = last_start.checked_add_days(Days::new(u64::from(average)))?;
        Some(NaivePrediction {
            last_start,
            average_cycle_length: average,
            next_start,
        })
    }

    pub fn stats(&self) -> Option<HistoryStats> {
        if self.data.periods.is_empty() {
            return None;
        }
        let durations: Vec<i64> = self
            .data
            .periods
            .iter()
            .filter_map(PeriodEntry::duration_days)
            .collect();
        let average_duration = if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum::<i64>() / durations.len() as i64)
        };
        Some(HistoryStats {
            total_periods: self.data.periods.len(),
            average_cycle_length: self.data.average_cycle_length,
            average_duration,
        })
    }
}
