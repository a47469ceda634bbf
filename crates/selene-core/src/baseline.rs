//! Baseline Estimator: recency-weighted mean gap, its dispersion, and the
//! date window and confidence derived from them.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{ForecastError, Result};
use crate::history::CycleHistory;

/// Linearly recency-weighted mean: weight(i) = i, oldest gap first.
/// The most recent of K gaps weighs K times the oldest.
pub fn weighted_mean(gaps: &[i64]) -> Option<f64> {
    if gaps.is_empty() {
        return None;
    }
    let (sum, weights) = gaps
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sum, weights), (i, &gap)| {
            let w = (i + 1) as f64;
            (sum + gap as f64 * w, weights + w)
        });
    Some(sum / weights)
}

/// Population standard deviation of the raw gaps. Zero below two gaps.
pub fn dispersion(gaps: &[i64]) -> f64 {
    if gaps.len() < 2 {
        return 0.0;
    }
    let n = gaps.len() as f64;
    let mean = gaps.iter().map(|&g| g as f64).sum::<f64>() / n;
    let var = gaps
        .iter()
        .map(|&g| {
            let diff = g as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;
    var.sqrt()
}

/// 1 - min(0.5, cv / 2), capped. Zero for a non-positive mean.
pub fn confidence(mean: f64, dispersion: f64, cap: f64) -> f64 {
    if mean.is_nan() || mean <= 0.0 || !dispersion.is_finite() {
        return 0.0;
    }
    let cv = dispersion / mean;
    (1.0 - (cv / 2.0).min(0.5)).min(cap)
}

/// Day offsets from the last occurrence for the window edges.
///
/// The half-spread is the dispersion, or a fixed fallback when the gaps
/// show none. Each offset is then clamped into the plausible cycle band;
/// the mean itself is never clamped.
pub fn window_offsets(mean: f64, dispersion: f64, config: &EngineConfig) -> (i64, i64) {
    let (earliest, latest) = if dispersion > 0.0 {
        ((mean - dispersion) as i64, (mean + dispersion) as i64)
    } else {
        let center = mean as i64;
        (
            center - config.fallback_half_spread,
            center + config.fallback_half_spread,
        )
    };
    (config.clamp_days(earliest), config.clamp_days(latest))
}

/// Predicted range for the next occurrence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionWindow {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
    pub confidence: f64,
}

impl PredictionWindow {
    pub fn from_estimate(
        last: NaiveDate,
        mean: f64,
        dispersion: f64,
        config: &EngineConfig,
    ) -> Result<Self> {
        let (lo, hi) = window_offsets(mean, dispersion, config);
        Ok(Self {
            earliest: add_days(last, lo)?,
            latest: add_days(last, hi)?,
            confidence: confidence(mean, dispersion, config.effective_confidence_cap()),
        })
    }

    /// Width of the window in days, inclusive of both ends.
    pub fn span_days(&self) -> i64 {
        self.latest.signed_duration_since(self.earliest).num_days() + 1
    }
}

fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    let days = u64::try_from(days).map_err(|_| ForecastError::DateOutOfRange)?;
    date.checked_add_days(Days::new(days))
        .ok_or(ForecastError::DateOutOfRange)
}

/// Summary statistics of a gap sequence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaselineEstimate {
    pub mean: f64,
    pub dispersion: f64,
    pub gap_count: usize,
}

impl BaselineEstimate {
    pub fn from_gaps(gaps: &[i64]) -> Result<Self> {
        let mean = weighted_mean(gaps).ok_or(ForecastError::InsufficientHistory {
            usable_gaps: 0,
        })?;
        Ok(Self {
            mean,
            dispersion: dispersion(gaps),
            gap_count: gaps.len(),
        })
    }
}

/// Statistical predictor over the full usable gap history.
#[derive(Clone, Debug, Default)]
pub struct BaselineEstimator {
    config: EngineConfig,
}

impl BaselineEstimator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn estimate(&self, history: &CycleHistory) -> Result<BaselineEstimate> {
        BaselineEstimate::from_gaps(&history.usable_gaps())
    }

    pub fn predict(&self, history: &CycleHistory) -> Result<PredictionWindow> {
        let estimate = self.estimate(history)?;
        let last = history
            .last_date()
            .ok_or(ForecastError::InsufficientHistory { usable_gaps: 0 })?;
        PredictionWindow::from_estimate(last, estimate.mean, estimate.dispersion, &self.config)
    }
}
