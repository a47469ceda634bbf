//! Blended Predictor: the engine's single entry point.
//!
//! Sparse histories (fewer than `rich_history_min_dates` dates) get the
//! baseline window as-is. Rich histories average the baseline weighted mean
//! with the sequence model's estimate and rebuild the window around that
//! blended length, keeping the baseline dispersion.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::baseline::{BaselineEstimate, PredictionWindow};
use crate::config::EngineConfig;
use crate::error::{ForecastError, Result};
use crate::history::CycleHistory;
use crate::model::{CycleModel, SequenceModel};
use crate::sequence::SequenceEstimator;

/// Which path produced the window.
///
/// The threshold counts every supplied date, duplicates included, so five
/// entries with a repeated date still take the rich path even though they
/// yield fewer than four usable gaps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    /// Fewer than `rich_history_min_dates` dates: baseline window only.
    Sparse,
    /// Baseline blended with the sequence estimate.
    Rich,
}

/// A prediction window plus the intermediate estimates that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub window: PredictionWindow,
    pub mode: HistoryMode,
    pub last_date: NaiveDate,
    pub baseline_mean: f64,
    pub sequence_estimate: Option<f64>,
    pub cycle_length: f64,
    pub dispersion: f64,
    pub usable_gaps: usize,
}

impl Forecast {
    pub fn earliest(&self) -> NaiveDate {
        self.window.earliest
    }

    pub fn latest(&self) -> NaiveDate {
        self.window.latest
    }

    pub fn confidence(&self) -> f64 {
        self.window.confidence
    }
}

/// Owns the read-only model and engine settings. Holds no mutable state,
/// so one instance can serve concurrent callers.
#[derive(Clone, Debug)]
pub struct Forecaster<M: CycleModel = SequenceModel> {
    model: M,
    config: EngineConfig,
}

impl<M: CycleModel> Forecaster<M> {
    pub fn new(model: M, config: EngineConfig) -> Self {
        Self { model, config }
    }

    pub fn with_model(model: M) -> Self {
        Self::new(model, EngineConfig::default())
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Forecast the next occurrence from unordered `YYYY-MM-DD` strings.
    pub fn predict<S: AsRef<str>>(&self, dates: &[S]) -> Result<Forecast> {
        let history = CycleHistory::parse(dates)?;
        self.predict_history(&history)
    }

    pub fn predict_history(&self, history: &CycleHistory) -> Result<Forecast> {
        let gaps = history.usable_gaps();
        if gaps.is_empty() {
            return Err(ForecastError::InsufficientHistory { usable_gaps: 0 });
        }
        let last_date = history
            .last_date()
            .ok_or(ForecastError::InsufficientHistory { usable_gaps: 0 })?;
        let baseline = BaselineEstimate::from_gaps(&gaps)?;

        let (mode, sequence_estimate, cycle_length) =
            if history.len() < self.config.rich_history_min_dates {
                (HistoryMode::Sparse, None, baseline.mean)
            } else {
                let seq = SequenceEstimator::new(&self.model, &self.config)
                    .predict_next_gap(&gaps)?;
                (HistoryMode::Rich, Some(seq), (baseline.mean + seq) / 2.0)
            };

        let window = PredictionWindow::from_estimate(
            last_date,
            cycle_length,
            baseline.dispersion,
            &self.config,
        )?;

        tracing::debug!(
            mode = ?mode,
            gaps = gaps.len(),
            baseline = baseline.mean,
            cycle_length,
            dispersion = baseline.dispersion,
            "forecast computed"
        );

        Ok(Forecast {
            window,
            mode,
            last_date,
            baseline_mean: baseline.mean,
            sequence_estimate,
            cycle_length,
            dispersion: baseline.dispersion,
            usable_gaps: gaps.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::weighted_mean;
    use crate::constants::{HIDDEN_SIZE, NUM_LAYERS};
    use crate::model::LstmCycleModel;
    use approx::assert_relative_eq;

    fn d(s: &str) -> NaiveDate {
        crate::history::parse_date(s).unwrap()
    }

    fn neutral() -> Forecaster<LstmCycleModel> {
        Forecaster::with_model(LstmCycleModel::constant(HIDDEN_SIZE, NUM_LAYERS, 28.0))
    }

    const SIX_DATES: [&str; 6] = [
        "2026-01-01",
        "2026-01-29",
        "2026-02-26",
        "2026-03-27",
        "2026-04-24",
        "2026-05-22",
    ];

    #[test]
    fn test_insufficient_history() {
        let f = neutral();
        for dates in [vec![], vec!["2026-01-01"], vec!["2026-01-01", "2026-01-01"]] {
            assert_eq!(
                f.predict(&dates).unwrap_err(),
                ForecastError::InsufficientHistory { usable_gaps: 0 }
            );
        }
    }

    #[test]
    fn test_malformed_date_fails_call() {
        let err = neutral().predict(&["2026-01-01", "01/29/2026"]).unwrap_err();
        assert!(matches!(err, ForecastError::MalformedDate { .. }));
    }

    #[test]
    fn test_sparse_is_baseline() {
        let f = neutral();
        let fc = f.predict(&["2026-01-01", "2026-01-29"]).unwrap();
        assert_eq!(fc.mode, HistoryMode::Sparse);
        assert_eq!(fc.sequence_estimate, None);
        assert_eq!(fc.earliest(), d("2026-02-24"));
        assert_eq!(fc.latest(), d("2026-02-28"));
        assert_relative_eq!(fc.confidence(), 0.95);
    }

    #[test]
    fn test_four_dates_still_sparse() {
        let fc = neutral().predict(&SIX_DATES[..4]).unwrap();
        assert_eq!(fc.mode, HistoryMode::Sparse);
    }

    #[test]
    fn test_rich_blends_equally() {
        let f = Forecaster::with_model(LstmCycleModel::constant(HIDDEN_SIZE, NUM_LAYERS, 30.0));
        let fc = f.predict(&SIX_DATES).unwrap();
        assert_eq!(fc.mode, HistoryMode::Rich);
        assert_eq!(fc.sequence_estimate, Some(30.0));
        let mean = weighted_mean(&[28, 28, 29, 28, 28]).unwrap();
        assert_relative_eq!(fc.baseline_mean, mean);
        assert_relative_eq!(fc.cycle_length, (mean + 30.0) / 2.0);
    }

    #[test]
    fn test_rich_low_variance_near_28() {
        let fc = neutral().predict(&SIX_DATES).unwrap();
        assert_eq!(fc.mode, HistoryMode::Rich);
        assert!((fc.cycle_length - 28.0).abs() <= 1.0);
        assert!(fc.confidence() > 0.8);
        // dispersion 0.4 -> offsets trunc(28.1 ± 0.4) = 27, 28
        assert_eq!(fc.earliest(), d("2026-06-18"));
        assert_eq!(fc.latest(), d("2026-06-19"));
    }

    #[test]
    fn test_rich_constant_gaps_use_fallback_spread() {
        let dates = ["2026-01-01", "2026-01-29", "2026-02-26", "2026-03-26", "2026-04-23"];
        let fc = neutral().predict(&dates).unwrap();
        assert_eq!(fc.dispersion, 0.0);
        assert_eq!(fc.earliest(), d("2026-05-19"));
        assert_eq!(fc.latest(), d("2026-05-23"));
    }

    #[test]
    fn test_untrained_rich_matches_baseline() {
        let f = Forecaster::with_model(SequenceModel::untrained(11));
        let fc = f.predict(&SIX_DATES).unwrap();
        assert_eq!(fc.mode, HistoryMode::Rich);
        assert_eq!(fc.sequence_estimate, Some(fc.baseline_mean));
        assert_relative_eq!(fc.cycle_length, fc.baseline_mean);
        assert!((fc.cycle_length - 28.0).abs() <= 1.0);
        assert!(fc.confidence() > 0.8);
        assert_eq!(fc.earliest(), d("2026-06-18"));
        assert_eq!(fc.latest(), d("2026-06-19"));
    }

    #[test]
    fn test_duplicates_count_toward_rich_threshold() {
        let dates = ["2026-01-01", "2026-01-29", "2026-02-26", "2026-02-26", "2026-03-26"];
        let fc = neutral().predict(&dates).unwrap();
        assert_eq!(fc.mode, HistoryMode::Rich);
        assert_eq!(fc.usable_gaps, 3);
    }

    #[test]
    fn test_idempotent() {
        let f = Forecaster::with_model(SequenceModel::untrained(11));
        let a = f.predict(&SIX_DATES).unwrap();
        let b = f.predict(&SIX_DATES).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_input_order_irrelevant() {
        let f = neutral();
        let mut shuffled = SIX_DATES;
        shuffled.reverse();
        assert_eq!(f.predict(&SIX_DATES).unwrap(), f.predict(&shuffled).unwrap());
    }

    #[test]
    fn test_duplicates_do_not_count_as_cycles() {
        let f = neutral();
        let with_dup = f
            .predict(&["2026-01-01", "2026-01-29", "2026-01-29"])
            .unwrap();
        let without = f.predict(&["2026-01-01", "2026-01-29"]).unwrap();
        assert_eq!(with_dup.window, without.window);
        assert_eq!(with_dup.usable_gaps, 1);
    }
}
