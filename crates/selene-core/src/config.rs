use serde::{Deserialize, Serialize};

use crate::constants::{
    CONFIDENCE_CAP, FALLBACK_HALF_SPREAD, MAX_CYCLE_DAYS, MIN_CYCLE_DAYS, MODEL_MIN_GAPS,
    MODEL_WINDOW, RICH_HISTORY_MIN_DATES,
};

/// Tunables for the forecasting engine. Missing fields in a config file
/// fall back to the built-in constants.
///
/// The cycle band and confidence cap may only be tightened: values outside
/// [`MIN_CYCLE_DAYS`, `MAX_CYCLE_DAYS`] or above [`CONFIDENCE_CAP`] are
/// ignored in favour of those limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_cycle_days: i64,
    pub max_cycle_days: i64,
    pub fallback_half_spread: i64,
    pub rich_history_min_dates: usize,
    pub model_min_gaps: usize,
    pub model_window: usize,
    pub confidence_cap: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_cycle_days: MIN_CYCLE_DAYS,
            max_cycle_days: MAX_CYCLE_DAYS,
            fallback_half_spread: FALLBACK_HALF_SPREAD,
            rich_history_min_dates: RICH_HISTORY_MIN_DATES,
            model_min_gaps: MODEL_MIN_GAPS,
            model_window: MODEL_WINDOW,
            confidence_cap: CONFIDENCE_CAP,
        }
    }
}

impl EngineConfig {
    /// Effective `(min, max)` cycle band, never wider than 20..=40.
    pub fn cycle_band(&self) -> (i64, i64) {
        (
            self.min_cycle_days.max(MIN_CYCLE_DAYS),
            self.max_cycle_days.min(MAX_CYCLE_DAYS),
        )
    }

    /// Effective confidence ceiling, never above 0.95.
    pub fn effective_confidence_cap(&self) -> f64 {
        self.confidence_cap.min(CONFIDENCE_CAP)
    }

    /// Clamp a day offset into the plausible cycle band.
    pub fn clamp_days(&self, days: i64) -> i64 {
        let (lo, hi) = self.cycle_band();
        days.max(lo).min(hi)
    }

    /// Clamp a real-valued cycle length into the plausible cycle band.
    pub fn clamp_length(&self, length: f64) -> f64 {
        let (lo, hi) = self.cycle_band();
        length.max(lo as f64).min(hi as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"max_cycle_days": 45}"#).unwrap();
        assert_eq!(cfg.max_cycle_days, 45);
        assert_eq!(cfg.min_cycle_days, MIN_CYCLE_DAYS);
        assert_eq!(cfg.model_window, MODEL_WINDOW);
    }

    #[test]
    fn test_clamp_days() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.clamp_days(3), 20);
        assert_eq!(cfg.clamp_days(29), 29);
        assert_eq!(cfg.clamp_days(90), 40);
    }

    #[test]
    fn test_clamp_length() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.clamp_length(-1.0), 20.0);
        assert_eq!(cfg.clamp_length(27.5), 27.5);
        assert_eq!(cfg.clamp_length(41.2), 40.0);
    }

    #[test]
    fn test_limits_cannot_be_widened() {
        let cfg = EngineConfig {
            min_cycle_days: 1,
            max_cycle_days: 90,
            confidence_cap: 1.0,
            ..EngineConfig::default()
        };
        assert_eq!(cfg.cycle_band(), (20, 40));
        assert_eq!(cfg.clamp_days(87), 40);
        assert_eq!(cfg.clamp_days(2), 20);
        assert_eq!(cfg.clamp_length(88.0), 40.0);
        assert_eq!(cfg.effective_confidence_cap(), 0.95);
    }

    #[test]
    fn test_limits_can_be_tightened() {
        let cfg = EngineConfig {
            min_cycle_days: 24,
            max_cycle_days: 35,
            confidence_cap: 0.8,
            ..EngineConfig::default()
        };
        assert_eq!(cfg.clamp_days(21), 24);
        assert_eq!(cfg.clamp_days(38), 35);
        assert_eq!(cfg.effective_confidence_cap(), 0.8);
    }
}
