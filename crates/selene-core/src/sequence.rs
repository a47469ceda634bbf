//! Sequence Estimator: the learned next-gap prediction with its fallbacks.

use crate::baseline::weighted_mean;
use crate::config::EngineConfig;
use crate::error::{ForecastError, ModelError, Result};
use crate::model::CycleModel;

/// Wraps a [`CycleModel`] with the history-length precondition and the
/// weighted-mean fallback. Model failures never reach the caller.
pub struct SequenceEstimator<'a, M: CycleModel + ?Sized> {
    model: &'a M,
    config: &'a EngineConfig,
}

impl<'a, M: CycleModel + ?Sized> SequenceEstimator<'a, M> {
    pub fn new(model: &'a M, config: &'a EngineConfig) -> Self {
        Self { model, config }
    }

    /// Predicted next gap length in days.
    ///
    /// Below `model_min_gaps` this is exactly the baseline weighted mean.
    /// Otherwise the model sees the `model_window` most recent gaps and its
    /// answer is clamped into the cycle band; if it fails, the weighted mean
    /// over the full history is returned instead.
    pub fn predict_next_gap(&self, gaps: &[i64]) -> Result<f64> {
        let fallback = weighted_mean(gaps).ok_or(ForecastError::InsufficientHistory {
            usable_gaps: gaps.len(),
        })?;

        if gaps.len() < self.config.model_min_gaps {
            return Ok(fallback);
        }

        let start = gaps.len().saturating_sub(self.config.model_window);
        let window: Vec<f64> = gaps[start..].iter().map(|&g| g as f64).collect();

        match self.model.forward(&window) {
            Ok(raw) => {
                let clamped = self.config.clamp_length(raw);
                tracing::debug!(
                    raw,
                    clamped,
                    window = window.len(),
                    trained = self.model.is_trained(),
                    "sequence model prediction"
                );
                Ok(clamped)
            }
            Err(ModelError::Untrained) => {
                tracing::debug!("no trained sequence model, using weighted mean");
                Ok(fallback)
            }
            Err(e) => {
                tracing::warn!("sequence model unavailable, using weighted mean: {e}");
                Ok(fallback)
            }
        }
    }
}
