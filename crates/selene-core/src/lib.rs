//! Selene cycle forecasting engine.
//!
//! Turns a sparse, unordered history of occurrence start dates into a
//! predicted window for the next occurrence with a confidence score. A
//! recency-weighted statistical baseline is blended with a fixed recurrent
//! model once enough history exists.
//!
//! Zero I/O. Pure math engine with no opinions about transport or persistence.

pub mod baseline;
pub mod config;
pub mod constants;
pub mod error;
pub mod forecast;
pub mod history;
pub mod model;
pub mod phase;
pub mod sequence;

pub use baseline::{
    BaselineEstimate, BaselineEstimator, PredictionWindow, confidence, dispersion,
    weighted_mean, window_offsets,
};
pub use config::EngineConfig;
pub use constants::{
    CONFIDENCE_CAP, DATE_FORMAT, DEFAULT_CYCLE_LENGTH, MAX_CYCLE_DAYS, MIN_CYCLE_DAYS,
};
pub use error::{ForecastError, ModelError, Result};
pub use forecast::{Forecast, Forecaster, HistoryMode};
pub use history::{CycleHistory, diff_between_dates, parse_date};
pub use model::{CycleModel, LstmCycleModel, SequenceModel};
pub use phase::{DaySignals, Phase, PhaseInput, estimate_ovulation, estimate_phase};
pub use sequence::SequenceEstimator;
