use std::fmt;

/// Failures a forecast request can surface to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecastError {
    /// A supplied date string is not a `YYYY-MM-DD` calendar date.
    MalformedDate { input: String },
    /// Fewer than two distinct dates, so no cycle length can be measured.
    InsufficientHistory { usable_gaps: usize },
    /// Adding the predicted offset ran past the calendar's range.
    DateOutOfRange,
}

impl fmt::Display for ForecastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastError::MalformedDate { input } => {
                write!(f, "malformed date {input:?}: expected YYYY-MM-DD")
            }
            ForecastError::InsufficientHistory { usable_gaps } => {
                write!(f, "not enough history: {usable_gaps} usable cycle gaps")
            }
            ForecastError::DateOutOfRange => write!(f, "predicted date out of range"),
        }
    }
}

impl std::error::Error for ForecastError {}

/// Internal failures of the sequence model. Always recovered by the
/// sequence estimator; never part of a forecast result.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// No trained parameters were loaded.
    Untrained,
    EmptyWindow,
    Shape { what: &'static str, expected: usize, got: usize },
    NonFinite(f64),
    InvalidArtifact(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Untrained => write!(f, "no trained model loaded"),
            ModelError::EmptyWindow => write!(f, "empty input window"),
            ModelError::Shape {
                what,
                expected,
                got,
            } => write!(f, "shape mismatch in {what}: expected {expected}, got {got}"),
            ModelError::NonFinite(v) => write!(f, "non-finite model output: {v}"),
            ModelError::InvalidArtifact(msg) => write!(f, "invalid model artifact: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ForecastError>;
