/// Shortest plausible cycle, in days. Window offsets never go below this.
pub const MIN_CYCLE_DAYS: i64 = 20;

/// Longest plausible cycle, in days. Window offsets never exceed this.
pub const MAX_CYCLE_DAYS: i64 = 40;

/// Half-width of the window when the gaps show no dispersion.
pub const FALLBACK_HALF_SPREAD: i64 = 2;

/// Histories with at least this many dates blend in the sequence model.
pub const RICH_HISTORY_MIN_DATES: usize = 5;

/// The sequence model needs at least this many gaps to run.
pub const MODEL_MIN_GAPS: usize = 3;

/// Most recent gaps fed to the sequence model.
pub const MODEL_WINDOW: usize = 10;

/// Confidence never reaches certainty.
pub const CONFIDENCE_CAP: f64 = 0.95;

/// Cycle length assumed before any history exists.
pub const DEFAULT_CYCLE_LENGTH: u32 = 28;

/// Days between ovulation and the next period start.
pub const LUTEAL_DAYS: i64 = 14;

/// Calendar date wire format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// LSTM hidden width.
pub const HIDDEN_SIZE: usize = 32;

/// Stacked LSTM layers.
pub const NUM_LAYERS: usize = 2;
