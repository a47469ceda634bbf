//! Persistence and local settings for selene.
//!
//! Keeps the period log as a JSON document, reads `config.toml` from the data
//! directory and resolves the sequence model artifact for the engine.

pub mod error;
pub mod settings;
pub mod store;

pub use error::{Result, StoreError};
pub use settings::{
    CONFIG_FILE, DEFAULT_MODEL_SEED, DataDir, HISTORY_FILE, MODEL_FILE, Settings, default_base_dir,
    load_model,
};
pub use store::{HistoryData, HistoryStats, HistoryStore, NaivePrediction, PeriodEntry};
