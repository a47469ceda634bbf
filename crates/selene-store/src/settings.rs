use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use selene_core::{
    CONFIDENCE_CAP, EngineConfig, Forecaster, MAX_CYCLE_DAYS, MIN_CYCLE_DAYS, SequenceModel,
};

use crate::error::{Result, StoreError};
use crate::store::HistoryStore;

pub const CONFIG_FILE: &str = "config.toml";
pub const HISTORY_FILE: &str = "period_data.json";
pub const MODEL_FILE: &str = "cycle_model.json";

/// Seed for untrained parameters when `model_seed` is not configured.
pub const DEFAULT_MODEL_SEED: u64 = 0;

pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".selene")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Optional `config.toml` in the data directory.
///
/// ```toml
/// model_path = "models/cycle_model.json"
/// model_seed = 7
///
/// [engine]
/// min_cycle_days = 21
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub model_path: Option<PathBuf>,
    pub model_seed: Option<u64>,
    pub engine: EngineConfig,
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read `<base>/config.toml`, or defaults when absent.
    pub fn load(base: &Path) -> Result<Self> {
        let path = base.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)?;
        let settings = Self::from_toml_str(&raw)?;
        tracing::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// The cycle band and confidence cap may be narrowed but never widened.
    fn validate(&self) -> Result<()> {
        let e = &self.engine;
        if e.min_cycle_days < MIN_CYCLE_DAYS || e.max_cycle_days > MAX_CYCLE_DAYS {
            return Err(StoreError::InvalidData(format!(
                "engine cycle band {}..{} must lie within {MIN_CYCLE_DAYS}..{MAX_CYCLE_DAYS}",
                e.min_cycle_days, e.max_cycle_days
            )));
        }
        if e.min_cycle_days > e.max_cycle_days {
            return Err(StoreError::InvalidData(format!(
                "engine.min_cycle_days ({}) exceeds engine.max_cycle_days ({})",
                e.min_cycle_days, e.max_cycle_days
            )));
        }
        if !(0.0..=CONFIDENCE_CAP).contains(&e.confidence_cap) {
            return Err(StoreError::InvalidData(format!(
                "engine.confidence_cap must be within [0, {CONFIDENCE_CAP}], got {}",
                e.confidence_cap
            )));
        }
        if e.model_window == 0 {
            return Err(StoreError::InvalidData(
                "engine.model_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load a model artifact, or fall back to seeded untrained parameters when
/// the file does not exist. Untrained parameters never drive a forecast; the
/// engine uses its statistical estimate instead. An artifact that exists but
/// cannot be used is an error rather than a silent fallback.
pub fn load_model(path: &Path, seed: Option<u64>) -> Result<SequenceModel> {
    if !path.exists() {
        let seed = seed.unwrap_or(DEFAULT_MODEL_SEED);
        tracing::info!(
            "no model artifact at {}, using untrained parameters (seed {seed})",
            path.display()
        );
        return Ok(SequenceModel::untrained(seed));
    }
    let raw = fs::read_to_string(path)?;
    let model = SequenceModel::from_json(&raw)
        .map_err(|e| StoreError::InvalidData(format!("{}: {e}", path.display())))?;
    tracing::info!("loaded model artifact from {}", path.display());
    Ok(model)
}

/// Data directory with its settings.
pub struct DataDir {
    base: PathBuf,
    settings: Settings,
}

impl DataDir {
    /// Open (creating if needed) the data directory. `base_dir` overrides
    /// the default `~/.selene`.
    pub fn open(base_dir: Option<&Path>) -> Result<Self> {
        let base = base_dir.map(PathBuf::from).unwrap_or_else(default_base_dir);
        fs::create_dir_all(&base).map_err(|e| {
            StoreError::InvalidData(format!("failed to create {}: {e}", base.display()))
        })?;
        let settings = Settings::load(&base)?;
        Ok(Self { base, settings })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn history_path(&self) -> PathBuf {
        self.base.join(HISTORY_FILE)
    }

    pub fn history_store(&self) -> Result<HistoryStore> {
        HistoryStore::open(&self.history_path())
    }

    /// Explicit override first, then `model_path` from settings (relative
    /// paths resolve against the data directory), then the default file.
    pub fn model_path(&self, explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        match &self.settings.model_path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => self.base.join(p),
            None => self.base.join(MODEL_FILE),
        }
    }

    pub fn forecaster(&self, model_override: Option<&Path>) -> Result<Forecaster> {
        let model = load_model(&self.model_path(model_override), self.settings.model_seed)?;
        Ok(Forecaster::new(model, self.settings.engine.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selene_core::LstmCycleModel;
    use tempfile::TempDir;

    #[test]
    fn test_settings_defaults_when_missing() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.engine, EngineConfig::default());
    }

    #[test]
    fn test_settings_partial_engine_table() {
        let settings = Settings::from_toml_str(
            r#"
model_seed = 7

[engine]
min_cycle_days = 21
"#,
        )
        .unwrap();
        assert_eq!(settings.model_seed, Some(7));
        assert_eq!(settings.engine.min_cycle_days, 21);
        assert_eq!(settings.engine.max_cycle_days, 40);
    }

    #[test]
    fn test_settings_rejects_inverted_band() {
        let err = Settings::from_toml_str("[engine]\nmin_cycle_days = 45\n").unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[test]
    fn test_settings_rejects_widened_limits() {
        for raw in [
            "[engine]\nmin_cycle_days = 1\n",
            "[engine]\nmax_cycle_days = 90\n",
            "[engine]\nconfidence_cap = 1.0\n",
            "[engine]\nconfidence_cap = 1.0\nmin_cycle_days = 1\nmax_cycle_days = 90\n",
        ] {
            assert!(
                matches!(Settings::from_toml_str(raw), Err(StoreError::InvalidData(_))),
                "accepted {raw:?}"
            );
        }
        let narrowed =
            Settings::from_toml_str("[engine]\nmin_cycle_days = 22\nconfidence_cap = 0.9\n")
                .unwrap();
        assert_eq!(narrowed.engine.min_cycle_days, 22);
    }

    #[test]
    fn test_settings_rejects_unknown_keys() {
        assert!(matches!(
            Settings::from_toml_str("colour = \"red\"\n"),
            Err(StoreError::Toml(_))
        ));
    }

    #[test]
    fn test_model_path_resolution() {
        let dir = TempDir::new().unwrap();
        let data = DataDir::open(Some(dir.path())).unwrap();
        assert_eq!(data.model_path(None), dir.path().join(MODEL_FILE));
        assert_eq!(
            data.model_path(Some(Path::new("/tmp/other.json"))),
            PathBuf::from("/tmp/other.json")
        );

        fs::write(
            dir.path().join(CONFIG_FILE),
            "model_path = \"models/m.json\"\n",
        )
        .unwrap();
        let data = DataDir::open(Some(dir.path())).unwrap();
        assert_eq!(data.model_path(None), dir.path().join("models/m.json"));
    }

    #[test]
    fn test_missing_model_is_untrained() {
        let dir = TempDir::new().unwrap();
        let model = load_model(&dir.path().join("absent.json"), Some(3)).unwrap();
        assert!(matches!(model, SequenceModel::Untrained(_)));
        assert_eq!(model, SequenceModel::untrained(3));
    }

    #[test]
    fn test_unseeded_untrained_is_stable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        assert_eq!(
            load_model(&path, None).unwrap(),
            load_model(&path, None).unwrap()
        );
    }

    #[test]
    fn test_default_setup_rich_forecast_near_28() {
        let dir = TempDir::new().unwrap();
        let data = DataDir::open(Some(dir.path())).unwrap();
        let dates = [
            "2026-01-01",
            "2026-01-29",
            "2026-02-26",
            "2026-03-27",
            "2026-04-24",
            "2026-05-22",
        ];
        let fc = data.forecaster(None).unwrap().predict(&dates).unwrap();
        assert_eq!(fc.mode, selene_core::HistoryMode::Rich);
        assert!((fc.cycle_length - 28.0).abs() <= 1.0, "{}", fc.cycle_length);
        assert!(fc.confidence() > 0.8);
        let last = selene_core::parse_date("2026-05-22").unwrap();
        let lo = fc.earliest().signed_duration_since(last).num_days();
        let hi = fc.latest().signed_duration_since(last).num_days();
        assert!((27..=29).contains(&lo) && (27..=29).contains(&hi), "{lo}..{hi}");
    }

    #[test]
    fn test_valid_model_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MODEL_FILE);
        fs::write(&path, LstmCycleModel::constant(4, 1, 30.0).to_json().unwrap()).unwrap();
        let model = load_model(&path, None).unwrap();
        assert!(matches!(model, SequenceModel::Loaded(_)));
    }

    #[test]
    fn test_corrupt_model_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MODEL_FILE);
        fs::write(&path, "{\"hidden_size\": 4}").unwrap();
        assert!(matches!(
            load_model(&path, None),
            Err(StoreError::InvalidData(_))
        ));
    }

    #[test]
    fn test_forecaster_uses_engine_settings() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "model_seed = 1\n[engine]\nfallback_half_spread = 3\n",
        )
        .unwrap();
        let data = DataDir::open(Some(dir.path())).unwrap();
        let fc = data
            .forecaster(None)
            .unwrap()
            .predict(&["2026-01-01", "2026-01-29"])
            .unwrap();
        assert_eq!(fc.window.span_days(), 7);
    }
}
