use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::{
    goal::{DEFAULT_TOLERANCE_KG, StatusBands},
    session::DEFAULT_REST_SECONDS,
};

pub const KNOWN_KEYS: &[&str] = &[
    "data_dir",
    "db_path",
    "catalog_path",
    "rest_seconds",
    "goal_tolerance_kg",
    "goal_ahead_margin",
    "goal_behind_margin",
    "log_level",
];

/// Flat key/value store backing `stamina config`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    pub map: BTreeMap<String, String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join("stamina").join("config"))
            .context("Could not determine config directory")
    }

    /// A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        let raw = toml::to_string(self)?;
        fs::write(path, raw).with_context(|| format!("Failed to write config {}", path.display()))
    }

    fn parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.map
            .get(key)
            .map(|raw| {
                raw.trim()
                    .parse::<T>()
                    .map_err(|e| anyhow!("config key `{key}` has invalid value `{raw}`: {e}"))
            })
            .transpose()
    }
}

/// Typed view of [`Config`] with defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub rest_seconds: u32,
    pub goal_tolerance_kg: f64,
    pub bands: StatusBands,
    pub log_level: String,
}

impl Settings {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let data_dir = match cfg.parsed::<PathBuf>("data_dir")? {
            Some(dir) => dir,
            None => dirs::data_dir()
                .map(|d| d.join("stamina"))
                .context("Could not determine data directory")?,
        };
        let db_path = cfg
            .parsed::<PathBuf>("db_path")?
            .unwrap_or_else(|| data_dir.join("stamina.db"));

        let defaults = StatusBands::default();
        Ok(Self {
            db_path,
            catalog_path: cfg.parsed("catalog_path")?,
            rest_seconds: cfg.parsed("rest_seconds")?.unwrap_or(DEFAULT_REST_SECONDS),
            goal_tolerance_kg: cfg.parsed("goal_tolerance_kg")?.unwrap_or(DEFAULT_TOLERANCE_KG),
            bands: StatusBands {
                ahead_margin: cfg.parsed("goal_ahead_margin")?.unwrap_or(defaults.ahead_margin),
                behind_margin: cfg.parsed("goal_behind_margin")?.unwrap_or(defaults.behind_margin),
            },
            log_level: cfg.parsed("log_level")?.unwrap_or_else(|| "warn".to_string()),
            data_dir,
        })
    }

    pub fn profile_path(&self) -> PathBuf {
        self.data_dir.join("profile.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_every_unset_key() {
        let mut cfg = Config::default();
        cfg.map.insert("data_dir".into(), "/tmp/stamina-test".into());

        let s = Settings::from_config(&cfg).unwrap();
        assert_eq!(s.db_path, PathBuf::from("/tmp/stamina-test/stamina.db"));
        assert_eq!(s.rest_seconds, 60);
        assert_eq!(s.goal_tolerance_kg, 0.5);
        assert_eq!(s.bands, StatusBands::default());
        assert_eq!(s.log_level, "warn");
        assert!(s.catalog_path.is_none());
        assert_eq!(s.profile_path(), PathBuf::from("/tmp/stamina-test/profile.toml"));
    }

    #[test]
    fn bad_value_names_the_key() {
        let mut cfg = Config::default();
        cfg.map.insert("data_dir".into(), "/tmp/x".into());
        cfg.map.insert("rest_seconds".into(), "ninety".into());

        let err = Settings::from_config(&cfg).unwrap_err().to_string();
        assert!(err.contains("rest_seconds"), "{err}");
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stamina").join("config");
        assert_eq!(Config::load(&path).unwrap(), Config::default());

        let mut cfg = Config::default();
        cfg.map.insert("rest_seconds".into(), "90".into());
        cfg.map.insert("goal_ahead_margin".into(), "0.2".into());
        cfg.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, cfg);
        let mut with_dir = loaded.clone();
        with_dir.map.insert("data_dir".into(), dir.path().display().to_string());
        let s = Settings::from_config(&with_dir).unwrap();
        assert_eq!(s.rest_seconds, 90);
        assert_eq!(s.bands.ahead_margin, 0.2);
    }
}
