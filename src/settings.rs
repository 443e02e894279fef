//! # Settings Module
//!
//! ## Purpose
//! Run settings of the reaction kinetics core kept in a small JSON file: the
//! environmental state the rate constants are refreshed at, which species are solver
//! variables and how verbose the log is.
//!
//! ## Configuration Format
//! ```json
//! {
//!   "env": { "temperature": 298.15, "pressure": 101325.0 },
//!   "tracked_species": [0, 2],
//!   "log_level": "info"
//! }
//! ```
//! Every field is optional; missing fields take their defaults. With no
//! `tracked_species` list every species is a solver variable.
//!
//! ## Usage Pattern
//! ```rust,no_run
//! use KiTheRxn::settings::{DEFAULT_SETTINGS_FILE, KineticsSettings};
//!
//! let settings = KineticsSettings::load_or_default(DEFAULT_SETTINGS_FILE);
//! let tracked = settings.tracked_mask(4).unwrap();
//! ```

use crate::Kinetics::env_state::EnvState;
use crate::Kinetics::rxn_errors::RxnError;
use log::{LevelFilter, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_SETTINGS_FILE: &str = "kinetics_settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KineticsSettings {
    /// environmental state used for the rate constant refresh
    pub env: EnvState,
    /// indices of the species that are solver variables; `None` means all of them
    pub tracked_species: Option<Vec<usize>>,
    /// one of off, error, warn, info, debug, trace
    pub log_level: String,
}

impl Default for KineticsSettings {
    fn default() -> Self {
        Self {
            env: EnvState::default(),
            tracked_species: None,
            log_level: "info".to_string(),
        }
    }
}

impl KineticsSettings {
    /// Reads settings from a JSON file.
    ///
    /// # Returns
    /// * `Ok(KineticsSettings)` - parsed settings
    /// * `Err(RxnError::Io | RxnError::Serde)` - missing file or invalid JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RxnError> {
        let content = fs::read_to_string(path)?;
        let settings: KineticsSettings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Reads settings from a JSON file, falling back to the defaults when the file is
    /// missing or cannot be parsed
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("no settings file {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("failed to read settings from {}: {}; using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), RxnError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// log level parsed from `log_level`; unknown names give `Info`
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    /// per-species solver-variable flags for a mechanism with `n_species` species
    pub fn tracked_mask(&self, n_species: usize) -> Result<Vec<bool>, RxnError> {
        match &self.tracked_species {
            None => Ok(vec![true; n_species]),
            Some(indices) => {
                let mut mask = vec![false; n_species];
                for &index in indices {
                    if index >= n_species {
                        return Err(RxnError::SpeciesOutOfRange { index, n_species });
                    }
                    mask[index] = true;
                }
                Ok(mask)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_save_and_load() {
        let settings = KineticsSettings {
            env: EnvState::new(250.0, 60000.0),
            tracked_species: Some(vec![0, 2]),
            log_level: "debug".to_string(),
        };
        let file = NamedTempFile::new().unwrap();
        settings.save(file.path()).unwrap();
        let loaded = KineticsSettings::load(file.path()).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.level_filter(), LevelFilter::Debug);
    }

    #[test]
    fn test_partial_file_takes_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"tracked_species": [1]}}"#).unwrap();
        let loaded = KineticsSettings::load(file.path()).unwrap();
        assert_eq!(loaded.env, EnvState::default());
        assert_eq!(loaded.log_level, "info");
        assert_eq!(loaded.tracked_mask(3).unwrap(), vec![false, true, false]);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(KineticsSettings::load(file.path()), Err(RxnError::Serde(_))));
        assert_eq!(KineticsSettings::load_or_default(file.path()), KineticsSettings::default());
        assert_eq!(
            KineticsSettings::load_or_default("definitely_missing_settings.json"),
            KineticsSettings::default()
        );
    }

    #[test]
    fn test_tracked_mask() {
        let settings = KineticsSettings::default();
        assert_eq!(settings.tracked_mask(2).unwrap(), vec![true, true]);
        let settings = KineticsSettings {
            tracked_species: Some(vec![5]),
            ..Default::default()
        };
        assert!(matches!(
            settings.tracked_mask(3),
            Err(RxnError::SpeciesOutOfRange { index: 5, n_species: 3 })
        ));
    }

    #[test]
    fn test_unknown_level_is_info() {
        let settings = KineticsSettings {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.level_filter(), LevelFilter::Info);
    }
}
