//! TOML configuration stored as `sympto.toml` in the data directory.
//!
//! ```toml
//! [analysis]
//! window = 30        # most recent records analyzed
//!
//! [profile]
//! user = 1           # user id used when none is given
//!
//! [input]
//! min_temperature = 35.0
//! max_temperature = 40.0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sympto_core::DEFAULT_WINDOW;

use crate::error::{Result, StoreError};

pub const CONFIG_FILE: &str = "sympto.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_window")]
    pub window: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_user")]
    pub user: i64,
}

/// Plausible range for entered temperatures (°C). Only input collaborators
/// check it; the analysis accepts any number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_min_temperature")]
    pub min_temperature: f64,
    #[serde(default = "default_max_temperature")]
    pub max_temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub input: InputConfig,
}

fn default_window() -> usize {
    DEFAULT_WINDOW
}
fn default_user() -> i64 {
    1
}
fn default_min_temperature() -> f64 {
    35.0
}
fn default_max_temperature() -> f64 {
    40.0
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            user: default_user(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            min_temperature: default_min_temperature(),
            max_temperature: default_max_temperature(),
        }
    }
}

impl Config {
    pub fn path(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE)
    }

    /// Load from `dir`; a missing file yields the defaults.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = Self::path(dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let content =
            toml::to_string_pretty(self).map_err(|e| StoreError::Config(e.to_string()))?;
        fs::write(Self::path(dir), content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.input.min_temperature >= self.input.max_temperature {
            return Err(StoreError::Config(format!(
                "input.min_temperature ({}) must be below input.max_temperature ({})",
                self.input.min_temperature, self.input.max_temperature
            )));
        }
        Ok(())
    }
}
