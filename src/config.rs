//! TOML configuration.
//!
//! ```toml
//! [sheet]
//! rows = 500
//! viewport_rows = 40
//! retention_margin = 50
//! ```
//!
//! Every key is optional; anything left out keeps its default. Viewport
//! sizes above the render limits are clamped on load.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use gridcalc_core::{SheetSettings, Workbook};

use crate::error::{ConfigError, Result};

const MAX_CONFIG_FILE_BYTES: u64 = 64 * 1024;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sheet: SheetSettings,
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Config> {
        let mut config: Config = toml::from_str(content)?;
        let clamped = config.sheet.clone().clamped();
        if clamped != config.sheet {
            warn!(
                "viewport {}x{} clamped to {}x{}",
                config.sheet.viewport_rows, config.sheet.viewport_cols, clamped.viewport_rows, clamped.viewport_cols
            );
            config.sheet = clamped;
        }
        Ok(config)
    }

    /// Read a config file. A file that does not exist yields the defaults.
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let size = std::fs::metadata(path)?.len();
        if size > MAX_CONFIG_FILE_BYTES {
            return Err(ConfigError::TooLarge {
                path: path.to_path_buf(),
                size,
                max: MAX_CONFIG_FILE_BYTES,
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config = Config::from_toml_str(&content)?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from [`default_path`], or the defaults when there is no config dir.
    pub fn load_default() -> Result<Config> {
        match default_path() {
            Some(path) => Config::load(&path),
            None => Ok(Config::default()),
        }
    }

    /// A fresh workbook using these settings.
    pub fn workbook(&self) -> Workbook {
        Workbook::with_settings(self.sheet.clone())
    }
}

/// `<config dir>/gridcalc/config.toml`
pub fn default_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "gridcalc")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}
