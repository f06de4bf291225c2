//! User configuration
//!
//! Read from `config.toml` in the platform config directory
//! (`$XDG_CONFIG_HOME/allocation/config.toml` on Linux) unless a path is
//! given explicitly. Every field is optional.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::AllocationError;

pub const DEFAULT_ACCOUNT_PREFIX: &str = "Asset:";
pub const DEFAULT_CURRENCY: &str = "INR";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// SQLite database location; `~/.allocation/data.db` when unset
    pub db_path: Option<PathBuf>,
    /// Only accounts starting with this prefix enter the allocation report
    pub account_prefix: String,
    /// Commodity whose postings are valued at their ledger amount
    pub default_currency: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            account_prefix: DEFAULT_ACCOUNT_PREFIX.to_string(),
            default_currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AllocationError::Config(e.to_string()).into())
    }

    /// Load from `path`. A missing file means defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config file {:?}", path))
    }

    /// Load from an explicit path, or from the default location
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AllocationError::Config(format!(
                        "config file {:?} does not exist",
                        path
                    ))
                    .into());
                }
                Self::load_from(path)
            }
            None => match default_config_path() {
                Some(path) => Self::load_from(&path),
                None => Ok(Self::default()),
            },
        }
    }
}

/// `<config dir>/allocation/config.toml`, when a config dir can be determined
pub fn default_config_path() -> Option<PathBuf> {
    dir_spec::config_home().map(|dir| dir.join("allocation").join("config.toml"))
}
