//! Configuration types (overrider.toml format).

use crate::error::{DriverError, Result};
use overrider_tweak::EmitPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up next to the input file.
pub const CONFIG_FILE_NAME: &str = "overrider.toml";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// How generated overrides are written.
    #[serde(default)]
    pub emit: EmitPolicy,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| DriverError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| DriverError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `overrider.toml` in the directory containing `input`, if present.
    pub fn discover(input: &Path) -> Option<PathBuf> {
        let dir = match input.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let candidate = dir.join(CONFIG_FILE_NAME);
        candidate.is_file().then_some(candidate)
    }

    /// The configuration for `input`: the explicit file if given, else a
    /// discovered one, else defaults.
    pub fn for_input(input: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(input),
        };
        match path {
            Some(path) => {
                debug!(config = %path.display(), "loading config");
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }
}
