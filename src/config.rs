//! Configuration file support for the `filestream` CLI.
//!
//! Loaded from `<config_dir>/filestream/config.toml`:
//!
//! ```toml
//! [hints]
//! unbuffered = false
//! memory_map = true
//! ```

use crate::error::{FileStreamError, Result};
use crate::stream::AccessHints;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Hints applied when no hint flags are given on the command line
    pub hints: AccessHints,
}

impl CliConfig {
    /// Default location of the configuration file, if the platform has one
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("filestream").join("config.toml"))
    }

    /// Load from the default location; a missing file yields the defaults
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            FileStreamError::file_error(format!("Failed to read config: {}", path.display()), e)
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| FileStreamError::invalid_argument(format!("Invalid config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hints() {
        let config = CliConfig::parse("[hints]\nmemory_map = true\n").unwrap();
        assert_eq!(config.hints, AccessHints::MEMORY_MAP);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(CliConfig::parse("").unwrap(), CliConfig::default());
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(CliConfig::parse("hints = 3").is_err());
    }
}
