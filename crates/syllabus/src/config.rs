//! Configuration schema for syllabus
//!
//! Config lives at `.syllabus/config.yaml` relative to the vault root. Every
//! field is optional; a vault without a config file runs on the defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Result, WrapErr};
use facet::Facet;
use tracing::debug;

/// Location of the config file inside a vault.
pub const CONFIG_PATH: &str = ".syllabus/config.yaml";

/// Default quiet period before queued changes are drained.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Root configuration
#[derive(Debug, Clone, Default, Facet)]
pub struct Config {
    /// Folder (relative to the vault root) where linked notes are looked up
    /// by name. Defaults to the vault root itself.
    #[facet(default)]
    pub notes_dir: Option<String>,

    /// Quiet period, in milliseconds, that a burst of change notifications
    /// must settle for before it is processed.
    #[facet(default)]
    pub debounce_ms: Option<u64>,
}

impl Config {
    pub fn notes_dir(&self) -> PathBuf {
        PathBuf::from(self.notes_dir.as_deref().unwrap_or("."))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS))
    }
}

/// Load the config of the vault at `vault_root`.
///
/// A missing file yields the defaults; an unreadable or malformed one is an
/// error.
pub fn load_config(vault_root: &Path) -> Result<Config> {
    let path = vault_root.join(CONFIG_PATH);
    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&path)
        .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
        .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<Config> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = facet_yaml::from_str(content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.notes_dir(), PathBuf::from("."));
        assert_eq!(config.debounce(), Duration::from_millis(DEFAULT_DEBOUNCE_MS));
    }

    #[test]
    fn test_parse_fields() {
        let config = parse_config("notes_dir: notes\ndebounce_ms: 250\n").unwrap();
        assert_eq!(config.notes_dir(), PathBuf::from("notes"));
        assert_eq!(config.debounce(), Duration::from_millis(250));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert!(config.notes_dir.is_none());
    }
}
