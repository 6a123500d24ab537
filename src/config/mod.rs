//! Configuration for vimflowy.
//!
//! Settings live in `~/.config/vimflowy/config.toml`. Every field has a
//! default, so a partial file (or no file at all) is fine.
//!
//! # Example
//!
//! ```
//! use vimflowy::config::Config;
//!
//! let config = Config::default();
//! assert_eq!(config.search_retry_delay_ms, 200);
//! assert_eq!(config.search_retry_limit, None);
//!
//! let custom: Config = toml::from_str("debug = true").unwrap();
//! assert!(custom.debug);
//! assert_eq!(custom.floating_header_height, 30.0);
//! ```

use crate::input::keys::DEFAULT_ESCAPE_ALIASES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runtime settings.
///
/// * `debug` - Start with verbose dispatch tracing on (default: false)
/// * `search_retry_delay_ms` - Delay between attempts to focus the first
///   search result (default: 200)
/// * `search_retry_limit` - Give up after this many retries; unset retries
///   until superseded (default: unset)
/// * `floating_header_height` - Height of the fixed header covering the top
///   of the viewport (default: 30.0)
/// * `escape_aliases` - Key spellings treated as escape
/// * `sequence_length` - Keys remembered for multi-key bindings (default: 2)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_search_retry_delay_ms")]
    pub search_retry_delay_ms: u64,

    #[serde(default)]
    pub search_retry_limit: Option<u32>,

    #[serde(default = "default_floating_header_height")]
    pub floating_header_height: f64,

    #[serde(default = "default_escape_aliases")]
    pub escape_aliases: Vec<String>,

    #[serde(default = "default_sequence_length")]
    pub sequence_length: usize,
}

fn default_search_retry_delay_ms() -> u64 {
    200
}

fn default_floating_header_height() -> f64 {
    30.0
}

fn default_escape_aliases() -> Vec<String> {
    DEFAULT_ESCAPE_ALIASES.iter().map(|s| s.to_string()).collect()
}

fn default_sequence_length() -> usize {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            search_retry_delay_ms: default_search_retry_delay_ms(),
            search_retry_limit: None,
            floating_header_height: default_floating_header_height(),
            escape_aliases: default_escape_aliases(),
            sequence_length: default_sequence_length(),
        }
    }
}

impl Config {
    pub fn search_retry_delay(&self) -> Duration {
        Duration::from_millis(self.search_retry_delay_ms)
    }

    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/vimflowy/config.toml` on all platforms.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("vimflowy");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Loads configuration from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("ignoring invalid config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("could not read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Saves configuration to the default config file.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&config_path)
    }

    /// Writes configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_is_unbounded_by_default() {
        assert_eq!(Config::default().search_retry_limit, None);
    }

    #[test]
    fn test_escape_aliases_default() {
        assert_eq!(
            Config::default().escape_aliases,
            vec!["Escape", "Esc", "ctrl-["]
        );
    }
}
