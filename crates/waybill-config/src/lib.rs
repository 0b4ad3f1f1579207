//! Configuration file handling for waybill.
//!
//! This crate provides configuration loading from `.waybill.toml` files
//! with defaults applied for anything the file omits.
//!
//! # Example
//!
//! ```
//! use waybill_config::{Config, load_config};
//! use std::path::Path;
//!
//! // Load config from a directory (looks for .waybill.toml)
//! let config = load_config(Path::new(".")).expect("load config");
//!
//! println!("gateway: {}", config.gateway().base_url);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default configuration file name
pub const CONFIG_FILE: &str = ".waybill.toml";

/// Get the config file path for a directory
pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

/// Complete waybill configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Lookup gateway configuration
    #[serde(default)]
    gateway: GatewayConfig,
    /// Booking-form behavior configuration
    #[serde(default)]
    form: FormConfig,
}

impl Config {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway settings
    pub fn gateway(&self) -> &GatewayConfig {
        &self.gateway
    }

    /// Form settings
    pub fn form(&self) -> &FormConfig {
        &self.form
    }
}

/// Lookup gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the lookup gateway
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout
    #[serde(default = "default_timeout")]
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

/// Booking-form behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    /// Debounce window between the last pincode keystroke and the lookups
    #[serde(default = "default_debounce_window")]
    #[serde(with = "humantime_serde")]
    pub debounce_window: Duration,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            debounce_window: default_debounce_window(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.waybill.example".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_debounce_window() -> Duration {
    Duration::from_millis(300)
}

/// Load configuration from a directory.
///
/// Looks for `.waybill.toml` in the given directory. A missing file yields
/// the default configuration; a malformed file is an error.
pub fn load_config(dir: &Path) -> Result<Config> {
    let path = config_path(dir);
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;

    toml::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let td = tempdir().expect("tempdir");
        let config = load_config(td.path()).expect("load");
        assert_eq!(config.gateway().base_url, "https://api.waybill.example");
        assert_eq!(config.gateway().timeout, Duration::from_secs(30));
        assert_eq!(config.form().debounce_window, Duration::from_millis(300));
    }

    #[test]
    fn partial_file_merges_with_defaults() {
        let td = tempdir().expect("tempdir");
        std::fs::write(
            config_path(td.path()),
            r#"
[gateway]
base_url = "https://gw.test"
"#,
        )
        .expect("write");

        let config = load_config(td.path()).expect("load");
        assert_eq!(config.gateway().base_url, "https://gw.test");
        assert_eq!(config.gateway().timeout, Duration::from_secs(30));
        assert_eq!(config.form().debounce_window, Duration::from_millis(300));
    }

    #[test]
    fn durations_parse_humantime_strings() {
        let td = tempdir().expect("tempdir");
        std::fs::write(
            config_path(td.path()),
            r#"
[gateway]
timeout = "5s"

[form]
debounce_window = "150ms"
"#,
        )
        .expect("write");

        let config = load_config(td.path()).expect("load");
        assert_eq!(config.gateway().timeout, Duration::from_secs(5));
        assert_eq!(config.form().debounce_window, Duration::from_millis(150));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let td = tempdir().expect("tempdir");
        std::fs::write(config_path(td.path()), "not [valid toml").expect("write");

        let err = load_config(td.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse config file"));
    }
}
