// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for batc-server.
//!
//! Config is loaded from the `[batc-server]` section of `batc.toml`.
//! Default search order:
//! 1. Path specified via `--config` CLI argument
//! 2. `./batc.toml`
//! 3. `~/.config/batc/batc.toml`
//! 4. `/etc/batc/batc.toml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use batc_app::{ConfigError, ConfigFile};

/// Top-level server configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Device link and filter chain configuration
    pub acquisition: AcquisitionConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
}

/// Device link and filter chain configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Serial port path the sensor is attached to (empty = always synthetic)
    pub port: String,
    /// Baud rate for the serial link
    pub baud: u32,
    /// Fall back to the synthetic source when the port cannot be opened
    pub synthetic_fallback: bool,
    /// Enable the low-pass stage of the filter chain
    pub low_pass: bool,
    /// Enable the high-pass stage of the filter chain
    pub high_pass: bool,
    /// Enable the power-line notch stage of the filter chain
    pub notch: bool,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud: 115_200,
            synthetic_fallback: true,
            low_pass: true,
            high_pass: true,
            notch: true,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.general.log_level.as_deref())?;

        if !self.acquisition.port.is_empty() && self.acquisition.baud == 0 {
            return Err("[acquisition].baud must be > 0".to_string());
        }

        Ok(())
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        <Self as ConfigFile>::load_from_file(path)
    }

    /// Load configuration from the default search paths.
    /// Returns default config if no config file is found.
    pub fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        <Self as ConfigFile>::load_from_default_paths()
    }

    /// Generate an example configuration wrapped under the `[batc-server]`
    /// section header, suitable for use in a combined `batc.toml` file.
    pub fn example_toml() -> String {
        #[derive(Serialize)]
        struct Wrapper {
            #[serde(rename = "batc-server")]
            inner: ServerConfig,
        }
        let example = ServerConfig {
            general: GeneralConfig {
                log_level: Some("info".to_string()),
            },
            acquisition: AcquisitionConfig::default(),
        };
        toml::to_string_pretty(&Wrapper { inner: example }).unwrap_or_default()
    }
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    if let Some(level) = level {
        match level {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "[general].log_level '{}' is invalid (expected one of: trace, debug, info, warn, error)",
                    level
                ))
            }
        }
    }
    Ok(())
}

impl ConfigFile for ServerConfig {
    const SECTION: &'static str = "batc-server";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert!(config.general.log_level.is_none());
        assert_eq!(config.acquisition.port, "/dev/ttyUSB0");
        assert_eq!(config.acquisition.baud, 115_200);
        assert!(config.acquisition.synthetic_fallback);
        assert!(config.acquisition.low_pass);
        assert!(config.acquisition.high_pass);
        assert!(config.acquisition.notch);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[acquisition]
port = "/dev/ttyACM3"
"#;

        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.acquisition.port, "/dev/ttyACM3");
        assert_eq!(config.acquisition.baud, 115_200);
        assert!(config.acquisition.notch);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[general]
log_level = "debug"

[acquisition]
port = ""
baud = 460800
synthetic_fallback = false
low_pass = true
high_pass = false
notch = false
"#;

        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, Some("debug".to_string()));
        assert!(config.acquisition.port.is_empty());
        assert_eq!(config.acquisition.baud, 460_800);
        assert!(!config.acquisition.synthetic_fallback);
        assert!(config.acquisition.low_pass);
        assert!(!config.acquisition.high_pass);
        assert!(!config.acquisition.notch);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ServerConfig::default();
        config.general.log_level = Some("verbose".to_string());
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.acquisition.baud = 0;
        assert!(config.validate().is_err());

        // Zero baud is irrelevant when the port is synthetic-only.
        config.acquisition.port = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_toml_round_trips() {
        let example = ServerConfig::example_toml();
        let table: toml::Table = toml::from_str(&example).unwrap();
        assert!(table.contains_key("batc-server"));
    }
}
