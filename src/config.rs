//! Configuration loading for huecheck.
//!
//! Configuration comes from, in increasing precedence: built-in defaults,
//! an optional TOML file, the `HUECHECK_API_URL` environment variable, and
//! command-line flags. This module handles the first two and validation;
//! the CLI layers the rest on top.

pub mod schema;

pub use schema::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

/// Environment variable overriding [`ApiConfig::base_url`].
pub const API_URL_ENV: &str = "HUECHECK_API_URL";

/// File read from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "huecheck.toml";

/// Loads configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid TOML, or does
/// not match the schema.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

/// Loads configuration from a TOML string.
///
/// ```
/// use huecheck::config::load_config_str;
///
/// let config = load_config_str(r#"
///     [api]
///     base_url = "http://formatter:8080"
/// "#)?;
///
/// assert_eq!(config.api.base_url, "http://formatter:8080");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn load_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;

    Ok(config)
}

/// Resolves the configuration file to use.
///
/// An explicit path must exist (`~` is expanded). Without one, the default
/// file is used if present, otherwise the built-in defaults.
pub fn resolve_config(explicit: Option<&str>) -> Result<Config> {
    match explicit {
        Some(raw) => {
            let expanded = shellexpand::tilde(raw);
            load_config(&PathBuf::from(expanded.as_ref()))
        }
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.exists() {
                debug!("Using {}", path.display());
                load_config(path)
            } else {
                debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                Ok(Config::default())
            }
        }
    }
}

impl Config {
    /// Checks values the schema cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            bail!("api.base_url must not be empty");
        }
        if self.poll.max_attempts == 0 {
            bail!("poll.max_attempts must be at least 1");
        }
        Ok(())
    }

    /// Serializes the configuration back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
