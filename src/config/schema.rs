//! Configuration schema definitions for huecheck.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.
//!
//! # Schema Overview
//!
//! ```text
//! Config (root)
//! ├── ApiConfig      - Where the formatting API lives
//! ├── PollConfig     - How often and how long to wait for a job
//! └── ReportConfig   - Default colors and output styling
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration structure for huecheck.
///
/// # TOML Structure
///
/// ```toml
/// [api]
/// base_url = "http://localhost:3000"
/// request_timeout_secs = 30
///
/// [poll]
/// max_attempts = 10
/// interval_ms = 2000
///
/// [report]
/// default_colors = ["TestColor"]
/// color = true
/// ```
///
/// # Example
///
/// ```
/// use huecheck::config::Config;
///
/// let config: Config = toml::from_str(r#"
///     [poll]
///     max_attempts = 3
/// "#).unwrap();
///
/// assert_eq!(config.poll.max_attempts, 3);
/// assert_eq!(config.api.base_url, "http://localhost:3000");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Formatting API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Job polling settings.
    #[serde(default)]
    pub poll: PollConfig,

    /// Report output settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Formatting API connection settings.
///
/// # Defaults
///
/// | Field | Default |
/// |-------|---------|
/// | `base_url` | `http://localhost:3000` |
/// | `request_timeout_secs` | 30 |
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the API, without a trailing path.
    ///
    /// Overridden by the `HUECHECK_API_URL` environment variable and the
    /// `--api-url` flag.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for a single HTTP request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Job polling settings.
///
/// The ceiling counts poll requests, not elapsed time. The interval is only
/// waited between a "not ready" answer and the next request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PollConfig {
    /// Maximum number of poll requests per job. Must be at least 1.
    ///
    /// Default: 10
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between poll requests, in milliseconds.
    ///
    /// Default: 2000
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_ms: default_interval_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    10
}

fn default_interval_ms() -> u64 {
    2000
}

/// Report output settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Colors used when `report` is run without `--colors`.
    #[serde(default = "default_colors")]
    pub default_colors: Vec<String>,

    /// Emit ANSI colors in the rendered report.
    #[serde(default = "default_true")]
    pub color: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_colors: default_colors(),
            color: true,
        }
    }
}

fn default_colors() -> Vec<String> {
    vec!["TestColor".to_string()]
}

fn default_true() -> bool {
    true
}
