//! Configuration file handling

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::Result;
use crate::api::LoginRequest;
use crate::compare::Comparator;
use crate::poll::PollConfig;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Booking platform endpoint settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Admin credentials used for authenticated calls
    #[serde(default)]
    pub credentials: Credentials,

    /// Default polling settings
    #[serde(default)]
    pub polling: PollingConfig,

    /// Structural comparison settings
    #[serde(default)]
    pub comparison: ComparisonConfig,
}

/// Booking platform endpoint settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
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
    "https://automationintesting.online/api".to_string()
}
fn default_request_timeout() -> u64 {
    30
}

/// Login credentials
#[derive(Debug, Deserialize, Clone)]
pub struct Credentials {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
        }
    }
}

impl Credentials {
    /// Build the login request body for these credentials
    pub fn login_request(&self) -> LoginRequest {
        LoginRequest::new(&self.username, &self.password)
    }
}

fn default_username() -> String {
    "admin".to_string()
}
fn default_password() -> String {
    "password".to_string()
}

/// Polling settings in seconds
#[derive(Debug, Deserialize)]
pub struct PollingConfig {
    /// Maximum time to wait for a condition
    #[serde(default = "default_max_wait")]
    pub max_wait_secs: u64,

    /// Pause between probe attempts
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_wait_secs: default_max_wait(),
            interval_secs: default_interval(),
        }
    }
}

impl PollingConfig {
    /// Build a validated [`PollConfig`], with optional per-call overrides
    pub fn poll_config(
        &self,
        max_wait_secs: Option<u64>,
        interval_secs: Option<u64>,
    ) -> Result<PollConfig> {
        PollConfig::new(
            Duration::from_secs(max_wait_secs.unwrap_or(self.max_wait_secs)),
            Duration::from_secs(interval_secs.unwrap_or(self.interval_secs)),
        )
    }
}

fn default_max_wait() -> u64 {
    60
}
fn default_interval() -> u64 {
    5
}

/// Structural comparison settings
#[derive(Debug, Deserialize)]
pub struct ComparisonConfig {
    /// Absolute tolerance for floating-point fields
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            epsilon: default_epsilon(),
        }
    }
}

impl ComparisonConfig {
    /// Build a comparator with the configured tolerance, or `epsilon` if given
    pub fn comparator(&self, epsilon: Option<f64>) -> Result<Comparator> {
        Comparator::new().epsilon(epsilon.unwrap_or(self.epsilon))
    }
}

fn default_epsilon() -> f64 {
    crate::compare::DEFAULT_EPSILON
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| super::Error::file_read(path, e))?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    ///
    /// Polling and comparison settings are validated here, so a bad value
    /// fails at startup rather than at the first poll.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))?;

        config
            .polling
            .poll_config(None, None)
            .and_then(|_| config.comparison.comparator(None))
            .map_err(|e| super::Error::ConfigParse(e.to_string()))?;

        Ok(config)
    }
}
