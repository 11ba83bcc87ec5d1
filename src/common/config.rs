//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL that relative scenario URLs are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Browser launch settings
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            browser: BrowserConfig::default(),
            timeouts: Timeouts::default(),
            output: OutputConfig::default(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

/// Browser launch settings
#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Browser window width
    #[serde(default = "default_window_width")]
    pub window_width: u32,

    /// Browser window height
    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Chrome sandboxing (disable when running as root in containers)
    #[serde(default = "default_true")]
    pub sandbox: bool,

    /// Browser executable, either a path or a name looked up on PATH.
    /// Auto-detected when unset.
    #[serde(default)]
    pub executable: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: default_window_width(),
            window_height: default_window_height(),
            sandbox: true,
            executable: None,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    720
}

impl BrowserConfig {
    /// Resolve the configured executable to a path
    ///
    /// Values containing a path separator are used as-is; bare names are
    /// searched on PATH.
    pub fn resolve_executable(&self) -> Result<Option<PathBuf>> {
        let Some(executable) = &self.executable else {
            return Ok(None);
        };

        let candidate = Path::new(executable);
        if candidate.components().count() > 1 {
            return Ok(Some(candidate.to_path_buf()));
        }

        which::which(executable)
            .map(Some)
            .map_err(|_| Error::BrowserNotFound {
                name: executable.clone(),
            })
    }
}

/// Timeout and retry settings
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Navigation attempts before giving up
    #[serde(default = "default_navigation_attempts")]
    pub navigation_attempts: u32,

    /// Delay between navigation attempts
    #[serde(default = "default_navigation_retry_delay")]
    pub navigation_retry_delay_ms: u64,

    /// Timeout for a single navigation attempt
    #[serde(default = "default_navigation_attempt_timeout")]
    pub navigation_attempt_timeout_ms: u64,

    /// Readiness timeout when a scenario does not set one
    #[serde(default = "default_wait")]
    pub default_wait_ms: u64,

    /// How long a check may take to settle before its verdict is final
    #[serde(default = "default_check_timeout")]
    pub check_timeout_ms: u64,

    /// Interval between page polls while waiting
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Timeout for capturing and writing a screenshot
    #[serde(default = "default_screenshot_timeout")]
    pub screenshot_timeout_ms: u64,

    /// Timeout for closing a session
    #[serde(default = "default_release_timeout")]
    pub release_timeout_ms: u64,

    /// Wall-clock budget for one scenario, from session acquisition to the last check
    #[serde(default = "default_scenario_budget")]
    pub scenario_budget_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation_attempts: default_navigation_attempts(),
            navigation_retry_delay_ms: default_navigation_retry_delay(),
            navigation_attempt_timeout_ms: default_navigation_attempt_timeout(),
            default_wait_ms: default_wait(),
            check_timeout_ms: default_check_timeout(),
            poll_interval_ms: default_poll_interval(),
            screenshot_timeout_ms: default_screenshot_timeout(),
            release_timeout_ms: default_release_timeout(),
            scenario_budget_secs: default_scenario_budget(),
        }
    }
}

fn default_navigation_attempts() -> u32 {
    5
}
fn default_navigation_retry_delay() -> u64 {
    2_000
}
fn default_navigation_attempt_timeout() -> u64 {
    10_000
}
fn default_wait() -> u64 {
    30_000
}
fn default_check_timeout() -> u64 {
    5_000
}
fn default_poll_interval() -> u64 {
    100
}
fn default_screenshot_timeout() -> u64 {
    10_000
}
fn default_release_timeout() -> u64 {
    5_000
}
fn default_scenario_budget() -> u64 {
    120
}

/// Output configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputConfig {
    /// Directory that relative screenshot paths are resolved against
    #[serde(default)]
    pub screenshot_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.timeouts.navigation_attempts == 0 {
            return Err(Error::Config(
                "timeouts.navigation_attempts must be at least 1".to_string(),
            ));
        }
        if self.timeouts.poll_interval_ms == 0 {
            return Err(Error::Config(
                "timeouts.poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Replace the base URL, validating it like a file value
    pub fn with_base_url(mut self, base_url: String) -> Result<Self> {
        self.base_url = base_url;
        self.validate()?;
        Ok(self)
    }
}

impl Timeouts {
    pub fn navigation_retry_delay(&self) -> Duration {
        Duration::from_millis(self.navigation_retry_delay_ms)
    }

    pub fn navigation_attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_attempt_timeout_ms)
    }

    pub fn default_wait(&self) -> Duration {
        Duration::from_millis(self.default_wait_ms)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn screenshot_timeout(&self) -> Duration {
        Duration::from_millis(self.screenshot_timeout_ms)
    }

    pub fn release_timeout(&self) -> Duration {
        Duration::from_millis(self.release_timeout_ms)
    }

    pub fn scenario_budget(&self) -> Duration {
        Duration::from_secs(self.scenario_budget_secs)
    }
}
