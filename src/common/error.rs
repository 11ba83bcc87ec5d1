//! Error types for pagecheck
//!
//! Messages end up verbatim in `ERROR(...)` result lines, so they carry the
//! underlying browser message and enough context to act on it.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pagecheck
#[derive(Error, Debug)]
pub enum Error {
    // === Browser Errors ===
    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(String),

    #[error("Browser executable '{name}' not found on PATH")]
    BrowserNotFound { name: String },

    #[error("Failed to open browser session: {0}")]
    SessionAcquire(String),

    #[error("Browser operation '{operation}' failed: {message}")]
    BrowserOperation { operation: String, message: String },

    #[error("Failed to save screenshot to '{path}': {message}")]
    Screenshot { path: String, message: String },

    // === Navigation Errors ===
    #[error("Navigation to {url} failed after {attempts} attempt(s): {message}")]
    Navigation {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("Timed out after {waited_ms}ms waiting for {condition}")]
    ReadinessTimeout { condition: String, waited_ms: u64 },

    // === Scenario Errors ===
    #[error("Invalid scenario '{name}': {reason}")]
    InvalidScenario { name: String, reason: String },

    #[error("Unknown scenario '{name}'. Available: {available}")]
    UnknownScenario { name: String, available: String },

    #[error("Scenario(s) did not pass: {}", .0.join(", "))]
    ScenariosFailed(Vec<String>),

    // === Timeout Errors ===
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Invalid scenario file '{path}': {message}")]
    ScenarioParse { path: String, message: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a browser operation error
    pub fn operation<E: std::fmt::Display>(operation: &str, error: E) -> Self {
        Self::BrowserOperation {
            operation: operation.to_string(),
            message: error.to_string(),
        }
    }

    /// Create an invalid scenario error
    pub fn invalid_scenario(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidScenario {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an unknown scenario error listing the known names
    pub fn unknown_scenario<S: AsRef<str>>(name: &str, available: &[S]) -> Self {
        Self::UnknownScenario {
            name: name.to_string(),
            available: available
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenarios_failed_lists_names() {
        let err = Error::ScenariosFailed(vec!["bank".to_string(), "ux".to_string()]);
        assert_eq!(err.to_string(), "Scenario(s) did not pass: bank, ux");
    }

    #[test]
    fn test_unknown_scenario_lists_available() {
        let err = Error::unknown_scenario("nope", &["bank", "home"]);
        assert_eq!(
            err.to_string(),
            "Unknown scenario 'nope'. Available: bank, home"
        );
    }
}
