//! Configuration paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/pagecheck/`
//! - macOS: `~/Library/Application Support/pagecheck/`
//! - Windows: `%APPDATA%\pagecheck\`

use std::path::{Path, PathBuf};

const APP_NAME: &str = "pagecheck";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Resolve a screenshot path against an optional output directory
///
/// Absolute paths are returned unchanged.
pub fn resolve_output(path: &Path, dir: Option<&Path>) -> PathBuf {
    match dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}
