//! Browser capabilities used by the runner
//!
//! The runner only talks to these traits. `chrome` implements them on top
//! of the Chrome DevTools Protocol; tests use the in-memory `fake`.

pub mod chrome;
#[cfg(test)]
pub mod fake;
mod locator;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::common::Result;

pub use chrome::ChromeDriver;
pub use locator::Locator;

/// Source of isolated browser sessions
#[async_trait]
pub trait Driver: Send + Sync {
    /// Open a fresh session with its own cookies and storage
    async fn new_session(&self) -> Result<Box<dyn Page>>;
}

/// One isolated page
///
/// Element queries return `Ok(None)` / `Ok(false)` when nothing matches the
/// locator; `Err` is reserved for the browser itself failing.
#[async_trait]
pub trait Page: Send + Sync {
    /// Navigate and wait for the load to finish
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Whether a matching element exists and is rendered visibly
    async fn is_visible(&self, locator: &Locator) -> Result<bool>;

    /// Text content of the matching element
    async fn text_content(&self, locator: &Locator) -> Result<Option<String>>;

    /// Attribute value of the matching element
    async fn get_attribute(&self, locator: &Locator, name: &str) -> Result<Option<String>>;

    /// Click the matching element. Returns false if nothing matched.
    async fn click(&self, locator: &Locator) -> Result<bool>;

    /// Replace the value of the matching input. Returns false if nothing matched.
    async fn fill(&self, locator: &Locator, value: &str) -> Result<bool>;

    /// Serialized HTML of the current document
    async fn content(&self) -> Result<String>;

    /// Save a PNG screenshot of the viewport
    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// Release the session
    async fn close(&self) -> Result<()>;
}
