//! Chrome DevTools Protocol backend
//!
//! `headless_chrome` is synchronous, so every call is moved onto the
//! blocking pool. That keeps the runner's async timeouts effective even
//! when Chrome stops answering.

use async_trait::async_trait;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::protocol::cdp::Target::DisposeBrowserContext;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::{Driver, Locator, Page};
use crate::common::config::BrowserConfig;
use crate::common::{Error, Result};

/// Chrome exits on its own after this long without CDP traffic
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(600);

/// Run a synchronous browser call on the blocking pool
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Internal(format!("browser task failed: {e}")))?
}

/// Like [`blocking`], but the call runs to completion even if the caller
/// stops waiting. A value produced too late is dropped on the blocking
/// thread, so types that release resources on drop are not leaked.
async fn handoff<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    tokio::task::spawn_blocking(move || {
        // A failed send hands the value back and it is dropped here
        let _ = tx.send(f());
    });
    rx.await
        .map_err(|_| Error::Internal("browser task ended without a result".to_string()))?
}

/// Close a session's tab and dispose of its browser context
fn release_session(tab: &Tab, browser: &Browser, context_id: &str) -> Result<()> {
    let closed = tab.close(true);
    browser
        .call_method(DisposeBrowserContext {
            browser_context_id: context_id.to_string(),
        })
        .map_err(|e| Error::operation("dispose_context", e))?;
    closed.map_err(|e| Error::operation("close", e))?;
    Ok(())
}

/// Shared Chrome process handing out one browser context per session
pub struct ChromeDriver {
    browser: Browser,
}

impl ChromeDriver {
    /// Launch a Chrome process
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let executable = config.resolve_executable()?;
        let config = config.clone();

        info!(
            "Launching browser (headless: {}, size: {}x{})",
            config.headless, config.window_width, config.window_height
        );

        let browser = blocking(move || {
            let options = LaunchOptions::default_builder()
                .headless(config.headless)
                .sandbox(config.sandbox)
                .window_size(Some((config.window_width, config.window_height)))
                .path(executable)
                .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
                .build()
                .map_err(|e| Error::BrowserLaunch(e.to_string()))?;

            Browser::new(options).map_err(|e| Error::BrowserLaunch(e.to_string()))
        })
        .await?;

        info!("Browser launched");
        Ok(Self { browser })
    }

    /// Shut the browser process down
    ///
    /// Callers release every session first.
    pub async fn shutdown(self) -> Result<()> {
        info!("Shutting down browser");
        let browser = self.browser;
        // Dropping the last handle kills the process and waits for it
        blocking(move || {
            drop(browser);
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl Driver for ChromeDriver {
    async fn new_session(&self) -> Result<Box<dyn Page>> {
        let browser = self.browser.clone();

        // The page is built on the blocking thread so that a session opened
        // after the caller gave up is closed by `Drop`
        let page = handoff(move || {
            let context = browser
                .new_context()
                .map_err(|e| Error::SessionAcquire(e.to_string()))?;
            let context_id = context.get_id().to_string();
            let tab = match context.new_tab() {
                Ok(tab) => tab,
                Err(e) => {
                    let _ = browser.call_method(DisposeBrowserContext {
                        browser_context_id: context_id,
                    });
                    return Err(Error::SessionAcquire(e.to_string()));
                }
            };
            Ok(ChromePage {
                tab,
                browser: browser.clone(),
                context_id,
                closed: AtomicBool::new(false),
            })
        })
        .await?;

        debug!("Opened browser context {}", page.context_id);
        Ok(Box::new(page))
    }
}

/// A tab inside its own browser context
pub struct ChromePage {
    tab: Arc<Tab>,
    browser: Browser,
    context_id: String,
    closed: AtomicBool,
}

impl ChromePage {
    /// Evaluate a script and return its JSON value
    async fn evaluate(&self, operation: &'static str, script: String) -> Result<Value> {
        let tab = self.tab.clone();
        blocking(move || {
            let result = tab
                .evaluate(&script, false)
                .map_err(|e| Error::operation(operation, e))?;
            Ok(result.value.unwrap_or(Value::Null))
        })
        .await
    }

    /// Evaluate a function body with `el` bound to the located element
    async fn with_element(&self, operation: &'static str, locator: &Locator, body: &str) -> Result<Value> {
        let script = format!("(() => {{ const el = {}; {} }})()", locator.to_query(), body);
        self.evaluate(operation, script).await
    }
}

#[async_trait]
impl Page for ChromePage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        debug!("Navigating to {}", url);
        let tab = self.tab.clone();
        let url = url.to_string();

        blocking(move || {
            tab.set_default_timeout(timeout);
            tab.navigate_to(&url)
                .map_err(|e| Error::operation("navigate", e))?;
            tab.wait_until_navigated()
                .map_err(|e| Error::operation("navigate", e))?;
            Ok(())
        })
        .await
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool> {
        let value = self
            .with_element(
                "is_visible",
                locator,
                "if (!el) return false;
                 const style = window.getComputedStyle(el);
                 const rect = el.getBoundingClientRect();
                 return style.visibility !== 'hidden' && style.display !== 'none'
                     && rect.width > 0 && rect.height > 0;",
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn text_content(&self, locator: &Locator) -> Result<Option<String>> {
        let value = self
            .with_element("text_content", locator, "return el ? el.textContent : null;")
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn get_attribute(&self, locator: &Locator, name: &str) -> Result<Option<String>> {
        let body = format!(
            "return el ? el.getAttribute({}) : null;",
            Value::String(name.to_string())
        );
        let value = self.with_element("get_attribute", locator, &body).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn click(&self, locator: &Locator) -> Result<bool> {
        debug!("Clicking {}", locator);
        let value = self
            .with_element(
                "click",
                locator,
                "if (!el) return false;
                 el.scrollIntoView({ block: 'center' });
                 el.click();
                 return true;",
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<bool> {
        debug!("Filling {} with {:?}", locator, value);
        // The native setter is used so framework-controlled inputs see the change
        let body = format!(
            "if (!el) return false;
             const proto = el instanceof HTMLTextAreaElement
                 ? HTMLTextAreaElement.prototype
                 : HTMLInputElement.prototype;
             const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
             el.focus();
             setter.call(el, {});
             el.dispatchEvent(new Event('input', {{ bubbles: true }}));
             el.dispatchEvent(new Event('change', {{ bubbles: true }}));
             return true;",
            Value::String(value.to_string())
        );
        let result = self.with_element("fill", locator, &body).await?;
        Ok(result.as_bool().unwrap_or(false))
    }

    async fn content(&self) -> Result<String> {
        let tab = self.tab.clone();
        blocking(move || tab.get_content().map_err(|e| Error::operation("content", e))).await
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let tab = self.tab.clone();
        let png = blocking(move || {
            tab.capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
                .map_err(|e| Error::operation("screenshot", e))
        })
        .await?;

        let write_error = |e: std::io::Error| Error::Screenshot {
            path: path.display().to_string(),
            message: e.to_string(),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }
        tokio::fs::write(path, &png).await.map_err(write_error)?;
        debug!("Wrote {} bytes to {}", png.len(), path.display());
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        debug!("Closing browser context {}", self.context_id);
        let tab = self.tab.clone();
        let browser = self.browser.clone();
        let context_id = self.context_id.clone();
        blocking(move || release_session(&tab, &browser, &context_id)).await
    }
}

impl Drop for ChromePage {
    fn drop(&mut self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            warn!(
                "Browser context {} dropped without close, releasing it",
                self.context_id
            );
            let _ = release_session(&self.tab, &self.browser, &self.context_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tracked(Arc<AtomicBool>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_handoff_delivers_value() {
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = dropped.clone();

        let value = handoff(move || Ok(Tracked(flag))).await.unwrap();

        assert!(!dropped.load(Ordering::SeqCst));
        drop(value);
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_late_handoff_value_is_dropped() {
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = dropped.clone();

        let waited = tokio::time::timeout(
            Duration::from_millis(10),
            handoff(move || {
                std::thread::sleep(Duration::from_millis(200));
                Ok(Tracked(flag))
            }),
        )
        .await;
        assert!(waited.is_err());

        for _ in 0..100 {
            if dropped.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_handoff_propagates_errors() {
        let err = handoff(|| -> Result<()> { Err(Error::SessionAcquire("no target".to_string())) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SessionAcquire(_)));
    }
}
