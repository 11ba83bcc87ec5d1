//! In-memory browser for runner tests
//!
//! Elements are keyed by the display form of the locator that finds them.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{Driver, Locator, Page};
use crate::common::{Error, Result};

/// A fake element
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub visible: bool,
    pub text: String,
    pub attributes: HashMap<String, String>,
}

impl FakeElement {
    pub fn visible() -> Self {
        Self {
            visible: true,
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }
}

type Hook = Arc<dyn Fn(&mut FakeDom) + Send + Sync>;

/// Page state plus click handlers
#[derive(Clone, Default)]
pub struct FakeDom {
    pub elements: HashMap<String, FakeElement>,
    on_click: HashMap<String, Hook>,
}

impl FakeDom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, locator: &Locator, element: FakeElement) -> Self {
        self.elements.insert(locator.to_string(), element);
        self
    }

    pub fn on_click<F>(mut self, locator: &Locator, hook: F) -> Self
    where
        F: Fn(&mut FakeDom) + Send + Sync + 'static,
    {
        self.on_click.insert(locator.to_string(), Arc::new(hook));
        self
    }

    pub fn element_mut(&mut self, locator: &Locator) -> &mut FakeElement {
        self.elements.entry(locator.to_string()).or_default()
    }

    pub fn element(&self, locator: &Locator) -> Option<&FakeElement> {
        self.elements.get(&locator.to_string())
    }
}

/// Counters shared between a driver and the pages it creates
#[derive(Debug, Default)]
pub struct FakeStats {
    pub sessions_opened: AtomicUsize,
    pub sessions_closed: AtomicUsize,
    pub goto_calls: AtomicUsize,
    pub clicks: AtomicUsize,
    pub content_reads: AtomicUsize,
    pub screenshots: Mutex<Vec<PathBuf>>,
}

impl FakeStats {
    pub fn opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.sessions_closed.load(Ordering::SeqCst)
    }

    pub fn gotos(&self) -> usize {
        self.goto_calls.load(Ordering::SeqCst)
    }

    pub fn clicks(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }

    pub fn screenshot_paths(&self) -> Vec<PathBuf> {
        self.screenshots.lock().unwrap().clone()
    }
}

/// Fake driver handing out pages that start from the same DOM
pub struct FakeDriver {
    dom: FakeDom,
    pub stats: Arc<FakeStats>,
    failing_navigations: Arc<AtomicU32>,
    hang_navigation: bool,
    fail_session: bool,
    fail_screenshot: bool,
    write_screenshots: bool,
    fail_operation: Option<&'static str>,
}

impl FakeDriver {
    pub fn new(dom: FakeDom) -> Self {
        Self {
            dom,
            stats: Arc::new(FakeStats::default()),
            failing_navigations: Arc::new(AtomicU32::new(0)),
            hang_navigation: false,
            fail_session: false,
            fail_screenshot: false,
            write_screenshots: false,
            fail_operation: None,
        }
    }

    /// The first `count` navigations fail with a connection error
    pub fn failing_navigations(self, count: u32) -> Self {
        self.failing_navigations.store(count, Ordering::SeqCst);
        self
    }

    /// Navigation never completes
    pub fn hanging_navigation(mut self) -> Self {
        self.hang_navigation = true;
        self
    }

    pub fn failing_session(mut self) -> Self {
        self.fail_session = true;
        self
    }

    pub fn failing_screenshot(mut self) -> Self {
        self.fail_screenshot = true;
        self
    }

    /// Every call of the named page operation (`is_visible`, `click`, ...) errors
    pub fn failing_operation(mut self, operation: &'static str) -> Self {
        self.fail_operation = Some(operation);
        self
    }

    /// Write placeholder bytes to screenshot paths
    pub fn writing_screenshots(mut self) -> Self {
        self.write_screenshots = true;
        self
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn new_session(&self) -> Result<Box<dyn Page>> {
        if self.fail_session {
            return Err(Error::SessionAcquire("browser is not running".to_string()));
        }
        self.stats.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePage {
            dom: Mutex::new(self.dom.clone()),
            stats: self.stats.clone(),
            failing_navigations: self.failing_navigations.clone(),
            hang_navigation: self.hang_navigation,
            fail_screenshot: self.fail_screenshot,
            write_screenshots: self.write_screenshots,
            fail_operation: self.fail_operation,
            closed: AtomicBool::new(false),
        }))
    }
}

pub struct FakePage {
    dom: Mutex<FakeDom>,
    stats: Arc<FakeStats>,
    failing_navigations: Arc<AtomicU32>,
    hang_navigation: bool,
    fail_screenshot: bool,
    write_screenshots: bool,
    fail_operation: Option<&'static str>,
    closed: AtomicBool,
}

impl FakePage {
    fn attempt(&self, operation: &str) -> Result<()> {
        if self.fail_operation == Some(operation) {
            return Err(Error::operation(operation, "Target closed"));
        }
        Ok(())
    }
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<()> {
        self.stats.goto_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_navigation {
            std::future::pending::<()>().await;
        }
        let remaining = self.failing_navigations.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_navigations.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::operation(
                "navigate",
                format!("net::ERR_CONNECTION_REFUSED at {url}"),
            ));
        }
        Ok(())
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool> {
        self.attempt("is_visible")?;
        let dom = self.dom.lock().unwrap();
        Ok(dom.element(locator).map(|e| e.visible).unwrap_or(false))
    }

    async fn text_content(&self, locator: &Locator) -> Result<Option<String>> {
        self.attempt("text_content")?;
        let dom = self.dom.lock().unwrap();
        Ok(dom.element(locator).map(|e| e.text.clone()))
    }

    async fn get_attribute(&self, locator: &Locator, name: &str) -> Result<Option<String>> {
        self.attempt("get_attribute")?;
        let dom = self.dom.lock().unwrap();
        Ok(dom
            .element(locator)
            .and_then(|e| e.attributes.get(name).cloned()))
    }

    async fn click(&self, locator: &Locator) -> Result<bool> {
        self.attempt("click")?;
        let mut dom = self.dom.lock().unwrap();
        if dom.element(locator).is_none() {
            return Ok(false);
        }
        self.stats.clicks.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = dom.on_click.get(&locator.to_string()).cloned() {
            hook(&mut *dom);
        }
        Ok(true)
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<bool> {
        self.attempt("fill")?;
        let mut dom = self.dom.lock().unwrap();
        match dom.elements.get_mut(&locator.to_string()) {
            Some(element) => {
                element
                    .attributes
                    .insert("value".to_string(), value.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn content(&self) -> Result<String> {
        self.stats.content_reads.fetch_add(1, Ordering::SeqCst);
        Ok("<html><body><p>Loading…</p></body></html>".to_string())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        if self.fail_screenshot {
            return Err(Error::operation("screenshot", "target closed"));
        }
        if self.write_screenshots {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, b"\x89PNG")?;
        }
        self.stats.screenshots.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.stats.sessions_closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
