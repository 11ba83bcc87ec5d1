//! Scenario runner
//!
//! Drives one scenario end to end: acquire an isolated session, navigate
//! with bounded retry, wait for readiness, run steps fail-fast, take a
//! screenshot and release the session. Every run yields exactly one
//! [`RunResult`] and releases its session on every exit path, including
//! when the wall-clock budget cuts the run short.

pub mod checks;
mod outcome;

use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::browser::{Driver, Locator, Page};
use crate::common::config::Config;
use crate::common::{paths, Error, Result};
use crate::scenario::{Check, Readiness, Scenario, Step};

use checks::Verdict;
pub use outcome::{CheckFailure, Outcome, RunResult, Stage};

/// Timing and location settings for a run
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub base_url: String,
    pub navigation_attempts: u32,
    pub navigation_retry_delay: Duration,
    pub navigation_attempt_timeout: Duration,
    pub default_wait: Duration,
    pub check_timeout: Duration,
    pub poll_interval: Duration,
    pub screenshot_timeout: Duration,
    pub release_timeout: Duration,
    pub scenario_budget: Duration,
    pub screenshot_dir: Option<PathBuf>,
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Self {
        let t = &config.timeouts;
        Self {
            base_url: config.base_url.clone(),
            navigation_attempts: t.navigation_attempts.max(1),
            navigation_retry_delay: t.navigation_retry_delay(),
            navigation_attempt_timeout: t.navigation_attempt_timeout(),
            default_wait: t.default_wait(),
            check_timeout: t.check_timeout(),
            poll_interval: t.poll_interval(),
            screenshot_timeout: t.screenshot_timeout(),
            release_timeout: t.release_timeout(),
            scenario_budget: t.scenario_budget(),
            screenshot_dir: config.output.screenshot_dir.clone(),
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Mutable bookkeeping for one run, kept outside the budgeted future
#[derive(Debug)]
struct RunTrace {
    scenario: String,
    stage: Stage,
    warnings: Vec<String>,
    page_content: Option<String>,
    navigation_attempts: u32,
}

impl RunTrace {
    fn new(scenario: &str) -> Self {
        Self {
            scenario: scenario.to_string(),
            stage: Stage::Init,
            warnings: Vec::new(),
            page_content: None,
            navigation_attempts: 0,
        }
    }

    fn advance(&mut self, stage: Stage) {
        debug!("[{}] {} -> {}", self.scenario, self.stage, stage);
        self.stage = stage;
    }

    fn warn(&mut self, message: String) {
        warn!("[{}] {}", self.scenario, message);
        self.warnings.push(message);
    }
}

/// Runs scenarios against sessions from a [`Driver`]
pub struct VerificationRunner<'a> {
    driver: &'a dyn Driver,
    settings: RunSettings,
}

impl<'a> VerificationRunner<'a> {
    pub fn new(driver: &'a dyn Driver, settings: RunSettings) -> Self {
        Self { driver, settings }
    }

    /// Run scenarios one after another, reporting each result as it lands
    pub async fn run_all<F>(&self, scenarios: &[Scenario], mut on_result: F) -> Vec<RunResult>
    where
        F: FnMut(&RunResult),
    {
        let mut results = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let result = self.run(scenario).await;
            on_result(&result);
            results.push(result);
        }
        results
    }

    /// Run one scenario
    pub async fn run(&self, scenario: &Scenario) -> RunResult {
        let started = Instant::now();
        let mut trace = RunTrace::new(&scenario.name);
        let mut session: Option<Box<dyn Page>> = None;

        info!("[{}] Starting", scenario.name);

        let budget = self.settings.scenario_budget;
        let outcome = match timeout(budget, self.drive(scenario, &mut session, &mut trace)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    "[{}] Abandoned after exceeding its {}ms budget",
                    scenario.name,
                    millis(budget)
                );
                Outcome::Error(Error::Timeout(millis(budget)).to_string())
            }
        };

        let mut screenshot = None;
        if let Some(page) = session.take() {
            screenshot = self.capture(page.as_ref(), scenario, &mut trace).await;
            self.release(page, &mut trace).await;
        }

        let reached = trace.stage;
        trace.advance(Stage::Closed);

        let result = RunResult {
            scenario: scenario.name.clone(),
            outcome,
            reached,
            screenshot,
            warnings: trace.warnings,
            page_content: trace.page_content,
            navigation_attempts: trace.navigation_attempts,
            elapsed_ms: millis(started.elapsed()),
        };
        debug!("{}", result);
        result
    }

    /// Everything between `Init` and `ChecksEvaluated`
    ///
    /// The acquired session is parked in `session` so the caller can
    /// release it even if this future is dropped.
    async fn drive(
        &self,
        scenario: &Scenario,
        session: &mut Option<Box<dyn Page>>,
        trace: &mut RunTrace,
    ) -> Outcome {
        let page: &dyn Page = match self.driver.new_session().await {
            Ok(page) => &**session.insert(page),
            Err(e) => return Outcome::Error(e.to_string()),
        };
        trace.advance(Stage::SessionAcquired);

        let url = scenario.resolve_url(&self.settings.base_url);
        if let Err(e) = self.navigate(page, &url, trace).await {
            return Outcome::Error(e.to_string());
        }
        trace.advance(Stage::Navigated);

        if let Err(e) = self.await_ready(page, &scenario.readiness).await {
            if matches!(e, Error::ReadinessTimeout { .. }) {
                self.capture_content(page, trace).await;
            }
            return Outcome::Error(e.to_string());
        }
        trace.advance(Stage::Ready);

        let outcome = self.run_steps(page, &scenario.steps, trace).await;
        if outcome.is_pass() {
            trace.advance(Stage::ChecksEvaluated);
        }
        outcome
    }

    /// Load the URL, retrying transient failures
    async fn navigate(&self, page: &dyn Page, url: &str, trace: &mut RunTrace) -> Result<()> {
        let attempts = self.settings.navigation_attempts;
        let per_attempt = self.settings.navigation_attempt_timeout;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            trace.navigation_attempts = attempt;
            match timeout(per_attempt, page.goto(url, per_attempt)).await {
                Ok(Ok(())) => {
                    info!("[{}] Loaded {} (attempt {})", trace.scenario, url, attempt);
                    return Ok(());
                }
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => {
                    last_error = format!("timed out after {}ms", per_attempt.as_millis());
                }
            }

            warn!(
                "[{}] Attempt {}/{} to load {} failed: {}",
                trace.scenario, attempt, attempts, url, last_error
            );
            if attempt < attempts {
                sleep(self.settings.navigation_retry_delay).await;
            }
        }

        Err(Error::Navigation {
            url: url.to_string(),
            attempts,
            message: last_error,
        })
    }

    /// Block until the readiness condition holds or its timeout passes
    async fn await_ready(&self, page: &dyn Page, readiness: &Readiness) -> Result<()> {
        let limit = readiness.timeout(self.settings.default_wait);
        let Some(locator) = readiness.locator() else {
            debug!("Waiting a fixed {}ms", limit.as_millis());
            sleep(limit).await;
            return Ok(());
        };

        if self.poll_visible(page, &locator, limit).await? {
            Ok(())
        } else {
            Err(Error::ReadinessTimeout {
                condition: readiness.describe(),
                waited_ms: millis(limit),
            })
        }
    }

    async fn poll_visible(&self, page: &dyn Page, locator: &Locator, limit: Duration) -> Result<bool> {
        let deadline = Instant::now() + limit;
        loop {
            if page.is_visible(locator).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(self.settings.poll_interval).await;
        }
    }

    /// Keep the page HTML for diagnosing a failed readiness wait
    async fn capture_content(&self, page: &dyn Page, trace: &mut RunTrace) {
        match page.content().await {
            Ok(html) => {
                let preview: String = html.chars().take(500).collect();
                warn!("[{}] Page content at readiness timeout: {}", trace.scenario, preview);
                trace.page_content = Some(html);
            }
            Err(e) => trace.warn(format!("could not read page content: {e}")),
        }
    }

    /// Run steps in order, stopping at the first failure
    async fn run_steps(&self, page: &dyn Page, steps: &[Step], trace: &mut RunTrace) -> Outcome {
        for (index, step) in steps.iter().enumerate() {
            let number = index + 1;
            debug!("[{}] Step {}: {}", trace.scenario, number, step.describe());

            match self.perform(page, step).await {
                Ok(Verdict::Satisfied) => {}
                Ok(Verdict::Violated { expected, observed }) if step.is_advisory() => {
                    trace.warn(format!(
                        "step {} ({}): expected {}, observed {}",
                        number,
                        step.describe(),
                        expected,
                        observed
                    ));
                }
                Ok(Verdict::Violated { expected, observed }) => {
                    return Outcome::Fail(CheckFailure {
                        step: number,
                        description: step.describe(),
                        expected,
                        observed,
                    });
                }
                Err(e) => return Outcome::Error(e.to_string()),
            }
        }
        Outcome::Pass
    }

    async fn perform(&self, page: &dyn Page, step: &Step) -> Result<Verdict> {
        match step {
            Step::Expect(check) if check.is_advisory() => checks::evaluate(page, check).await,
            Step::Expect(check) => self.settle(page, check).await,
            Step::Click(locator) => {
                if let target @ Verdict::Violated { .. } = self.await_target(page, locator).await? {
                    return Ok(target);
                }
                Ok(acted(page.click(locator).await?))
            }
            Step::Fill { locator, value } => {
                if let target @ Verdict::Violated { .. } = self.await_target(page, locator).await? {
                    return Ok(target);
                }
                Ok(acted(page.fill(locator, value).await?))
            }
        }
    }

    /// Re-evaluate a check until it holds or the settle window closes
    async fn settle(&self, page: &dyn Page, check: &Check) -> Result<Verdict> {
        let deadline = Instant::now() + self.settings.check_timeout;
        loop {
            let verdict = checks::evaluate(page, check).await?;
            if verdict.is_satisfied() || Instant::now() >= deadline {
                return Ok(verdict);
            }
            sleep(self.settings.poll_interval).await;
        }
    }

    /// Interactions wait for their target like a visibility check
    async fn await_target(&self, page: &dyn Page, locator: &Locator) -> Result<Verdict> {
        let check = Check::ElementVisible {
            locator: locator.clone(),
        };
        self.settle(page, &check).await
    }

    /// Best-effort screenshot; failures become warnings
    async fn capture(&self, page: &dyn Page, scenario: &Scenario, trace: &mut RunTrace) -> Option<PathBuf> {
        let path = paths::resolve_output(&scenario.screenshot, self.settings.screenshot_dir.as_deref());
        match timeout(self.settings.screenshot_timeout, page.screenshot(&path)).await {
            Ok(Ok(())) => {
                info!("[{}] Screenshot saved to {}", trace.scenario, path.display());
                Some(path)
            }
            Ok(Err(e)) => {
                trace.warn(format!("screenshot not saved: {e}"));
                None
            }
            Err(_) => {
                trace.warn(format!(
                    "screenshot not saved: timed out after {}ms",
                    self.settings.screenshot_timeout.as_millis()
                ));
                None
            }
        }
    }

    /// Close the session; runs on every path that acquired one
    async fn release(&self, page: Box<dyn Page>, trace: &mut RunTrace) {
        match timeout(self.settings.release_timeout, page.close()).await {
            Ok(Ok(())) => debug!("[{}] Session released", trace.scenario),
            Ok(Err(e)) => trace.warn(format!("session release failed: {e}")),
            Err(_) => trace.warn(format!(
                "session release timed out after {}ms",
                self.settings.release_timeout.as_millis()
            )),
        }
    }
}

/// Whole milliseconds, saturating
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn acted(done: bool) -> Verdict {
    if done {
        Verdict::Satisfied
    } else {
        Verdict::Violated {
            expected: "element to act on".to_string(),
            observed: "element detached before the action".to_string(),
        }
    }
}
