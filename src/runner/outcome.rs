//! Per-scenario results

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Lifecycle of one scenario run
///
/// `Init → SessionAcquired → Navigated → Ready → ChecksEvaluated → Closed`.
/// A run may stop at any stage; it always passes through `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    SessionAcquired,
    Navigated,
    Ready,
    ChecksEvaluated,
    Closed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::SessionAcquired => "session acquired",
            Self::Navigated => "navigated",
            Self::Ready => "ready",
            Self::ChecksEvaluated => "checks evaluated",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Which step failed, what it wanted and what the page showed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckFailure {
    /// 1-based position in the scenario's step list
    pub step: usize,
    pub description: String,
    pub expected: String,
    pub observed: String,
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {} ({}): expected {}, observed {}",
            self.step, self.description, self.expected, self.observed
        )
    }
}

/// Classification of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    /// Every check held
    Pass,
    /// A check evaluated false: an application regression
    Fail(CheckFailure),
    /// The environment got in the way: session, navigation, readiness or budget
    Error(String),
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// The single result produced for each scenario run
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub scenario: String,
    pub outcome: Outcome,
    /// Furthest stage reached before the run was closed
    pub reached: Stage,
    /// Screenshot path, if one was written
    pub screenshot: Option<PathBuf>,
    /// Non-fatal observations
    pub warnings: Vec<String>,
    /// Page HTML captured when the readiness wait failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_content: Option<String>,
    pub navigation_attempts: u32,
    pub elapsed_ms: u64,
}

impl RunResult {
    /// Result for a scenario that never got a session, e.g. when the browser
    /// could not be launched
    pub fn not_started(scenario: &str, message: impl Into<String>) -> Self {
        Self {
            scenario: scenario.to_string(),
            outcome: Outcome::Error(message.into()),
            reached: Stage::Init,
            screenshot: None,
            warnings: Vec::new(),
            page_content: None,
            navigation_attempts: 0,
            elapsed_ms: 0,
        }
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Pass => write!(f, "{}: PASS", self.scenario),
            Outcome::Fail(failure) => write!(f, "{}: FAIL({})", self.scenario, failure),
            Outcome::Error(message) => write!(f, "{}: ERROR({})", self.scenario, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(outcome: Outcome) -> RunResult {
        RunResult {
            scenario: "bank".to_string(),
            outcome,
            reached: Stage::Ready,
            screenshot: None,
            warnings: Vec::new(),
            page_content: None,
            navigation_attempts: 1,
            elapsed_ms: 0,
        }
    }

    #[test]
    fn test_result_lines() {
        assert_eq!(result(Outcome::Pass).to_string(), "bank: PASS");

        let failure = CheckFailure {
            step: 2,
            description: "class of css=label >> has-text=\"YES\"".to_string(),
            expected: "class matching /outline/".to_string(),
            observed: "\"button primary\"".to_string(),
        };
        assert_eq!(
            result(Outcome::Fail(failure)).to_string(),
            "bank: FAIL(step 2 (class of css=label >> has-text=\"YES\"): expected class matching /outline/, observed \"button primary\")"
        );

        assert_eq!(
            result(Outcome::Error("connection refused".to_string())).to_string(),
            "bank: ERROR(connection refused)"
        );
    }

    #[test]
    fn test_json_shape() {
        let value = serde_json::to_value(result(Outcome::Error("boom".to_string()))).unwrap();
        assert_eq!(value["outcome"]["status"], "error");
        assert_eq!(value["outcome"]["detail"], "boom");
        assert_eq!(value["reached"], "ready");
        assert!(value.get("page_content").is_none());
    }

    #[test]
    fn test_not_started_is_error_at_init() {
        let result = RunResult::not_started("home", "Failed to launch browser: no chrome");
        assert_eq!(result.reached, Stage::Init);
        assert_eq!(result.navigation_attempts, 0);
        assert_eq!(
            result.to_string(),
            "home: ERROR(Failed to launch browser: no chrome)"
        );
    }

    #[test]
    fn test_stage_order() {
        assert!(Stage::Init < Stage::SessionAcquired);
        assert!(Stage::Ready < Stage::ChecksEvaluated);
        assert!(Stage::ChecksEvaluated < Stage::Closed);
    }
}
