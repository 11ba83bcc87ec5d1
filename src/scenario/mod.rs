//! Scenario definitions
//!
//! A scenario is one named verification of one page: where to go, what to
//! wait for, which interactions and checks to run, and where to put the
//! screenshot. Scenarios are plain data, either from the built-in table or
//! from YAML files.

mod builtin;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::browser::Locator;
use crate::common::{Error, Result};

pub use builtin::builtin_scenarios;

/// One end-to-end verification case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name, used in result lines
    pub name: String,
    /// Optional description of what the scenario verifies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Path relative to the base URL, or an absolute http(s) URL
    pub url: String,
    /// What to wait for before running steps
    pub readiness: Readiness,
    /// Interactions and checks, run in order
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Where the screenshot is written
    pub screenshot: PathBuf,
}

/// Condition the runner waits on after navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Readiness {
    /// A matching element becomes visible
    SelectorVisible {
        locator: Locator,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    /// Some element containing the text becomes visible
    TextVisible {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    /// Unconditional wait, for pages that populate asynchronously
    FixedDelay { delay_ms: u64 },
}

impl Readiness {
    /// Timeout for the condition, falling back to the configured default
    pub fn timeout(&self, default: Duration) -> Duration {
        match self {
            Self::SelectorVisible { timeout_ms, .. } | Self::TextVisible { timeout_ms, .. } => {
                timeout_ms.map(Duration::from_millis).unwrap_or(default)
            }
            Self::FixedDelay { delay_ms } => Duration::from_millis(*delay_ms),
        }
    }

    /// Locator to poll for, if the condition is element-based
    pub fn locator(&self) -> Option<Locator> {
        match self {
            Self::SelectorVisible { locator, .. } => Some(locator.clone()),
            Self::TextVisible { text, .. } => Some(Locator::Text(text.clone())),
            Self::FixedDelay { .. } => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::SelectorVisible { locator, .. } => format!("{locator} to be visible"),
            Self::TextVisible { text, .. } => format!("text {text:?} to be visible"),
            Self::FixedDelay { delay_ms } => format!("{delay_ms}ms delay"),
        }
    }
}

/// One entry of a scenario's ordered step list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Click an element
    Click(Locator),
    /// Replace an input's value
    Fill { locator: Locator, value: String },
    /// Assert something about the page
    Expect(Check),
}

/// A single assertion against the current page state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Check {
    /// Element exists and is rendered visibly
    ElementVisible { locator: Locator },
    /// Element text contains a substring
    TextContains { locator: Locator, substring: String },
    /// Element class attribute matches a regular expression
    ElementHasClass { locator: Locator, pattern: String },
    /// Element carries an attribute. Advisory: absence is only a warning.
    AttributePresent { locator: Locator, attribute: String },
}

impl Check {
    /// Advisory checks produce warnings instead of failures
    pub fn is_advisory(&self) -> bool {
        matches!(self, Self::AttributePresent { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            Self::ElementVisible { locator } => format!("{locator} visible"),
            Self::TextContains { locator, .. } => format!("text of {locator}"),
            Self::ElementHasClass { locator, .. } => format!("class of {locator}"),
            Self::AttributePresent { locator, attribute } => {
                format!("attribute {attribute:?} of {locator}")
            }
        }
    }
}

impl Step {
    /// Whether a violation of this step is only a warning
    pub fn is_advisory(&self) -> bool {
        matches!(self, Self::Expect(check) if check.is_advisory())
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Click(locator) => format!("click {locator}"),
            Self::Fill { locator, value } => format!("fill {locator} with {value:?}"),
            Self::Expect(check) => check.describe(),
        }
    }
}

impl Scenario {
    /// Resolve the scenario URL against a base URL
    pub fn resolve_url(&self, base_url: &str) -> String {
        if self.url.starts_with("http://") || self.url.starts_with("https://") {
            return self.url.clone();
        }
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.url.trim_start_matches('/')
        )
    }

    /// Check the scenario is runnable
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_scenario(&self.name, "name is empty"));
        }
        if self.url.trim().is_empty() {
            return Err(Error::invalid_scenario(&self.name, "url is empty"));
        }
        if self.screenshot.as_os_str().is_empty() {
            return Err(Error::invalid_scenario(&self.name, "screenshot path is empty"));
        }
        for step in &self.steps {
            if let Step::Expect(Check::ElementHasClass { pattern, .. }) = step {
                Regex::new(pattern).map_err(|e| {
                    Error::invalid_scenario(&self.name, format!("bad class pattern /{pattern}/: {e}"))
                })?;
            }
        }
        Ok(())
    }
}

/// Top-level layout of a scenario file
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioFile {
    pub scenarios: Vec<Scenario>,
}

/// Parse scenarios from YAML text
///
/// Enums are read as single-key maps (`click: { css: .submit }`), the same
/// form `to_yaml` writes.
pub fn parse_scenarios(content: &str) -> Result<Vec<Scenario>> {
    let file: ScenarioFile =
        serde_yaml::with::singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(content))?;
    Ok(file.scenarios)
}

/// Render scenarios as a scenario file
///
/// Enums are written as single-key maps, the form `parse_scenarios` reads.
pub fn to_yaml(scenarios: &[Scenario]) -> Result<String> {
    let file = ScenarioFile {
        scenarios: scenarios.to_vec(),
    };
    let mut buf = Vec::new();
    {
        let mut serializer = serde_yaml::Serializer::new(&mut buf);
        serde_yaml::with::singleton_map_recursive::serialize(&file, &mut serializer)?;
    }
    String::from_utf8(buf).map_err(|e| Error::Internal(e.to_string()))
}

/// Load scenarios from a YAML file
pub fn load_file(path: &Path) -> Result<Vec<Scenario>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    parse_scenarios(&content).map_err(|e| Error::ScenarioParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Load scenarios from files, or the built-in table when no files are given
///
/// The combined set is validated and names must be unique.
pub fn load(files: &[PathBuf]) -> Result<Vec<Scenario>> {
    let scenarios = if files.is_empty() {
        builtin_scenarios()
    } else {
        let mut all = Vec::new();
        for path in files {
            all.extend(load_file(path)?);
        }
        all
    };

    let mut seen = HashSet::new();
    for scenario in &scenarios {
        scenario.validate()?;
        if !seen.insert(scenario.name.as_str()) {
            return Err(Error::invalid_scenario(&scenario.name, "name is used more than once"));
        }
    }

    Ok(scenarios)
}

/// Pick scenarios by name, keeping the requested order
///
/// An empty selection means all scenarios.
pub fn select(scenarios: Vec<Scenario>, names: &[String]) -> Result<Vec<Scenario>> {
    if names.is_empty() {
        return Ok(scenarios);
    }

    names
        .iter()
        .map(|name| {
            scenarios
                .iter()
                .find(|s| &s.name == name)
                .cloned()
                .ok_or_else(|| {
                    let available: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
                    Error::unknown_scenario(name, &available)
                })
        })
        .collect()
}
