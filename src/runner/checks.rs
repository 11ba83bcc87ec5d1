//! Evaluation of a single check against the live page

use regex::Regex;

use crate::browser::Page;
use crate::common::{Error, Result};
use crate::scenario::Check;

const MISSING: &str = "no matching element";

/// Outcome of evaluating one check once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Satisfied,
    Violated { expected: String, observed: String },
}

impl Verdict {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }

    fn violated(expected: impl Into<String>, observed: impl Into<String>) -> Self {
        Self::Violated {
            expected: expected.into(),
            observed: observed.into(),
        }
    }
}

/// Quote observed text, cutting long values down
fn quote(text: &str) -> String {
    const LIMIT: usize = 200;
    if text.chars().count() > LIMIT {
        let head: String = text.chars().take(LIMIT).collect();
        format!("{head:?}...")
    } else {
        format!("{text:?}")
    }
}

/// Evaluate a check against the current page state
pub async fn evaluate(page: &dyn Page, check: &Check) -> Result<Verdict> {
    match check {
        Check::ElementVisible { locator } => {
            if page.is_visible(locator).await? {
                return Ok(Verdict::Satisfied);
            }
            let observed = match page.text_content(locator).await? {
                Some(_) => "hidden element",
                None => MISSING,
            };
            Ok(Verdict::violated("visible element", observed))
        }

        Check::TextContains { locator, substring } => {
            let expected = format!("text containing {substring:?}");
            match page.text_content(locator).await? {
                Some(text) if text.contains(substring.as_str()) => Ok(Verdict::Satisfied),
                Some(text) => Ok(Verdict::violated(expected, quote(text.trim()))),
                None => Ok(Verdict::violated(expected, MISSING)),
            }
        }

        Check::ElementHasClass { locator, pattern } => {
            let regex = Regex::new(pattern).map_err(|e| {
                Error::Config(format!("invalid class pattern /{pattern}/: {e}"))
            })?;
            let expected = format!("class matching /{pattern}/");
            match page.get_attribute(locator, "class").await? {
                Some(class) if regex.is_match(&class) => Ok(Verdict::Satisfied),
                Some(class) => Ok(Verdict::violated(expected, quote(&class))),
                None => Ok(Verdict::violated(expected, "no class attribute")),
            }
        }

        Check::AttributePresent { locator, attribute } => {
            match page.get_attribute(locator, attribute).await? {
                Some(_) => Ok(Verdict::Satisfied),
                None => Ok(Verdict::violated(
                    format!("attribute {attribute:?}"),
                    "attribute absent",
                )),
            }
        }
    }
}
