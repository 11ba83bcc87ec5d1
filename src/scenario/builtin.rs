//! Built-in scenario table for the bank, markets, betting and landing pages

use std::path::PathBuf;

use super::{Check, Readiness, Scenario, Step};
use crate::browser::Locator;

fn expect(check: Check) -> Step {
    Step::Expect(check)
}

fn visible(locator: Locator) -> Step {
    expect(Check::ElementVisible { locator })
}

fn has_class(locator: Locator, pattern: &str) -> Step {
    expect(Check::ElementHasClass {
        locator,
        pattern: pattern.to_string(),
    })
}

fn wait_for(locator: Locator, timeout_ms: Option<u64>) -> Readiness {
    Readiness::SelectorVisible {
        locator,
        timeout_ms,
    }
}

/// Landing page hero image, with a responsive-image hint
fn landing_image() -> Scenario {
    let image = Locator::alt_text("DNA Helix Background");
    Scenario {
        name: "landing-image".to_string(),
        description: Some("Landing page renders its optimised background image".to_string()),
        url: "/".to_string(),
        readiness: wait_for(image.clone(), Some(10_000)),
        steps: vec![
            visible(image.clone()),
            expect(Check::AttributePresent {
                locator: image,
                attribute: "srcset".to_string(),
            }),
        ],
        screenshot: PathBuf::from("verification/landing_optimization.png"),
    }
}

fn home() -> Scenario {
    let title = Locator::css(".hero-title");
    Scenario {
        name: "home".to_string(),
        description: Some("Home page loads its hero title".to_string()),
        url: "/".to_string(),
        readiness: wait_for(title.clone(), Some(10_000)),
        steps: vec![visible(title)],
        screenshot: PathBuf::from("verification/home.png"),
    }
}

fn bank() -> Scenario {
    let container = Locator::css(".bank-container");
    Scenario {
        name: "bank".to_string(),
        description: Some("Bank page loads its container".to_string()),
        url: "/bank".to_string(),
        readiness: wait_for(container.clone(), Some(10_000)),
        steps: vec![visible(container)],
        screenshot: PathBuf::from("verification/bank.png"),
    }
}

fn bank_badges() -> Scenario {
    let badge = Locator::css(".badge");
    Scenario {
        name: "bank-badges".to_string(),
        description: Some("Bank page shows badge-styled Max and Copy buttons".to_string()),
        url: "/bank".to_string(),
        readiness: wait_for(badge.clone(), None),
        steps: vec![visible(badge)],
        screenshot: PathBuf::from("verification/bank_page_badges.png"),
    }
}

/// Markets list is filled by a client-side fetch with no marker element
fn markets() -> Scenario {
    Scenario {
        name: "markets".to_string(),
        description: Some("Markets page after its market list fetch".to_string()),
        url: "/markets".to_string(),
        readiness: Readiness::FixedDelay { delay_ms: 5_000 },
        steps: Vec::new(),
        screenshot: PathBuf::from("verification/markets_page.png"),
    }
}

/// Malformed stake amounts are rejected before any transaction is sent
fn betting_validation() -> Scenario {
    let amount = Locator::label("Amount to Stake");
    Scenario {
        name: "betting-validation".to_string(),
        description: Some("Betting widget rejects a scientific-notation stake".to_string()),
        url: "/markets/0".to_string(),
        readiness: Readiness::TextVisible {
            text: "Commit phase".to_string(),
            timeout_ms: None,
        },
        steps: vec![
            visible(amount.clone()),
            Step::Fill {
                locator: amount,
                value: "1e5".to_string(),
            },
            Step::Click(Locator::role("button", "Commit bet")),
            expect(Check::TextContains {
                locator: Locator::css("#status-message"),
                substring: "Invalid HLX amount format.".to_string(),
            }),
        ],
        screenshot: PathBuf::from("verification/betting_validation.png"),
    }
}

/// Outcome toggle: exactly one option carries its highlight style
fn ux_outcome_toggle() -> Scenario {
    let yes = Locator::css_with_text("label", "YES");
    let no = Locator::css_with_text("label", "NO");
    let unaligned = Locator::css_with_text("label", "UNALIGNED");
    Scenario {
        name: "ux-outcome-toggle".to_string(),
        description: Some("Outcome labels switch between highlighted and outline styles".to_string()),
        url: "/verify_ux".to_string(),
        readiness: wait_for(Locator::css("h1"), Some(10_000)),
        steps: vec![
            has_class(yes.clone(), "primary"),
            Step::Click(no.clone()),
            has_class(no, "danger"),
            has_class(yes, "outline"),
            Step::Click(unaligned.clone()),
            has_class(unaligned, "secondary"),
        ],
        screenshot: PathBuf::from("verification/ux_verification.png"),
    }
}

/// The fixed scenario table, in run order
pub fn builtin_scenarios() -> Vec<Scenario> {
    vec![
        landing_image(),
        home(),
        bank(),
        bank_badges(),
        markets(),
        betting_validation(),
        ux_outcome_toggle(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_scenario_shape() {
        let bank = bank();
        assert_eq!(bank.url, "/bank");
        assert_eq!(
            bank.readiness,
            Readiness::SelectorVisible {
                locator: Locator::css(".bank-container"),
                timeout_ms: Some(10_000),
            }
        );
        assert_eq!(bank.steps, vec![visible(Locator::css(".bank-container"))]);
    }

    #[test]
    fn test_only_landing_has_advisory_check() {
        for scenario in builtin_scenarios() {
            let advisory = scenario.steps.iter().any(|step| {
                matches!(step, Step::Expect(check) if check.is_advisory())
            });
            assert_eq!(advisory, scenario.name == "landing-image", "{}", scenario.name);
        }
    }

    #[test]
    fn test_screenshot_paths_are_distinct() {
        let scenarios = builtin_scenarios();
        let mut paths: Vec<_> = scenarios.iter().map(|s| s.screenshot.clone()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), scenarios.len());
    }
}
