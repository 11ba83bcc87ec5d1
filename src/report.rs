//! Result output
//!
//! Result lines go to stdout, one per scenario, in the order scenarios ran.
//! Diagnostics (warnings, screenshot paths, captured HTML) follow their
//! result line, indented.

use colored::Colorize;

use crate::common::Result;
use crate::runner::{Outcome, RunResult};
use crate::scenario::Scenario;

/// How much of captured page content to print without `--verbose`
const CONTENT_PREVIEW: usize = 500;

/// Output format for result lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

/// Print one result as soon as it is available
pub fn print_result(result: &RunResult, format: Format, verbose: bool) -> Result<()> {
    if format == Format::Json {
        println!("{}", serde_json::to_string(result)?);
        return Ok(());
    }

    let status = match &result.outcome {
        Outcome::Pass => "PASS".green().bold().to_string(),
        Outcome::Fail(failure) => format!("{}({})", "FAIL".red().bold(), failure),
        Outcome::Error(message) => format!("{}({})", "ERROR".yellow().bold(), message),
    };
    println!("{}: {}", result.scenario, status);

    for warning in &result.warnings {
        println!("  {} {}", "warning:".yellow(), warning);
    }
    if verbose {
        if let Some(path) = &result.screenshot {
            println!("  {} {}", "screenshot:".dimmed(), path.display());
        }
        println!(
            "  {} {}ms, {} navigation attempt(s), reached {}",
            "timing:".dimmed(),
            result.elapsed_ms,
            result.navigation_attempts,
            result.reached
        );
    }
    if let Some(content) = &result.page_content {
        println!("  {}", "page content at timeout:".dimmed());
        println!("{}", indent(&preview(content, verbose)));
    }
    Ok(())
}

fn preview(content: &str, verbose: bool) -> String {
    if verbose || content.chars().count() <= CONTENT_PREVIEW {
        return content.to_string();
    }
    let head: String = content.chars().take(CONTENT_PREVIEW).collect();
    format!("{head}... ({} chars total, --verbose for all)", content.chars().count())
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print the closing tally
pub fn print_summary(results: &[RunResult]) {
    let passed = results.iter().filter(|r| r.outcome.is_pass()).count();
    let failed = results
        .iter()
        .filter(|r| matches!(r.outcome, Outcome::Fail(_)))
        .count();
    let errored = results.len() - passed - failed;

    let line = format!("{passed} passed, {failed} failed, {errored} errored");
    if passed == results.len() {
        println!("\n{} {}", "✓".green().bold(), line.green());
    } else {
        println!("\n{} {}", "✗".red().bold(), line.red());
    }
}

/// Print the scenario table for `list`
pub fn print_scenarios(scenarios: &[Scenario]) {
    let width = scenarios.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for scenario in scenarios {
        let description = scenario.description.as_deref().unwrap_or("");
        println!(
            "{}  {}  {} step(s)  {}",
            format!("{:<width$}", scenario.name).bold(),
            scenario.url.dimmed(),
            scenario.steps.len(),
            description,
        );
    }
}

/// Names of scenarios whose result was not a pass
pub fn not_passed(results: &[RunResult]) -> Vec<String> {
    results
        .iter()
        .filter(|r| !r.outcome.is_pass())
        .map(|r| r.scenario.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{CheckFailure, Stage};

    fn result(name: &str, outcome: Outcome) -> RunResult {
        RunResult {
            scenario: name.to_string(),
            outcome,
            reached: Stage::Ready,
            screenshot: None,
            warnings: Vec::new(),
            page_content: None,
            navigation_attempts: 1,
            elapsed_ms: 12,
        }
    }

    #[test]
    fn test_not_passed_keeps_run_order() {
        let results = vec![
            result("markets", Outcome::Error("boom".to_string())),
            result("bank", Outcome::Pass),
            result(
                "home",
                Outcome::Fail(CheckFailure {
                    step: 1,
                    description: "css=.hero-title visible".to_string(),
                    expected: "visible element".to_string(),
                    observed: "hidden element".to_string(),
                }),
            ),
        ];
        assert_eq!(not_passed(&results), vec!["markets", "home"]);
    }

    #[test]
    fn test_preview_cuts_long_content() {
        let html = "a".repeat(CONTENT_PREVIEW + 10);
        let short = preview(&html, false);
        assert!(short.starts_with(&"a".repeat(CONTENT_PREVIEW)));
        assert!(short.contains("510 chars total"));
        assert_eq!(preview(&html, true), html);
    }

    #[test]
    fn test_indent() {
        assert_eq!(indent("<html>\n</html>"), "    <html>\n    </html>");
    }
}
