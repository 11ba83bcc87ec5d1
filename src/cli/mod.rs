//! CLI command handling
//!
//! Loads configuration and scenarios, drives the browser and formats output.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::browser::ChromeDriver;
use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::report::{self, Format};
use crate::runner::{RunResult, RunSettings, VerificationRunner};
use crate::scenario::{self, Scenario};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, verbose: bool) -> Result<()> {
    match command {
        Commands::Run {
            names,
            files,
            base_url,
            config,
            screenshot_dir,
            headed,
            json,
        } => {
            let config = load_config(config.as_deref(), base_url, screenshot_dir, headed)?;
            // Resolve names before paying for a browser launch
            let scenarios = scenario::select(scenario::load(&files)?, &names)?;
            if scenarios.is_empty() {
                println!("No scenarios to run.");
                return Ok(());
            }
            let format = if json { Format::Json } else { Format::Text };

            run(&config, &scenarios, format, verbose).await
        }

        Commands::List { files } => {
            let scenarios = scenario::load(&files)?;
            if scenarios.is_empty() {
                println!("No scenarios defined.");
            } else {
                report::print_scenarios(&scenarios);
            }
            Ok(())
        }

        Commands::Show { name, files } => {
            let scenarios = scenario::select(scenario::load(&files)?, &[name])?;
            print!("{}", scenario::to_yaml(&scenarios)?);
            Ok(())
        }
    }
}

fn load_config(
    path: Option<&Path>,
    base_url: Option<String>,
    screenshot_dir: Option<PathBuf>,
    headed: bool,
) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(base_url) = base_url {
        config = config.with_base_url(base_url)?;
    }
    if screenshot_dir.is_some() {
        config.output.screenshot_dir = screenshot_dir;
    }
    if headed {
        config.browser.headless = false;
    }
    Ok(config)
}

async fn run(config: &Config, scenarios: &[Scenario], format: Format, verbose: bool) -> Result<()> {
    info!(
        "Running {} scenario(s) against {}",
        scenarios.len(),
        config.base_url
    );

    let driver = match ChromeDriver::launch(&config.browser).await {
        Ok(driver) => driver,
        Err(e) => {
            warn!("{}", e);
            let message = e.to_string();
            let results: Vec<RunResult> = scenarios
                .iter()
                .map(|scenario| RunResult::not_started(&scenario.name, message.as_str()))
                .collect();
            for result in &results {
                report::print_result(result, format, verbose)?;
            }
            return conclude(&results, format);
        }
    };
    let runner = VerificationRunner::new(&driver, RunSettings::from_config(config));

    let mut output_error = None;
    let results = runner
        .run_all(scenarios, |result| {
            if let Err(e) = report::print_result(result, format, verbose) {
                output_error.get_or_insert(e);
            }
        })
        .await;

    if let Err(e) = driver.shutdown().await {
        warn!("Browser did not shut down cleanly: {}", e);
    }
    if let Some(e) = output_error {
        return Err(e);
    }

    conclude(&results, format)
}

/// Print the summary and turn any non-pass into the exit error
fn conclude(results: &[RunResult], format: Format) -> Result<()> {
    if format == Format::Text {
        report::print_summary(results);
    }

    let failed = report::not_passed(results);
    if failed.is_empty() {
        Ok(())
    } else {
        Err(Error::ScenariosFailed(failed))
    }
}
