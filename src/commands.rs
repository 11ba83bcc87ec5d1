//! CLI command definitions
//!
//! Defines the clap commands for the page verification CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run scenarios against the application and report one line per scenario
    Run {
        /// Scenario names to run (default: all, in table order)
        names: Vec<String>,

        /// Load scenarios from YAML file(s) instead of the built-in table.
        /// Can be specified multiple times: -f smoke.yaml -f betting.yaml
        #[arg(long = "file", short = 'f')]
        files: Vec<PathBuf>,

        /// Base URL of the application under test (default: http://localhost:3000)
        #[arg(long)]
        base_url: Option<String>,

        /// Configuration file (default: the user config directory's config.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory that relative screenshot paths are written under
        #[arg(long)]
        screenshot_dir: Option<PathBuf>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,

        /// Print results as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// List available scenarios
    #[command(alias = "ls")]
    List {
        /// Load scenarios from YAML file(s) instead of the built-in table
        #[arg(long = "file", short = 'f')]
        files: Vec<PathBuf>,
    },

    /// Print a scenario as YAML, in the format --file accepts
    Show {
        /// Scenario name
        name: String,

        /// Load scenarios from YAML file(s) instead of the built-in table
        #[arg(long = "file", short = 'f')]
        files: Vec<PathBuf>,
    },
}
