//! pagecheck - end-to-end page verification for a web application
//!
//! Drives a headless Chromium through a table of scenarios and reports
//! one PASS, FAIL or ERROR line per scenario.

use clap::Parser;
use commands::Commands;
use pagecheck::common::logging;
use pagecheck::{cli, commands};

#[derive(Parser)]
#[command(name = "pagecheck", about = "End-to-end page verification runner")]
#[command(version, long_about = None)]
struct Cli {
    /// Debug logging, full captured page content and screenshot paths
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_cli(cli.verbose);

    if let Err(e) = cli::dispatch(cli.command, cli.verbose).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
