//! pagecheck - end-to-end page verification for a web application
//!
//! Each scenario names a page, a readiness condition, an ordered list of
//! interactions and checks, and a screenshot path. The runner gives every
//! scenario its own browser session and turns each run into exactly one
//! PASS, FAIL or ERROR result.

pub mod browser;
pub mod cli;
pub mod commands;
pub mod common;
pub mod report;
pub mod runner;
pub mod scenario;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use runner::{Outcome, RunResult, VerificationRunner};
pub use scenario::{Check, Readiness, Scenario, Step};
