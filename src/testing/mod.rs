//! Scenario runner
//!
//! Reads YAML test scenarios and runs them against the booking platform.
//! Writes are confirmed by polling the affected resource and comparing it
//! structurally, so assertions are made against parsed JSON rather than
//! raw response text.

mod config;
mod runner;

pub use config::*;
pub use runner::{execute_scenario, load_scenario, parse_scenario, run_scenario, TestResult};
