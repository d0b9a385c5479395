//! CLI command definitions
//!
//! Defines the clap commands for the booker CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Compare two JSON files field by field
    Compare {
        /// File with the expected JSON value
        expected: PathBuf,

        /// File with the actual JSON value
        actual: PathBuf,

        /// Absolute tolerance for floating-point fields
        #[arg(long)]
        epsilon: Option<f64>,

        /// Ignore fields that only the actual value has
        #[arg(long)]
        subset: bool,

        /// Field path to leave out (repeatable), e.g. --ignore bookingid
        #[arg(long)]
        ignore: Vec<String>,
    },

    /// Run YAML test scenarios
    Test {
        /// Scenario files
        #[arg(required = true)]
        scenarios: Vec<PathBuf>,

        /// Print tokens and request targets
        #[arg(long, short)]
        verbose: bool,
    },

    /// Log in and print a session token
    Login,

    /// Wait until a booking matches the expected JSON
    AwaitBooking {
        /// Room the booking belongs to
        #[arg(long)]
        room: i64,

        /// Booking ID
        #[arg(long)]
        booking: i64,

        /// File with the expected booking fields
        #[arg(long)]
        expect: PathBuf,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Wait until the branding matches the expected JSON
    AwaitBranding {
        /// File with the expected branding fields
        #[arg(long)]
        expect: PathBuf,

        #[command(flatten)]
        wait: WaitArgs,
    },
}

/// Polling overrides shared by the await commands
#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
    /// Maximum seconds to wait (default: from config)
    #[arg(long)]
    pub max_wait: Option<u64>,

    /// Seconds between probes (default: from config)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Absolute tolerance for floating-point fields
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Require every field to match, not only those in the expected file
    #[arg(long)]
    pub exact: bool,
}
