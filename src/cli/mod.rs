//! CLI command handling
//!
//! Dispatches CLI commands and formats output.

use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use crate::api::BookerClient;
use crate::commands::{Commands, WaitArgs};
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::compare::{Comparator, MismatchReport};
use crate::poll::{try_poll_until, PollConfig};
use crate::testing;
use crate::tokens::SeenTokens;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Compare {
            expected,
            actual,
            epsilon,
            subset,
            ignore,
        } => {
            let expected_value = read_json(&expected)?;
            let actual_value = read_json(&actual)?;

            let mut comparator = config.comparison.comparator(epsilon)?.subset(subset);
            for path in ignore {
                comparator = comparator.ignore(path);
            }

            let report =
                MismatchReport::new(comparator.compare_values(&expected_value, &actual_value, ""));

            if report.is_empty() {
                println!("{} Values match", "✓".green());
            } else {
                println!("{} {} field(s) differ:", "✗".red(), report.len());
                for mismatch in report.mismatches() {
                    println!("  {}", mismatch);
                }
            }

            report.into_result()
        }

        Commands::Test { scenarios, verbose } => {
            let seen_tokens = SeenTokens::new();
            let mut failed = Vec::new();

            for path in &scenarios {
                let result = testing::run_scenario(path, config, &seen_tokens, verbose).await?;
                if !result.passed {
                    failed.push(result);
                }
            }

            println!(
                "{} of {} scenario(s) passed",
                scenarios.len() - failed.len(),
                scenarios.len()
            );

            if failed.is_empty() {
                Ok(())
            } else {
                for result in &failed {
                    println!(
                        "  {} {} (step {}/{}): {}",
                        "✗".red(),
                        result.name,
                        result.steps_run,
                        result.steps_total,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                }
                Err(Error::TestAssertion(format!(
                    "{} scenario(s) failed",
                    failed.len()
                )))
            }
        }

        Commands::Login => {
            let client = BookerClient::from_config(&config.api)?;
            let token = client.login(&config.credentials.login_request()).await?;
            println!("{}", token);
            Ok(())
        }

        Commands::AwaitBooking {
            room,
            booking,
            expect,
            wait,
        } => {
            let client = BookerClient::from_config(&config.api)?;
            let token = client.login(&config.credentials.login_request()).await?;
            let expected = read_json(&expect)?;
            let (poll, comparator) = wait_settings(&wait, config)?;

            tracing::info!(room, booking, "Waiting for booking to match");
            let (client, token) = (&client, token.as_str());
            let found = await_match(
                move || client.find_booking(token, room, booking),
                &expected,
                &comparator,
                &poll,
            )
            .await?;

            println!("{} Booking {} matches", "✓".green(), booking);
            println!("{}", serde_json::to_string_pretty(&found)?);
            Ok(())
        }

        Commands::AwaitBranding { expect, wait } => {
            let client = BookerClient::from_config(&config.api)?;
            let expected = read_json(&expect)?;
            let (poll, comparator) = wait_settings(&wait, config)?;

            tracing::info!("Waiting for branding to match");
            let client = &client;
            let found = await_match(
                move || async move { client.branding().await.map(Some) },
                &expected,
                &comparator,
                &poll,
            )
            .await?;

            println!("{} Branding matches", "✓".green());
            println!("{}", serde_json::to_string_pretty(&found)?);
            Ok(())
        }
    }
}

/// Poll until the probed entity matches `expected`, or fail with the
/// remaining differences
async fn await_match<T, F, Fut>(
    probe: F,
    expected: &Value,
    comparator: &Comparator,
    poll: &PollConfig,
) -> Result<T>
where
    T: Serialize + std::fmt::Debug,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<Option<T>>>,
{
    let mut last_report = MismatchReport::default();

    let result = try_poll_until(
        probe,
        |entity| {
            last_report = MismatchReport::new(comparator.compare(expected, entity)?);
            Ok::<_, Error>(last_report.is_empty())
        },
        poll,
    )
    .await?;

    let observed_any = result.last_observed().is_some();
    result.into_result().map_err(|timeout| {
        if observed_any && !last_report.is_empty() {
            Error::TestAssertion(format!("{}\nremaining differences:\n{}", timeout, last_report))
        } else {
            timeout
        }
    })
}

fn wait_settings(wait: &WaitArgs, config: &Config) -> Result<(PollConfig, Comparator)> {
    let poll = config.polling.poll_config(wait.max_wait, wait.interval)?;
    let comparator = config.comparison.comparator(wait.epsilon)?.subset(!wait.exact);

    Ok((poll, comparator))
}

fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::file_read(path, format!("invalid JSON: {}", e)))
}
