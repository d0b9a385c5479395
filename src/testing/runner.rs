//! Test runner implementation
//!
//! Executes test scenarios against the booking platform. Mutations are
//! checked by polling the affected resource until it structurally matches
//! the expected body, so scenarios stay stable when writes take a while
//! to become visible.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use reqwest::Method;
use serde_json::Value;

use crate::api::{BookerClient, LoginRequest};
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::compare::{Comparator, MismatchReport};
use crate::poll::{poll_until, PollConfig};
use crate::tokens::SeenTokens;

use super::config::{FindSpec, TestScenario, TestStep};

/// Result of a test run
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    pub error: Option<String>,
}

/// State carried from step to step
struct RunContext<'a> {
    client: BookerClient,
    config: &'a Config,
    seen_tokens: &'a SeenTokens,
    token: Option<String>,
    verbose: bool,
}

impl RunContext<'_> {
    fn token_for(&self, auth: bool) -> Result<Option<&str>> {
        if !auth {
            return Ok(None);
        }
        self.token.as_deref().map(Some).ok_or_else(|| {
            Error::TestAssertion(
                "step needs a session token; add a 'login' step first or set 'auth: false'"
                    .to_string(),
            )
        })
    }
}

/// Load a scenario from a YAML file
pub fn load_scenario(path: &Path) -> Result<TestScenario> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;

    parse_scenario(&content)
}

/// Parse a scenario from YAML text
pub fn parse_scenario(content: &str) -> Result<TestScenario> {
    serde_yaml::from_str(content)
        .map_err(|e| Error::Scenario(format!("Failed to parse test scenario: {}", e)))
}

/// Run a test scenario from a YAML file
///
/// `seen_tokens` belongs to the whole run: pass the same set to every
/// scenario so token uniqueness is checked across them.
pub async fn run_scenario(
    path: &Path,
    config: &Config,
    seen_tokens: &SeenTokens,
    verbose: bool,
) -> Result<TestResult> {
    let scenario = load_scenario(path)?;
    execute_scenario(scenario, config, seen_tokens, verbose).await
}

/// Run an already-parsed scenario
pub async fn execute_scenario(
    scenario: TestScenario,
    config: &Config,
    seen_tokens: &SeenTokens,
    verbose: bool,
) -> Result<TestResult> {
    let steps_total = scenario.steps.len();

    println!(
        "\n{} {}",
        "Running Test:".blue().bold(),
        scenario.name.white().bold()
    );

    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }

    let client = match &scenario.base_url {
        Some(base_url) => BookerClient::new(
            base_url,
            Duration::from_secs(config.api.request_timeout_secs),
        )?,
        None => BookerClient::from_config(&config.api)?,
    };

    if verbose {
        println!("  Target: {}", client.base_url().dimmed());
    }

    let mut ctx = RunContext {
        client,
        config,
        seen_tokens,
        token: None,
        verbose,
    };

    println!("\n{}", "Steps:".cyan());

    for (i, step) in scenario.steps.iter().enumerate() {
        let step_num = i + 1;

        if let Err(e) = execute_step(&mut ctx, step, step_num).await {
            println!("  {} Step {}: {}", "✗".red(), step_num, e);

            return Ok(TestResult {
                name: scenario.name,
                passed: false,
                steps_run: step_num,
                steps_total,
                error: Some(e.to_string()),
            });
        }
    }

    println!(
        "\n{} {}\n",
        "✓".green().bold(),
        "Test Passed".green().bold()
    );

    Ok(TestResult {
        name: scenario.name,
        passed: true,
        steps_run: steps_total,
        steps_total,
        error: None,
    })
}

/// Execute a single test step
async fn execute_step(ctx: &mut RunContext<'_>, step: &TestStep, step_num: usize) -> Result<()> {
    match step {
        TestStep::Login {
            username,
            password,
            expect_unique,
            expect_success,
        } => {
            execute_login_step(
                ctx,
                username.as_deref(),
                password.as_deref(),
                *expect_unique,
                *expect_success,
                step_num,
            )
            .await
        }
        TestStep::Request {
            method,
            path,
            query,
            body,
            auth,
            expect_status,
            expect,
            subset,
        } => {
            execute_request_step(
                ctx,
                RequestParams {
                    method,
                    path,
                    query,
                    body: body.as_ref(),
                    auth: *auth,
                    expect_status: *expect_status,
                    expect: expect.as_ref(),
                    subset: *subset,
                },
                step_num,
            )
            .await
        }
        TestStep::Await {
            path,
            query,
            auth,
            select,
            find,
            expect,
            subset,
            ignore,
            max_wait_secs,
            interval_secs,
            epsilon,
        } => {
            let poll = ctx.config.polling.poll_config(*max_wait_secs, *interval_secs)?;

            let mut comparator = ctx.config.comparison.comparator(*epsilon)?.subset(*subset);
            for ignored in ignore {
                comparator = comparator.ignore(ignored.clone());
            }

            execute_await_step(
                ctx,
                AwaitParams {
                    path,
                    query,
                    auth: *auth,
                    select: select.as_deref(),
                    find: find.as_ref(),
                    expect,
                },
                &comparator,
                &poll,
                step_num,
            )
            .await
        }
    }
}

/// Execute a login step
async fn execute_login_step(
    ctx: &mut RunContext<'_>,
    username: Option<&str>,
    password: Option<&str>,
    expect_unique: bool,
    expect_success: bool,
    step_num: usize,
) -> Result<()> {
    let credentials = &ctx.config.credentials;
    let request = LoginRequest::new(
        username.unwrap_or(&credentials.username),
        password.unwrap_or(&credentials.password),
    );

    let result = ctx.client.login(&request).await;

    if !expect_success {
        return match result {
            Err(Error::ApiStatus { status, .. }) => {
                println!(
                    "  {} Step {}: login rejected with {} (expected failure)",
                    "✓".green(),
                    step_num,
                    status.to_string().dimmed()
                );
                Ok(())
            }
            Err(e) => Err(e),
            Ok(_) => Err(Error::TestAssertion(
                "Login expected to fail but a token was issued".to_string(),
            )),
        };
    }

    let token = result?;

    if expect_unique {
        ctx.seen_tokens.insert_unique(&token)?;
    } else {
        ctx.seen_tokens.insert(token.as_str());
    }

    if ctx.verbose {
        println!("  Token: {}", token.dimmed());
    }

    ctx.token = Some(token);

    println!("  {} Step {}: login", "✓".green(), step_num);

    Ok(())
}

struct RequestParams<'s> {
    method: &'s str,
    path: &'s str,
    query: &'s BTreeMap<String, Value>,
    body: Option<&'s Value>,
    auth: bool,
    expect_status: Option<u16>,
    expect: Option<&'s Value>,
    subset: bool,
}

/// Execute a request step
async fn execute_request_step(
    ctx: &RunContext<'_>,
    params: RequestParams<'_>,
    step_num: usize,
) -> Result<()> {
    let method = parse_method(params.method)?;
    let query = query_pairs(params.query);
    let token = ctx.token_for(params.auth)?;

    let response = ctx
        .client
        .send_raw(method.clone(), params.path, &query, params.body, token)
        .await?;

    if let Some(expected_status) = params.expect_status {
        if response.status != expected_status {
            return Err(Error::TestAssertion(format!(
                "{} {}: expected status {}, got {} (body: {})",
                method, params.path, expected_status, response.status, response.body
            )));
        }
    }

    if let Some(expected) = params.expect {
        let comparator = ctx.config.comparison.comparator(None)?.subset(params.subset);
        let report = MismatchReport::new(comparator.compare_values(expected, &response.body, ""));
        if !report.is_empty() {
            return Err(Error::TestAssertion(format!(
                "{} {}: response differs from expected:\n{}",
                method, params.path, report
            )));
        }
    }

    println!(
        "  {} Step {}: {} {} ({})",
        "✓".green(),
        step_num,
        method,
        params.path.dimmed(),
        response.status
    );

    Ok(())
}

struct AwaitParams<'s> {
    path: &'s str,
    query: &'s BTreeMap<String, Value>,
    auth: bool,
    select: Option<&'s str>,
    find: Option<&'s FindSpec>,
    expect: &'s Value,
}

/// Execute an await step
async fn execute_await_step(
    ctx: &RunContext<'_>,
    params: AwaitParams<'_>,
    comparator: &Comparator,
    poll: &PollConfig,
    step_num: usize,
) -> Result<()> {
    let query = query_pairs(params.query);
    let query = query.as_slice();
    let token = ctx.token_for(params.auth)?;
    let client = &ctx.client;
    let mut last_report = MismatchReport::default();

    let result = poll_until(
        move || observe(client, params.path, query, token, params.select, params.find),
        |observed| {
            last_report =
                MismatchReport::new(comparator.compare_values(params.expect, observed, ""));
            last_report.is_empty()
        },
        poll,
    )
    .await;

    let observed_any = result.last_observed().is_some();
    if let Err(timeout) = result.into_result() {
        let remaining = if observed_any {
            format!("\nremaining differences:\n{}", last_report)
        } else {
            String::new()
        };
        return Err(Error::TestAssertion(format!(
            "await {}: {}{}",
            params.path, timeout, remaining
        )));
    }

    println!(
        "  {} Step {}: await {} (matched)",
        "✓".green(),
        step_num,
        params.path.dimmed()
    );

    Ok(())
}

/// Fetch a resource once for an await step
async fn observe(
    client: &BookerClient,
    path: &str,
    query: &[(String, String)],
    token: Option<&str>,
    select: Option<&str>,
    find: Option<&FindSpec>,
) -> Result<Option<Value>> {
    let response = client.send_raw(Method::GET, path, query, None, token).await?;

    if !(200..300).contains(&response.status) {
        return Err(Error::api_status(response.status, &response.body.to_string()));
    }

    Ok(select_value(response.body, select, find))
}

/// Narrow a response body to the value an await step compares
///
/// `None` means "not there yet": the pointer does not resolve or no
/// element of the selected array matches `find`.
fn select_value(body: Value, select: Option<&str>, find: Option<&FindSpec>) -> Option<Value> {
    let selected = match select {
        Some(pointer) => body.pointer(pointer)?.clone(),
        None => body,
    };

    match find {
        Some(find) => match selected {
            Value::Array(items) => items
                .into_iter()
                .find(|item| item.get(&find.field) == Some(&find.equals)),
            _ => None,
        },
        None if selected.is_null() => None,
        None => Some(selected),
    }
}

fn parse_method(method: &str) -> Result<Method> {
    Method::from_bytes(method.to_uppercase().as_bytes())
        .map_err(|_| Error::Scenario(format!("Invalid HTTP method: {}", method)))
}

fn query_pairs(query: &BTreeMap<String, Value>) -> Vec<(String, String)> {
    query
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}
