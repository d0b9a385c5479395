//! Test scenario configuration types
//!
//! Defines the data structures for deserializing YAML test scenarios.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A complete test scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct TestScenario {
    /// Name of the test scenario
    pub name: String,
    /// Optional description of what the test verifies
    pub description: Option<String>,
    /// Overrides the configured API base URL
    pub base_url: Option<String>,
    /// The sequence of test steps to execute
    pub steps: Vec<TestStep>,
}

/// A single test step in the execution flow
#[derive(Deserialize, Debug)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Log in and keep the token for later authenticated steps
    Login {
        /// Defaults to the configured username
        username: Option<String>,
        /// Defaults to the configured password
        password: Option<String>,
        /// Fail if this token was already issued earlier in the run
        #[serde(default)]
        expect_unique: bool,
        /// Set to false to assert that the login is rejected
        #[serde(default = "default_true")]
        expect_success: bool,
    },
    /// Issue one request and check the response
    Request {
        /// HTTP method (default: GET)
        #[serde(default = "default_method")]
        method: String,
        /// Path relative to the base URL, e.g. "/branding"
        path: String,
        /// Query parameters
        #[serde(default)]
        query: BTreeMap<String, Value>,
        /// JSON body
        body: Option<Value>,
        /// Send the session token cookie (default: true)
        #[serde(default = "default_true")]
        auth: bool,
        /// Expected HTTP status
        expect_status: Option<u16>,
        /// Expected body, compared structurally
        expect: Option<Value>,
        /// Only compare the fields listed in `expect`
        #[serde(default)]
        subset: bool,
    },
    /// Poll a resource until it matches
    Await {
        /// Path relative to the base URL
        path: String,
        /// Query parameters
        #[serde(default)]
        query: BTreeMap<String, Value>,
        /// Send the session token cookie (default: true)
        #[serde(default = "default_true")]
        auth: bool,
        /// JSON pointer into the response body, e.g. "/bookings"
        select: Option<String>,
        /// Pick one element of a selected array
        find: Option<FindSpec>,
        /// Expected value, compared structurally
        expect: Value,
        /// Only compare the fields listed in `expect`
        #[serde(default)]
        subset: bool,
        /// Field paths to leave out of the comparison
        #[serde(default)]
        ignore: Vec<String>,
        /// Deadline in seconds (default: from config)
        max_wait_secs: Option<u64>,
        /// Seconds between probes (default: from config)
        interval_secs: Option<u64>,
        /// Float tolerance (default: from config)
        epsilon: Option<f64>,
    },
}

/// Selects the array element whose `field` equals `equals`
#[derive(Deserialize, Debug)]
pub struct FindSpec {
    pub field: String,
    pub equals: Value,
}

fn default_true() -> bool {
    true
}

fn default_method() -> String {
    "GET".to_string()
}
