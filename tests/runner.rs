//! Scenario runs against a mock booking platform

use booker::common::config::Config;
use booker::testing::{execute_scenario, parse_scenario, TestResult};
use booker::SeenTokens;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.api.request_timeout_secs = 5;
    config
}

async fn run(server: &MockServer, yaml: &str, seen_tokens: &SeenTokens) -> TestResult {
    let scenario = parse_scenario(yaml).unwrap();
    execute_scenario(scenario, &config_for(server), seen_tokens, false)
        .await
        .unwrap()
}

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": token })))
        .mount(server)
        .await;
}

fn listing(firstname: &str) -> serde_json::Value {
    json!({
        "bookings": [
            { "bookingid": 1, "roomid": 1, "firstname": "Sally", "lastname": "Brown" },
            { "bookingid": 3, "roomid": 1, "firstname": firstname, "lastname": "Dean" }
        ]
    })
}

const AWAIT_CHANGED: &str = r#"
name: Booking change becomes visible
steps:
  - action: login
  - action: await
    path: /booking
    query:
      roomid: 1
    select: /bookings
    find:
      field: bookingid
      equals: 3
    expect:
      firstname: Changed
      lastname: Dean
    subset: true
    max_wait_secs: MAX_WAIT
    interval_secs: 1
"#;

#[tokio::test]
async fn test_await_matches_after_stale_listings() {
    let server = MockServer::start().await;
    mount_login(&server, "abc123").await;
    Mock::given(method("GET"))
        .and(path("/booking"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing("Mark")))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/booking"))
        .and(query_param("roomid", "1"))
        .and(header("cookie", "token=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing("Changed")))
        .mount(&server)
        .await;

    let yaml = AWAIT_CHANGED.replace("MAX_WAIT", "10");
    let result = run(&server, &yaml, &SeenTokens::new()).await;

    assert!(result.passed, "{:?}", result.error);
    assert_eq!(result.steps_run, 2);

    let reads = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "GET")
        .count();
    assert_eq!(reads, 3);
}

#[tokio::test]
async fn test_await_timeout_lists_remaining_differences() {
    let server = MockServer::start().await;
    mount_login(&server, "abc123").await;
    Mock::given(method("GET"))
        .and(path("/booking"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing("Mark")))
        .mount(&server)
        .await;

    let yaml = AWAIT_CHANGED.replace("MAX_WAIT", "2");
    let result = run(&server, &yaml, &SeenTokens::new()).await;

    assert!(!result.passed);
    assert_eq!(result.steps_run, 2);
    let error = result.error.unwrap();
    assert!(error.contains("condition not met within 2 seconds"), "{}", error);
    assert!(error.contains("remaining differences"), "{}", error);
    assert!(error.contains("firstname: expected \"Changed\", got \"Mark\""), "{}", error);
    assert!(!error.contains("lastname:"), "{}", error);
}

#[tokio::test]
async fn test_await_on_missing_element_times_out_without_report() {
    let server = MockServer::start().await;
    mount_login(&server, "abc123").await;
    Mock::given(method("GET"))
        .and(path("/booking"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "bookings": [] })))
        .mount(&server)
        .await;

    let yaml = AWAIT_CHANGED.replace("MAX_WAIT", "1");
    let result = run(&server, &yaml, &SeenTokens::new()).await;

    let error = result.error.unwrap();
    assert!(error.contains("last observed: <absent>"), "{}", error);
    assert!(!error.contains("remaining differences"), "{}", error);
}

#[tokio::test]
async fn test_repeated_token_fails_unique_login() {
    let server = MockServer::start().await;
    mount_login(&server, "same-token").await;

    let yaml = r#"
name: Logins issue fresh tokens
steps:
  - action: login
    expect_unique: true
  - action: login
    expect_unique: true
"#;
    let seen_tokens = SeenTokens::new();
    let result = run(&server, yaml, &seen_tokens).await;

    assert!(!result.passed);
    assert_eq!(result.steps_run, 2);
    assert!(result.error.unwrap().contains("already issued"));
    assert!(seen_tokens.contains("same-token"));
}

#[tokio::test]
async fn test_seen_tokens_span_scenarios() {
    let server = MockServer::start().await;
    mount_login(&server, "same-token").await;

    let yaml = "name: Single login\nsteps:\n  - action: login\n    expect_unique: true\n";
    let seen_tokens = SeenTokens::new();

    assert!(run(&server, yaml, &seen_tokens).await.passed);
    assert!(!run(&server, yaml, &seen_tokens).await.passed);

    seen_tokens.clear();
    assert!(run(&server, yaml, &seen_tokens).await.passed);
}

#[tokio::test]
async fn test_rejected_login_expected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let yaml = r#"
name: Wrong password is rejected
steps:
  - action: login
    password: wrong
    expect_success: false
  - action: login
"#;
    let result = run(&server, yaml, &SeenTokens::new()).await;

    assert!(!result.passed);
    assert_eq!(result.steps_run, 2);
    assert!(result.error.unwrap().contains("status 401"));
}

#[tokio::test]
async fn test_request_step_checks_status_and_body() {
    let server = MockServer::start().await;
    mount_login(&server, "abc123").await;
    Mock::given(method("PUT"))
        .and(path("/branding"))
        .and(header("cookie", "token=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/booking/99"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let yaml = r#"
name: Requests
steps:
  - action: login
  - action: request
    method: PUT
    path: /branding
    body:
      description: Changed
    expect_status: 200
    expect:
      success: true
  - action: request
    method: DELETE
    path: /booking/99
    expect_status: 202
"#;
    let result = run(&server, yaml, &SeenTokens::new()).await;

    assert!(!result.passed);
    assert_eq!(result.steps_run, 3);
    assert!(result.error.unwrap().contains("expected status 202, got 500"));
}

#[tokio::test]
async fn test_authenticated_step_needs_login() {
    let server = MockServer::start().await;

    let yaml = "name: No login\nsteps:\n  - action: request\n    path: /booking\n";
    let result = run(&server, yaml, &SeenTokens::new()).await;

    assert!(!result.passed);
    assert!(result.error.unwrap().contains("login"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_scenario_epsilon_must_be_valid() {
    let server = MockServer::start().await;

    let yaml = r#"
name: Bad tolerance
steps:
  - action: await
    path: /branding
    auth: false
    expect:
      map:
        latitude: 52.6351204
    epsilon: -0.1
"#;
    let result = run(&server, yaml, &SeenTokens::new()).await;

    assert!(!result.passed);
    assert!(result.error.unwrap().contains("epsilon"));
    assert!(server.received_requests().await.unwrap().is_empty());
}
