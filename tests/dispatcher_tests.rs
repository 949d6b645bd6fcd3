//! Request dispatch behavior against a mock vault.

use std::time::Duration;
use vault_api_client::{AuthError, Client, ClientConfig, ProtocolVersion, RequestError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_ENVELOPE: &str =
    r#"{"protected":"eyJhbGciOiJ0ZXN0In0=","payload":"eyJzdWIiOiJhbGljZSJ9","signature":"c2ln"}"#;

const AUTHN_PATH: &str = "/authn/cucumber/alice/authenticate";
const RESOURCE_PATH: &str = "/resources/cucumber/variable/db-password";

async fn mount_authn(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(AUTHN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(TOKEN_ENVELOPE))
        .mount(server)
        .await;
}

fn test_config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(server.uri(), "cucumber")
        .with_timeout(Duration::from_secs(2))
        .with_retry_delay(Duration::from_millis(1))
}

fn test_client(server: &MockServer) -> Client {
    Client::from_api_key(test_config(server), "alice", "api-key").expect("client")
}

async fn requests_to(server: &MockServer, target: &str) -> usize {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .filter(|r| r.url.path() == target)
        .count()
}

#[tokio::test]
async fn rejected_token_is_retried_exactly_once() {
    let server = MockServer::start().await;
    mount_authn(&server).await;

    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "cucumber:variable:db-password"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let resource = client
        .resource("cucumber:variable:db-password")
        .await
        .expect("resource");
    assert_eq!(resource.id, "cucumber:variable:db-password");

    // One initial attempt plus exactly one re-authenticated retry.
    assert_eq!(requests_to(&server, RESOURCE_PATH).await, 2);
    // The 401 invalidated the cached token, forcing a second mint.
    assert_eq!(requests_to(&server, AUTHN_PATH).await, 2);
}

#[tokio::test]
async fn double_rejection_is_terminal() {
    let server = MockServer::start().await;
    mount_authn(&server).await;
    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .resource("cucumber:variable:db-password")
        .await
        .expect_err("forbidden");
    assert!(matches!(err, RequestError::Forbidden(_)));
    // No third attempt against a consistently rejecting server.
    assert_eq!(requests_to(&server, RESOURCE_PATH).await, 2);
}

#[tokio::test]
async fn server_errors_are_retried_with_bounded_budget() {
    let server = MockServer::start().await;
    mount_authn(&server).await;
    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = test_config(&server).with_max_retries(2);
    let client = Client::from_api_key(config, "alice", "api-key").expect("client");

    let err = client
        .resource("cucumber:variable:db-password")
        .await
        .expect_err("unavailable");
    assert!(matches!(err, RequestError::Unavailable(_)));
    assert!(err.is_retryable());
    // Initial attempt plus two retries.
    assert_eq!(requests_to(&server, RESOURCE_PATH).await, 3);
}

#[tokio::test]
async fn transient_server_error_recovers() {
    let server = MockServer::start().await;
    mount_authn(&server).await;
    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "cucumber:variable:db-password"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    client
        .resource("cucumber:variable:db-password")
        .await
        .expect("resource after retry");
    assert_eq!(requests_to(&server, RESOURCE_PATH).await, 2);
}

#[tokio::test]
async fn listing_on_legacy_makes_no_network_call() {
    let server = MockServer::start().await;
    let config = test_config(&server).with_version(ProtocolVersion::Legacy);
    let client = Client::from_api_key(config, "alice", "api-key").expect("client");

    let err = client.resources(None).await.expect_err("unsupported");
    assert!(matches!(err, RequestError::UnsupportedOperation(_)));
    assert!(
        server
            .received_requests()
            .await
            .expect("request recording enabled")
            .is_empty()
    );
}

#[tokio::test]
async fn missing_resource_maps_to_not_found() {
    let server = MockServer::start().await;
    mount_authn(&server).await;
    Mock::given(method("GET"))
        .and(path("/resources/cucumber/variable/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .resource("cucumber:variable:missing")
        .await
        .expect_err("not found");
    assert!(matches!(err, RequestError::NotFound(_)));
    assert_eq!(requests_to(&server, "/resources/cucumber/variable/missing").await, 1);
}

#[tokio::test]
async fn rejected_credentials_fail_fast_as_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(AUTHN_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .resource("cucumber:variable:db-password")
        .await
        .expect_err("unauthenticated");
    assert!(matches!(
        err,
        RequestError::Unauthenticated(AuthError::InvalidCredentials(_))
    ));
    // Rejected credentials are not silently retried.
    assert_eq!(requests_to(&server, AUTHN_PATH).await, 1);
    assert_eq!(requests_to(&server, RESOURCE_PATH).await, 0);
}
