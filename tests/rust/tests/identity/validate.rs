//! Token validation endpoint tests

use pretty_assertions::assert_eq;
use twitchid_core::{AuthError, IdentityVerifier};
use twitchid_provider::IdentityClient;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_validate_token_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth2/validate"))
        .and(header("Authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "client_id": "client-id",
            "login": "clarkio",
            "scopes": ["user:read:email"],
            "user_id": "42",
            "expires_in": 5520838,
        })))
        .mount(&server)
        .await;

    let client = IdentityClient::with_base_url(&server.uri());
    let validation = client.validate_token("abc123").await.unwrap();

    assert!(validation.valid);
    assert_eq!(validation.login, "clarkio");
}

#[tokio::test]
async fn test_validate_token_rejection_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth2/validate"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "status": 401,
            "message": "invalid access token",
        })))
        .mount(&server)
        .await;

    let client = IdentityClient::with_base_url(&server.uri());
    let validation = client.validate_token("stale").await.unwrap();

    assert!(!validation.valid);
    assert_eq!(validation.login, "");
}

#[tokio::test]
async fn test_validate_token_transport_failure_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = IdentityClient::with_base_url(&format!("http://127.0.0.1:{port}"));
    let error = client.validate_token("abc123").await.unwrap_err();

    assert!(matches!(error, AuthError::Network(_)));
}
