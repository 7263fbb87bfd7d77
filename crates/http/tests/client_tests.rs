//! Integration tests for the storefront HTTP client

use reqwest::header::{self, HeaderValue};
use serde_json::{Value, json};
use storefront_core::{Credentials, ProfileUpdate, RegisterRequest};
use storefront_http::{ApiClient, ClientError, RequestOptions};
use wiremock::matchers::{body_json, header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_client_builder_requires_base_url() {
    let result = ApiClient::builder().build();
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}

#[tokio::test]
async fn test_get_profile_returns_user() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/profile/"))
        .and(header_eq("authorization", "Bearer A"))
        .and(header_eq("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "1",
            "email": "a@b.com",
            "username": "a"
        })))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    client.set_token(Some("A".to_string()));

    let user = client.get_profile().await.unwrap();
    assert_eq!(user.id, "1");
    assert_eq!(user.email, "a@b.com");
    assert_eq!(user.username, "a");
    assert_eq!(user.first_name, None);
    assert_eq!(user.last_name, None);
}

#[tokio::test]
async fn test_unauthorized_profile_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/profile/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "invalid token"})),
        )
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    client.set_token(Some("stale".to_string()));

    match client.get_profile().await {
        Err(ClientError::Api { status, data }) => {
            assert_eq!(status, 401);
            assert_eq!(data["detail"], "invalid token");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_error_body_becomes_empty_object() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token/"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    let err = client
        .login(&Credentials::new("testuser", "testpassword123"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(502));
    match err {
        ClientError::Api { data, .. } => assert_eq!(data, json!({})),
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_login_posts_username_and_password() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token/"))
        .and(body_json(json!({
            "username": "testuser",
            "password": "testpassword123"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "A", "refresh": "R"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    let pair = client
        .login(&Credentials::new("testuser", "testpassword123"))
        .await
        .unwrap();

    assert_eq!(pair.access, "A");
    assert_eq!(pair.refresh, "R");
}

#[tokio::test]
async fn test_no_authorization_header_without_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "A", "refresh": "R"})),
        )
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    client
        .login(&Credentials::new("testuser", "testpassword123"))
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_logout_without_body_resolves_to_unit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    client.set_token(Some("A".to_string()));
    client.logout().await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_revoke_sends_refresh_and_ignores_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .and(body_json(json!({"refresh": "R"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "Successfully logged out"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    client.revoke("R").await.unwrap();
}

#[tokio::test]
async fn test_refresh_token_without_rotation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .and(body_json(json!({"refresh": "R"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    let refreshed = client.refresh_token("R").await.unwrap();
    assert_eq!(refreshed.access, "A2");
    assert_eq!(refreshed.refresh, None);
}

#[tokio::test]
async fn test_update_profile_puts_partial_user() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/auth/profile/"))
        .and(body_json(json!({"first_name": "Test"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "email": "t@t.com",
            "username": "testuser",
            "first_name": "Test",
            "last_name": ""
        })))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    client.set_token(Some("A".to_string()));

    let update = ProfileUpdate {
        first_name: Some("Test".to_string()),
        ..Default::default()
    };
    let user = client.update_profile(&update).await.unwrap();
    assert_eq!(user.id, "1");
    assert_eq!(user.first_name.as_deref(), Some("Test"));
}

#[tokio::test]
async fn test_register_validation_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "username": ["A user with that username already exists."]
        })))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    let request = RegisterRequest {
        username: "existinguser".to_string(),
        email: "e@example.com".to_string(),
        password: "newpass123".to_string(),
        password_confirm: Some("newpass123".to_string()),
        first_name: None,
        last_name: None,
    };

    let err = client.register(&request).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.detail(), None);
}

#[tokio::test]
async fn test_caller_headers_override_defaults() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/catalog/"))
        .and(header_eq("authorization", "Bearer override"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    client.set_token(Some("A".to_string()));

    let options = RequestOptions::get().header(
        header::AUTHORIZATION,
        HeaderValue::from_static("Bearer override"),
    );
    let items: Value = client.request("/api/catalog/", options).await.unwrap();
    assert_eq!(items, json!([1, 2, 3]));
}

#[tokio::test]
async fn test_malformed_success_body_is_serialization_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/profile/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri()).unwrap();
    let err = client.get_profile().await.unwrap_err();
    assert!(matches!(err, ClientError::Serialization(_)));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_network_failure_is_transport_error() {
    // Nothing listens on the discard port
    let client = ApiClient::new("http://127.0.0.1:9").unwrap();
    let err = client.get_profile().await.unwrap_err();

    assert!(err.is_transport());
    assert_eq!(err.status(), None);
}
