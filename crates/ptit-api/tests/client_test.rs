#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ptit_api::types::ApiId;
use ptit_api::{ApiClient, Error, SharedSession, StaticToken};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::from_reqwest(
        &format!("{}/api", server.uri()),
        reqwest::Client::new(),
        Arc::new(StaticToken::new(SecretString::from("t0k"))),
    )
    .unwrap();
    (server, client)
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_users_sends_bearer_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(header("authorization", "Bearer t0k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "username": "admin", "email": "admin@ptit.edu.vn", "role": "admin", "status": "active" },
            { "id": 2, "username": "lan", "fullName": "Nguyen Lan", "role": ["user"], "enabled": false },
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let users = client.list_users().await.unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id, ApiId::Number(1));
    assert_eq!(users[0].role.as_deref(), Some("admin"));
    assert_eq!(users[1].full_name.as_deref(), Some("Nguyen Lan"));
    assert_eq!(users[1].enabled, Some(false));
}

#[tokio::test]
async fn test_list_devices_in_data_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "d-1", "name": "Temp sensor", "type": "sensor", "mac": "aa:bb:cc:00:11:22", "status": "active" }
            ]
        })))
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].device_type.as_deref(), Some("sensor"));
    assert_eq!(devices[0].mac_address.as_deref(), Some("aa:bb:cc:00:11:22"));
}

#[tokio::test]
async fn test_create_device_type_posts_body() {
    let (server, client) = setup().await;

    let body = json!({ "name": "Gateway", "category": "network" });

    Mock::given(method("POST"))
        .and(path("/api/device-types"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 9, "name": "Gateway", "category": "network"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.create_device_type(&body).await.unwrap();

    assert_eq!(created.id, ApiId::Number(9));
    assert_eq!(created.category.as_deref(), Some("network"));
}

#[tokio::test]
async fn test_assign_role_targets_user() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/users/7/assign-role"))
        .and(body_json(json!({ "role": "admin" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": 7, "username": "minh", "role": "admin" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = client.assign_role("7", "admin").await.unwrap();
    assert_eq!(user.role.as_deref(), Some("admin"));
}

#[tokio::test]
async fn test_mark_notification_read() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/notifications/42/read"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.mark_notification_read("42").await.unwrap();
}

// ── Error handling tests ────────────────────────────────────────────

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/devices/7"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Device not found" })),
        )
        .mount(&server)
        .await;

    let err = client.delete_device("7").await.unwrap_err();

    assert!(err.is_not_found(), "expected not-found, got: {err:?}");
    assert!(err.to_string().contains("Device not found"));
}

#[tokio::test]
async fn test_rejection_carries_message_and_code() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/users/3"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Email already in use",
            "code": "user.email.duplicate"
        })))
        .mount(&server)
        .await;

    let err = client
        .update_user("3", &json!({ "email": "dup@ptit.edu.vn" }))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(409));
    assert_eq!(err.api_error_code(), Some("user.email.duplicate"));
    assert!(
        matches!(err, Error::Api { ref message, .. } if message == "Email already in use"),
        "expected Api error, got: {err:?}"
    );
}

#[tokio::test]
async fn test_plain_text_error_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/history"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&server)
        .await;

    let err = client.list_history().await.unwrap_err();
    assert!(
        matches!(err, Error::Api { status: 500, ref message, .. } if message == "database unavailable")
    );
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/notifications"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Token expired" })),
        )
        .mount(&server)
        .await;

    let err = client.list_notifications().await.unwrap_err();
    assert!(
        matches!(err, Error::Authentication { ref message } if message == "Token expired"),
        "expected Authentication error, got: {err:?}"
    );
    assert!(err.is_auth_expired());
}

#[tokio::test]
async fn test_no_session_never_hits_network() {
    let server = MockServer::start().await;
    let session = SharedSession::new();
    let client = ApiClient::from_reqwest(
        &server.uri(),
        reqwest::Client::new(),
        Arc::new(session.clone()),
    )
    .unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.list_users().await.unwrap_err();
    assert!(matches!(err, Error::NoSession));
}

#[tokio::test]
async fn test_logout_is_observed_by_client() {
    let server = MockServer::start().await;
    let session = SharedSession::new();
    let client = ApiClient::from_reqwest(
        &server.uri(),
        reqwest::Client::new(),
        Arc::new(session.clone()),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/device-types"))
        .and(header("authorization", "Bearer s3ss10n"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    session.login(SecretString::from("s3ss10n"));
    assert!(client.list_device_types().await.unwrap().is_empty());

    session.logout();
    assert!(matches!(
        client.list_device_types().await,
        Err(Error::NoSession)
    ));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Bind then drop a listener to get a port nobody listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let uri = format!("http://127.0.0.1:{port}");
    let client = ApiClient::from_reqwest(
        &uri,
        reqwest::Client::new(),
        Arc::new(StaticToken::new(SecretString::from("t0k"))),
    )
    .unwrap();

    let err = client.list_devices().await.unwrap_err();
    assert!(err.is_network(), "expected network error, got: {err:?}");
}

#[tokio::test]
async fn test_garbage_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.list_users().await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }));
}
