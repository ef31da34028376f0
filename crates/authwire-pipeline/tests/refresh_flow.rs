//! Integration tests for the request pipeline: decoration, token capture,
//! and the refresh-and-retry state machine, driven through a scripted
//! transport so every request that reached the wire can be inspected.

use std::time::Duration;

use authwire_pipeline::{AccessToken, ApiClient, ApiError, ClientConfig, RefreshPolicy};
use authwire_transport::mock::ScriptedTransport;
use authwire_transport::{Method, StatusCode, TransportError};

// =========================================================================
// Helpers
// =========================================================================

const REFRESH: &str = "/auth/refresh";

fn client() -> ApiClient<ScriptedTransport> {
    client_with_policy(RefreshPolicy::Coalesce)
}

fn client_with_policy(policy: RefreshPolicy) -> ApiClient<ScriptedTransport> {
    let config = ClientConfig {
        refresh_policy: policy,
        ..ClientConfig::default()
    };
    ApiClient::new(ScriptedTransport::new(), config).expect("valid config")
}

fn with_token(client: &ApiClient<ScriptedTransport>, token: &str) {
    client.credentials().set(Some(AccessToken::new(token)));
}

fn bearer_of(req: &authwire_transport::HttpRequest) -> Option<&str> {
    req.header("authorization")
}

// =========================================================================
// Decoration
// =========================================================================

#[tokio::test]
async fn test_send_with_token_carries_bearer_header() {
    let client = client();
    with_token(&client, "T1");
    client.transport().respond(Method::GET, "/orders", 200, "[]");

    client.get("/orders").await.expect("should succeed");

    let sent = client.transport().requests_to("/orders");
    assert_eq!(bearer_of(&sent[0]), Some("Bearer T1"));
}

#[tokio::test]
async fn test_send_without_token_carries_no_bearer_header() {
    let client = client();
    client.transport().respond(Method::GET, "/public", 200, "{}");

    client.get("/public").await.expect("should succeed");

    let sent = client.transport().requests_to("/public");
    assert!(bearer_of(&sent[0]).is_none());
}

#[tokio::test]
async fn test_send_echoes_csrf_cookie_as_header() {
    let client = client();
    client.transport().set_cookie("csrfToken", "anti-forgery-1");
    client.transport().respond(Method::POST, "/orders", 201, "{}");

    client
        .post_json("/orders", &serde_json::json!({"item": "tea"}))
        .await
        .expect("should succeed");

    let sent = client.transport().requests_to("/orders");
    assert_eq!(sent[0].header("x-csrf-token"), Some("anti-forgery-1"));
    assert_eq!(sent[0].header("content-type"), Some("application/json"));
}

// =========================================================================
// Token capture
// =========================================================================

#[tokio::test]
async fn test_login_response_token_is_stored() {
    let client = client();
    client.transport().respond(
        Method::POST,
        "/auth/login",
        200,
        r#"{"data":{"user":{"id":"1","username":"ada","role":"user"},"accessToken":"T1"}}"#,
    );

    client
        .post_json("/auth/login", &serde_json::json!({"username":"ada","password":"pw"}))
        .await
        .expect("login should succeed");

    assert_eq!(client.credentials().get(), Some(AccessToken::new("T1")));
}

#[tokio::test]
async fn test_response_without_token_keeps_current_token() {
    let client = client();
    with_token(&client, "T1");
    client
        .transport()
        .respond(Method::GET, "/orders", 200, r#"{"data":{"orders":[]}}"#);

    client.get("/orders").await.expect("should succeed");

    assert_eq!(client.credentials().get(), Some(AccessToken::new("T1")));
}

// =========================================================================
// Refresh and retry
// =========================================================================

#[tokio::test]
async fn test_expired_token_is_refreshed_and_request_retried_with_new_token() {
    // T1 held → /orders 401 → refresh gives T2 → /orders retried with T2.
    let client = client();
    with_token(&client, "T1");
    client
        .transport()
        .respond(Method::GET, "/orders", 401, r#"{"message":"jwt expired"}"#)
        .respond(Method::GET, "/orders", 200, r#"{"data":{"orders":[1,2]}}"#)
        .respond(Method::POST, REFRESH, 200, r#"{"data":{"accessToken":"T2"}}"#);

    let response = client.get("/orders").await.expect("retry should succeed");

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), r#"{"data":{"orders":[1,2]}}"#);

    let orders = client.transport().requests_to("/orders");
    assert_eq!(orders.len(), 2, "first attempt + exactly one retry");
    assert_eq!(bearer_of(&orders[0]), Some("Bearer T1"));
    assert_eq!(bearer_of(&orders[1]), Some("Bearer T2"));
    assert_eq!(client.transport().count(REFRESH), 1);
    assert_eq!(client.credentials().get(), Some(AccessToken::new("T2")));
}

#[tokio::test]
async fn test_refresh_is_sent_before_retry() {
    let client = client();
    with_token(&client, "T1");
    client
        .transport()
        .respond(Method::GET, "/orders", 401, "")
        .respond(Method::GET, "/orders", 200, "{}")
        .respond_after(
            Duration::from_millis(20),
            Method::POST,
            REFRESH,
            200,
            r#"{"data":{"accessToken":"T2"}}"#,
        );

    client.get("/orders").await.expect("should succeed");

    let paths: Vec<String> = client
        .transport()
        .requests()
        .into_iter()
        .map(|req| req.path)
        .collect();
    assert_eq!(paths, vec!["/orders", REFRESH, "/orders"]);
}

#[tokio::test]
async fn test_refresh_failure_clears_token_and_rejects_caller() {
    let client = client();
    with_token(&client, "T1");
    client
        .transport()
        .respond(Method::GET, "/orders", 401, "")
        .respond(Method::POST, REFRESH, 401, r#"{"message":"refresh token revoked"}"#);

    let err = client.get("/orders").await.expect_err("should fail");

    assert!(matches!(
        err,
        ApiError::SessionExpired { status, ref message }
            if status == StatusCode::UNAUTHORIZED && message == "refresh token revoked"
    ));
    assert!(client.credentials().get().is_none());
    assert_eq!(client.transport().count("/orders"), 1, "no retry after failed refresh");
    assert_eq!(client.transport().count(REFRESH), 1);
}

#[tokio::test]
async fn test_after_refresh_failure_next_request_has_no_bearer() {
    let client = client();
    with_token(&client, "T1");
    client
        .transport()
        .respond(Method::GET, "/orders", 401, "")
        .respond(Method::POST, REFRESH, 401, "")
        .respond(Method::GET, "/profile", 200, "{}");

    let _ = client.get("/orders").await;
    client.get("/profile").await.expect("should succeed");

    let profile = client.transport().requests_to("/profile");
    assert!(bearer_of(&profile[0]).is_none());
}

#[tokio::test]
async fn test_refresh_network_error_clears_token_and_propagates() {
    let client = client();
    with_token(&client, "T1");
    client
        .transport()
        .respond(Method::GET, "/orders", 401, "")
        .fail(Method::POST, REFRESH, TransportError::Connect("refused".into()));

    let err = client.get("/orders").await.expect_err("should fail");

    assert!(matches!(err, ApiError::Transport(TransportError::Connect(_))));
    assert!(client.credentials().get().is_none());
}

#[tokio::test]
async fn test_refresh_without_token_in_payload_is_a_failure() {
    let client = client();
    with_token(&client, "T1");
    client
        .transport()
        .respond(Method::GET, "/orders", 401, "")
        .respond(Method::POST, REFRESH, 200, r#"{"data":{}}"#);

    let err = client.get("/orders").await.expect_err("should fail");

    assert!(matches!(err, ApiError::Protocol(_)));
    assert!(client.credentials().get().is_none());
    assert_eq!(client.transport().count("/orders"), 1);
}

#[tokio::test]
async fn test_retried_request_401_is_not_retried_again() {
    let client = client();
    with_token(&client, "T1");
    client
        .transport()
        .respond(Method::GET, "/orders", 401, "")
        .respond(Method::POST, REFRESH, 200, r#"{"data":{"accessToken":"T2"}}"#);

    let err = client.get("/orders").await.expect_err("should fail");

    assert!(matches!(err, ApiError::SessionExpired { .. }));
    assert_eq!(client.transport().count("/orders"), 2, "first attempt + one retry only");
    assert_eq!(client.transport().count(REFRESH), 1, "exactly one refresh");
    assert!(client.credentials().get().is_none());
}

#[tokio::test]
async fn test_retried_request_other_failure_passes_through() {
    let client = client();
    with_token(&client, "T1");
    client
        .transport()
        .respond(Method::GET, "/orders", 401, "")
        .respond(Method::GET, "/orders", 500, r#"{"message":"db down"}"#)
        .respond(Method::POST, REFRESH, 200, r#"{"data":{"accessToken":"T2"}}"#);

    let err = client.get("/orders").await.expect_err("should fail");

    assert!(matches!(
        err,
        ApiError::Status { status, ref message }
            if status == StatusCode::INTERNAL_SERVER_ERROR && message == "db down"
    ));
    // The refresh itself worked, so the new token stays.
    assert_eq!(client.credentials().get(), Some(AccessToken::new("T2")));
}

#[tokio::test]
async fn test_login_401_is_not_refreshed() {
    let client = client();
    client.transport().respond(
        Method::POST,
        "/auth/login",
        401,
        r#"{"message":"Invalid credentials"}"#,
    );

    let err = client
        .post_json("/auth/login", &serde_json::json!({"username":"ada","password":"x"}))
        .await
        .expect_err("should fail");

    assert!(matches!(
        err,
        ApiError::CredentialRejected { ref message, .. } if message == "Invalid credentials"
    ));
    assert_eq!(client.transport().count(REFRESH), 0);
}

#[tokio::test]
async fn test_register_401_is_not_refreshed() {
    let client = client();
    client
        .transport()
        .respond(Method::POST, "/auth/register", 401, "");

    let err = client
        .post_json("/auth/register", &serde_json::json!({}))
        .await
        .expect_err("should fail");

    assert!(matches!(err, ApiError::CredentialRejected { .. }));
    assert_eq!(client.transport().count(REFRESH), 0);
}

#[tokio::test]
async fn test_direct_refresh_401_is_not_refreshed_again() {
    let client = client();
    client.transport().respond(Method::POST, REFRESH, 401, "");

    let err = client.post(REFRESH).await.expect_err("should fail");

    assert!(matches!(err, ApiError::SessionExpired { .. }));
    assert_eq!(client.transport().count(REFRESH), 1);
}

#[tokio::test]
async fn test_non_401_failure_is_not_retried() {
    let client = client();
    with_token(&client, "T1");
    client
        .transport()
        .respond(Method::GET, "/orders", 403, r#"{"message":"Forbidden"}"#);

    let err = client.get("/orders").await.expect_err("should fail");

    assert!(matches!(err, ApiError::Status { status, .. } if status == StatusCode::FORBIDDEN));
    assert_eq!(client.transport().count(REFRESH), 0);
    assert_eq!(client.credentials().get(), Some(AccessToken::new("T1")));
}

#[tokio::test]
async fn test_transport_error_is_not_retried() {
    let client = client();
    with_token(&client, "T1");
    client
        .transport()
        .fail(Method::GET, "/orders", TransportError::Timeout);

    let err = client.get("/orders").await.expect_err("should fail");

    assert!(matches!(err, ApiError::Transport(TransportError::Timeout)));
    assert_eq!(client.transport().count("/orders"), 1);
    assert_eq!(client.transport().count(REFRESH), 0);
}

// =========================================================================
// Concurrent 401s
// =========================================================================

/// Scripts two `/orders` 401s, a slow refresh, then success.
fn script_concurrent_expiry(client: &ApiClient<ScriptedTransport>) {
    client
        .transport()
        .respond(Method::GET, "/orders", 401, "")
        .respond(Method::GET, "/orders", 401, "")
        .respond(Method::GET, "/orders", 200, "{}")
        .respond_after(
            Duration::from_millis(50),
            Method::POST,
            REFRESH,
            200,
            r#"{"data":{"accessToken":"T2"}}"#,
        );
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh_when_coalescing() {
    let client = client_with_policy(RefreshPolicy::Coalesce);
    with_token(&client, "T1");
    script_concurrent_expiry(&client);

    let (a, b) = tokio::join!(client.get("/orders"), client.get("/orders"));

    assert!(a.is_ok() && b.is_ok());
    assert_eq!(client.transport().count(REFRESH), 1);
    let retries: Vec<_> = client
        .transport()
        .requests_to("/orders")
        .into_iter()
        .skip(2)
        .collect();
    assert_eq!(retries.len(), 2);
    assert!(retries.iter().all(|req| bearer_of(req) == Some("Bearer T2")));
}

#[tokio::test]
async fn test_concurrent_401s_each_refresh_with_per_request_policy() {
    let client = client_with_policy(RefreshPolicy::PerRequest);
    with_token(&client, "T1");
    script_concurrent_expiry(&client);

    let (a, b) = tokio::join!(client.get("/orders"), client.get("/orders"));

    assert!(a.is_ok() && b.is_ok());
    assert_eq!(client.transport().count(REFRESH), 2);
}

#[tokio::test]
async fn test_slow_401_after_failed_refresh_and_new_login_refreshes_again() {
    // `/slow` goes out under T1. While it is in flight, `/orders` expires,
    // its refresh fails and the user logs in again. The old failure must
    // not be handed to `/slow`.
    let client = client();
    with_token(&client, "T1");
    client
        .transport()
        .respond_after(Duration::from_millis(50), Method::GET, "/slow", 401, "")
        .respond(Method::GET, "/slow", 200, "{}")
        .respond(Method::GET, "/orders", 401, "")
        .respond(Method::POST, REFRESH, 401, "")
        .respond(Method::POST, REFRESH, 200, r#"{"data":{"accessToken":"T6"}}"#)
        .respond(
            Method::POST,
            "/auth/login",
            200,
            r#"{"data":{"user":{"id":"1","username":"ada","role":"user"},"accessToken":"T5"}}"#,
        );

    let meanwhile = async {
        let err = client.get("/orders").await.expect_err("refresh should fail");
        assert!(matches!(err, ApiError::SessionExpired { .. }));
        client.post("/auth/login").await.expect("login should succeed");
        assert_eq!(client.credentials().get(), Some(AccessToken::new("T5")));
    };
    let (slow, ()) = tokio::join!(client.get("/slow"), meanwhile);

    slow.expect("slow request should be refreshed and retried");
    assert_eq!(client.transport().count(REFRESH), 2);
    let sent = client.transport().requests_to("/slow");
    assert_eq!(sent.len(), 2);
    assert_eq!(bearer_of(&sent[1]), Some("Bearer T6"));
    assert_eq!(client.credentials().get(), Some(AccessToken::new("T6")));
}

#[tokio::test]
async fn test_client_is_usable_from_spawned_tasks() {
    let client = client();
    with_token(&client, "T1");
    script_concurrent_expiry(&client);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.get("/orders").await })
        })
        .collect();

    for handle in handles {
        handle.await.expect("task panicked").expect("request failed");
    }
    // Clones share one store and one refresh gate.
    assert_eq!(client.credentials().get(), Some(AccessToken::new("T2")));
    assert_eq!(client.transport().count(REFRESH), 1);
}
