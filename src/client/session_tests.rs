// src/client/session_tests.rs
#![cfg(test)]

use super::*;

use httptest::{
    matchers::{all_of, contains, request},
    responders::{json_encoded, status_code},
    Expectation, ServerHandle, ServerPool,
};
use reqwest::{Client as ReqwestClient, Url};
use serde_json::json;

use crate::error::ApiError;

fn setup_test_server() -> (ServerHandle<'static>, Url) {
    let server_pool = Box::leak(Box::new(ServerPool::new(1)));
    let server = server_pool.get_server();
    let base_url = Url::parse(&server.url_str("")).unwrap();
    (server, base_url)
}

fn token(access_token: &str) -> Token {
    Token {
        access_token: access_token.to_string(),
        token_type: "Bearer".to_string(),
    }
}

/// A session whose stored token the server will reject, so the first business
/// call hits the 401 path. The re-issued token is distinguishable by header,
/// which lets each expectation match exactly one attempt.
fn stale_session(base_url: Url) -> Session {
    let api = ApiClient::new(ReqwestClient::new(), base_url, token("stale"));
    Session::from_client(api, Credentials::new("admin", "secret"))
}

fn expect_token_issued(server: &mut ServerHandle<'_>, access_token: &str) {
    server.expect(
        Expectation::matching(request::method_path("POST", "/api/admin/token")).respond_with(
            json_encoded(json!({
                "access_token": access_token,
                "token_type": "Bearer"
            })),
        ),
    );
}

#[tokio::test]
async fn test_unauthorized_triggers_single_reauth_then_success() {
    let (mut server, base_url) = setup_test_server();
    let session = stale_session(base_url);

    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/user/alice"),
            request::headers(contains(("authorization", "Bearer stale"))),
        ])
        .respond_with(status_code(401).body(r#"{"detail":"Token expired"}"#)),
    );
    expect_token_issued(&mut server, "fresh");
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/user/alice"),
            request::headers(contains(("authorization", "Bearer fresh"))),
        ])
        .respond_with(json_encoded(json!({
            "username": "alice",
            "status": "active"
        }))),
    );

    let user = session.user("alice").await.unwrap();
    assert_eq!(user.username.as_deref(), Some("alice"));
    assert_eq!(user.status.as_deref(), Some("active"));

    // Each expectation matches exactly once: one failed attempt, one token
    // request, one retry.
    server.verify_and_clear();
}

#[tokio::test]
async fn test_second_unauthorized_is_surfaced_not_retried() {
    let (mut server, base_url) = setup_test_server();
    let session = stale_session(base_url);

    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/user/alice"),
            request::headers(contains(("authorization", "Bearer stale"))),
        ])
        .respond_with(status_code(401).body("first denial")),
    );
    expect_token_issued(&mut server, "fresh");
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/user/alice"),
            request::headers(contains(("authorization", "Bearer fresh"))),
        ])
        .respond_with(status_code(401).body("second denial")),
    );

    let result = session.user("alice").await;
    match result.err().unwrap() {
        ApiError::Unauthorized(response) => assert_eq!(response.body, "second denial"),
        e => panic!("Expected ApiError::Unauthorized, got {:?}", e),
    }

    // Exactly three requests happened; a third business attempt would have
    // found no matching expectation and failed verification.
    server.verify_and_clear();
}

#[tokio::test]
async fn test_reauth_failure_is_terminal() {
    let (mut server, base_url) = setup_test_server();
    let session = stale_session(base_url);

    server.expect(
        Expectation::matching(request::method_path("GET", "/api/system/"))
            .respond_with(status_code(401).body("expired")),
    );
    server.expect(
        Expectation::matching(request::method_path("POST", "/api/admin/token"))
            .respond_with(status_code(422).body(r#"{"detail":"credentials revoked"}"#)),
    );

    let result = session.system_stats().await;
    match result.err().unwrap() {
        ApiError::Auth(inner) => {
            let response = inner.response().expect("auth failure keeps the raw response");
            assert_eq!(response.status, 422);
            assert!(response.body.contains("credentials revoked"));
        }
        e => panic!("Expected ApiError::Auth, got {:?}", e),
    }

    // The original operation was not re-attempted after the failed login.
    server.verify_and_clear();
}

#[tokio::test]
async fn test_forbidden_is_not_retried() {
    let (mut server, base_url) = setup_test_server();
    let session = stale_session(base_url);

    // No token expectation: any re-authentication attempt would fail
    // verification.
    server.expect(
        Expectation::matching(request::method_path("DELETE", "/api/user/alice"))
            .respond_with(status_code(403).body(r#"{"detail":"You're not allowed"}"#)),
    );

    let result = session.remove_user("alice").await;
    match result.err().unwrap() {
        ApiError::Forbidden(response) => assert_eq!(response.status, 403),
        e => panic!("Expected ApiError::Forbidden, got {:?}", e),
    }

    server.verify_and_clear();
}

#[tokio::test]
async fn test_transport_failure_is_not_retried() {
    // Nothing is listening on this port; the transport error must surface
    // without any re-authentication attempt.
    let api = ApiClient::new(
        ReqwestClient::new(),
        Url::parse("http://127.0.0.1:9").unwrap(),
        token("stale"),
    );
    let session = Session::from_client(api, Credentials::new("admin", "secret"));

    let result = session.system_stats().await;
    match result.err().unwrap() {
        ApiError::Transport(_) => {}
        e => panic!("Expected ApiError::Transport, got {:?}", e),
    }
}

#[tokio::test]
async fn test_connect_success() {
    let (mut server, base_url) = setup_test_server();

    expect_token_issued(&mut server, "first");
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/admin"),
            request::headers(contains(("authorization", "Bearer first"))),
        ])
        .respond_with(json_encoded(json!({"username": "admin", "is_sudo": true}))),
    );

    let session = Session::connect(
        ReqwestClient::new(),
        base_url,
        Credentials::new("admin", "secret"),
    )
    .await
    .unwrap();

    let me = session.current_admin().await.unwrap();
    assert_eq!(me.username.as_deref(), Some("admin"));

    server.verify_and_clear();
}

#[tokio::test]
async fn test_connect_validation_failure_is_auth_error() {
    let (mut server, base_url) = setup_test_server();

    // Only the token endpoint is stubbed; no business call may follow.
    server.expect(
        Expectation::matching(request::method_path("POST", "/api/admin/token"))
            .respond_with(status_code(422).body(r#"{"detail":"field required"}"#)),
    );

    let result = Session::connect(
        ReqwestClient::new(),
        base_url,
        Credentials::new("admin", "wrong"),
    )
    .await;

    match result.err().unwrap() {
        ApiError::Auth(inner) => {
            let response = inner.response().unwrap();
            assert_eq!(response.status, 422);
            assert!(response.body.contains("field required"));
        }
        e => panic!("Expected ApiError::Auth, got {:?}", e),
    }

    server.verify_and_clear();
}

#[tokio::test]
async fn test_connect_unauthorized_login_is_not_retried() {
    let (mut server, base_url) = setup_test_server();

    // A 401 from the token endpoint itself is terminal; a retry loop here
    // would exceed the single expectation.
    server.expect(
        Expectation::matching(request::method_path("POST", "/api/admin/token"))
            .respond_with(status_code(401).body(r#"{"detail":"bad credentials"}"#)),
    );

    let result = Session::connect(
        ReqwestClient::new(),
        base_url,
        Credentials::new("admin", "wrong"),
    )
    .await;

    match result.err().unwrap() {
        ApiError::Auth(inner) => assert!(inner.is_unauthorized()),
        e => panic!("Expected ApiError::Auth, got {:?}", e),
    }

    server.verify_and_clear();
}

#[tokio::test]
async fn test_set_token_replaces_wholesale() {
    let (mut server, base_url) = setup_test_server();
    let session = stale_session(base_url);

    session.set_token(token("rotated"));

    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/system/"),
            request::headers(contains(("authorization", "Bearer rotated"))),
        ])
        .respond_with(json_encoded(json!({"version": "0.4.9"}))),
    );

    let stats = session.system_stats().await.unwrap();
    assert_eq!(stats.version.as_deref(), Some("0.4.9"));

    server.verify_and_clear();
}
