// tests/session_flow.rs
//
// End-to-end exercise of the public API against a mock panel: login, a
// filtered listing, and a token expiry absorbed mid-session.

use httptest::{
    matchers::{all_of, contains, request},
    responders::{json_encoded, status_code},
    Expectation, Server,
};
use marzban_client::{Credentials, ListUsersParams, MarzbanApi, Session, Token};
use reqwest::Client as ReqwestClient;
use serde_json::json;
use url::Url;

fn token_response(access_token: &str) -> serde_json::Value {
    json!({"access_token": access_token, "token_type": "Bearer"})
}

#[tokio::test]
async fn login_list_and_recover_from_expiry() {
    let server = Server::run();
    let base_url = Url::parse(&server.url_str("")).unwrap();

    server.expect(
        Expectation::matching(request::method_path("POST", "/api/admin/token"))
            .times(2)
            .respond_with(json_encoded(token_response("first"))),
    );

    // Filtered listing with the fixed query parameter order.
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/users/"),
            request::query("limit=10&offset=0&username=a&username=b"),
            request::headers(contains(("authorization", "Bearer first"))),
        ])
        .respond_with(json_encoded(json!({
            "users": [{"username": "a", "status": "active"}],
            "total": 1
        }))),
    );

    // The server then rejects the stale token once before accepting the
    // freshly issued one.
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/user/alice"),
            request::headers(contains(("authorization", "Bearer expired"))),
        ])
        .respond_with(status_code(401).body(r#"{"detail":"Token expired"}"#)),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/user/alice"),
            request::headers(contains(("authorization", "Bearer first"))),
        ])
        .respond_with(json_encoded(json!({"username": "alice", "status": "active"}))),
    );

    let session = Session::connect(
        ReqwestClient::new(),
        base_url,
        Credentials::new("admin", "secret"),
    )
    .await
    .expect("login should succeed");

    let params = ListUsersParams {
        limit: Some(10),
        offset: Some(0),
        username: vec!["a".to_string(), "b".to_string()],
        ..Default::default()
    };
    let page = session.users(&params).await.expect("listing should succeed");
    assert_eq!(page.total, Some(1));
    assert_eq!(page.users[0].username.as_deref(), Some("a"));

    // Simulate server-side expiry by rotating in a token the mock rejects.
    session.set_token(Token {
        access_token: "expired".to_string(),
        token_type: "Bearer".to_string(),
    });

    let user = session
        .user("alice")
        .await
        .expect("session should recover from a single 401");
    assert_eq!(user.username.as_deref(), Some("alice"));
    assert_eq!(user.status.as_deref(), Some("active"));
}
