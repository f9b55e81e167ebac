//! Token refresh and retry behavior of the authenticated client.

mod common;

use bandlabels::api::{
    AuthenticatedClient, ClientCredentials, FileTokenStore, MemoryTokenStore, TokenStore,
};
use bandlabels::LabelError;
use common::*;
use serde_json::json;
use tempfile::TempDir;

const BASE_URL: &str = "https://bandcamp.test";

fn client<'a, S: TokenStore>(
    transport: &'a MockTransport,
    tokens: S,
) -> AuthenticatedClient<&'a MockTransport, S> {
    AuthenticatedClient::new(
        BASE_URL,
        ClientCredentials::new("42", "s3cret"),
        transport,
        tokens,
    )
}

#[test]
fn test_cached_token_is_sent() {
    let transport = MockTransport::new().respond(200, r#"{"bands": []}"#);
    let tokens = MemoryTokenStore::with_token(token("A1", Some("R1")));

    let response = client(&transport, &tokens)
        .post_json("api/account/1/my_bands", json!({}))
        .unwrap();

    assert_eq!(response, json!({"bands": []}));
    let sent = transport.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].header("authorization"), Some("Bearer A1"));
}

#[test]
fn test_401_refreshes_and_retries_once() {
    let transport = MockTransport::new()
        .respond(401, "expired")
        .respond(200, token_body("A2", Some("R2")))
        .respond(200, r#"{"ok": true}"#);
    let tokens = MemoryTokenStore::with_token(token("A1", Some("R1")));

    let response = client(&transport, &tokens)
        .post_json("api/x", json!({}))
        .unwrap();
    assert_eq!(response["ok"], json!(true));

    let sent = transport.requests();
    assert_eq!(
        transport.urls(),
        vec![
            format!("{}/api/x", BASE_URL),
            format!("{}/oauth_token", BASE_URL),
            format!("{}/api/x", BASE_URL),
        ]
    );
    assert_eq!(sent[1].form_field("grant_type"), Some("refresh_token"));
    assert_eq!(sent[1].form_field("refresh_token"), Some("R1"));
    assert_eq!(sent[1].header("authorization"), None);
    assert_eq!(sent[2].header("authorization"), Some("Bearer A2"));

    let stored = tokens.read().unwrap().unwrap();
    assert_eq!(stored.access_token, "A2");
    assert_eq!(stored.refresh_token.as_deref(), Some("R2"));
}

#[test]
fn test_failed_refresh_falls_back_to_client_credentials() {
    let transport = MockTransport::new()
        .respond(401, "expired")
        .respond(400, r#"{"error": "invalid_grant"}"#)
        .respond(200, token_body("A3", None))
        .respond(200, "{}");
    let tokens = MemoryTokenStore::with_token(token("A1", Some("stale")));

    client(&transport, &tokens)
        .post_json("api/x", json!({}))
        .unwrap();

    let sent = transport.requests();
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[1].form_field("grant_type"), Some("refresh_token"));
    assert_eq!(sent[2].form_field("grant_type"), Some("client_credentials"));
    assert_eq!(sent[2].form_field("refresh_token"), None);
    assert_eq!(sent[2].form_field("client_id"), Some("42"));
    assert_eq!(sent[2].form_field("client_secret"), Some("s3cret"));
    assert_eq!(sent[3].header("authorization"), Some("Bearer A3"));
    assert_eq!(tokens.read().unwrap().unwrap().access_token, "A3");
}

#[test]
fn test_no_cached_token_uses_client_credentials() {
    let transport = MockTransport::new()
        .respond(401, "")
        .respond(200, token_body("A1", Some("R1")))
        .respond(200, "{}");
    let tokens = MemoryTokenStore::new();

    client(&transport, &tokens)
        .post_json("api/x", json!({}))
        .unwrap();

    let sent = transport.requests();
    assert_eq!(sent[0].header("authorization"), None);
    assert_eq!(sent[1].form_field("grant_type"), Some("client_credentials"));
    assert_eq!(sent[2].header("authorization"), Some("Bearer A1"));
}

#[test]
fn test_second_401_is_unauthorized() {
    let transport = MockTransport::new()
        .respond(401, "")
        .respond(200, token_body("A2", Some("R2")))
        .respond(401, "");
    let tokens = MemoryTokenStore::with_token(token("A1", Some("R1")));

    let err = client(&transport, &tokens)
        .post_json("api/x", json!({}))
        .unwrap_err();

    assert!(matches!(err, LabelError::Unauthorized { .. }));
    // One retry only: no second refresh.
    assert_eq!(transport.requests().len(), 3);
}

#[test]
fn test_both_grants_rejected() {
    let transport = MockTransport::new()
        .respond(401, "")
        .respond(400, "")
        .respond(401, "");
    let tokens = MemoryTokenStore::with_token(token("A1", Some("R1")));

    let err = client(&transport, &tokens)
        .post_json("api/x", json!({}))
        .unwrap_err();

    assert!(matches!(err, LabelError::Auth { .. }));
    assert_eq!(tokens.read().unwrap().unwrap().access_token, "A1");
}

#[test]
fn test_token_response_without_ok_flag_is_accepted() {
    let transport = MockTransport::new()
        .respond(401, "")
        .respond(200, r#"{"access_token": "A2", "token_type": "bearer", "expires_in": 3600}"#)
        .respond(200, "{}");
    let tokens = MemoryTokenStore::new();

    client(&transport, &tokens)
        .post_json("api/x", json!({}))
        .unwrap();
    assert_eq!(tokens.read().unwrap().unwrap().access_token, "A2");
}

#[test]
fn test_other_errors_are_not_retried() {
    let transport = MockTransport::new().respond(500, "boom");
    let tokens = MemoryTokenStore::with_token(token("A1", None));

    let err = client(&transport, &tokens)
        .post_json("api/x", json!({}))
        .unwrap_err();

    match err {
        LabelError::Http { status, body, .. } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(transport.requests().len(), 1);
}

#[test]
fn test_refreshed_token_persisted_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("token.json");
    let transport = MockTransport::new()
        .respond(401, "")
        .respond(200, token_body("A9", Some("R9")))
        .respond(200, "{}");

    client(&transport, FileTokenStore::new(&path))
        .post_json("api/x", json!({}))
        .unwrap();

    let stored = FileTokenStore::new(&path).read().unwrap().unwrap();
    assert_eq!(stored.access_token, "A9");
    assert_eq!(stored.refresh_token.as_deref(), Some("R9"));
}
