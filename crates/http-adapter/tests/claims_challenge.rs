//! Continuous access evaluation: the single re-authenticate-and-retry on a
//! claims challenge.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use abstractions::{
    AdapterError, BaseBearerTokenAuthenticationProvider, ErrorMap, HttpResponse,
    StaticAccessTokenProvider, CLAIMS_KEY,
};
use common::{get, harness, json, ScriptedTransport, User, BASE_URL, CAE_CHALLENGE, CAE_CLAIMS};
use http_adapter::HttpRequestAdapter;

fn challenge(value: &str) -> HttpResponse {
    HttpResponse::new(401).with_header("WWW-Authenticate", value)
}

#[tokio::test]
async fn claims_challenge_is_retried_once_with_claims() {
    let h = harness([challenge(CAE_CHALLENGE), json(200, r#"{"id": "1"}"#)]);

    let user = h
        .adapter
        .send::<User>(get("{+baseurl}/me"), &ErrorMap::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(user.id, "1");
    assert_eq!(h.transport.request_count(), 2);
    assert_eq!(
        h.auth.contexts(),
        vec![
            HashMap::new(),
            HashMap::from([(CLAIMS_KEY.to_string(), CAE_CLAIMS.to_string())]),
        ]
    );

    let requests = h.transport.requests();
    assert_eq!(requests[0].headers.get("authorization"), Some("Bearer token-1"));
    assert_eq!(requests[1].headers.get("authorization"), Some("Bearer token-2"));
    assert_eq!(requests[0].url, requests[1].url);
}

#[tokio::test]
async fn second_challenge_is_not_retried() {
    let h = harness([challenge(CAE_CHALLENGE), challenge(CAE_CHALLENGE)]);

    let err = h
        .adapter
        .send::<User>(get("{+baseurl}/me"), &ErrorMap::new())
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(401));
    assert_eq!(h.transport.request_count(), 2);
    assert_eq!(h.auth.contexts().len(), 2);
}

#[tokio::test]
async fn bearer_challenge_without_claims_is_a_parse_error() {
    let h = harness([challenge(r#"Bearer realm="x", error="invalid_token""#)]);

    let err = h
        .adapter
        .send_no_content(get("{+baseurl}/me"), &ErrorMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::ClaimsParse { .. }));
    assert_eq!(h.transport.request_count(), 1);
}

#[tokio::test]
async fn unauthorized_without_challenge_header_is_an_ordinary_failure() {
    let h = harness([HttpResponse::new(401)]);

    let err = h
        .adapter
        .send_no_content(get("{+baseurl}/me"), &ErrorMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::Api(_)));
    assert_eq!(err.status_code(), Some(401));
    assert_eq!(h.transport.request_count(), 1);
}

#[tokio::test]
async fn non_bearer_challenge_is_a_parse_error() {
    let h = harness([challenge(r#"Basic realm="intranet""#)]);

    let err = h
        .adapter
        .send_no_content(get("{+baseurl}/me"), &ErrorMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::ClaimsParse { .. }));
    assert_eq!(h.transport.request_count(), 1);
    assert_eq!(h.auth.contexts().len(), 1);
}

#[tokio::test]
async fn challenge_on_other_status_is_ignored() {
    let response = HttpResponse::new(403).with_header("WWW-Authenticate", CAE_CHALLENGE);
    let h = harness([response]);

    let err = h
        .adapter
        .send_no_content(get("{+baseurl}/me"), &ErrorMap::new())
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(403));
    assert_eq!(h.transport.request_count(), 1);
}

#[tokio::test]
async fn bearer_provider_requests_a_fresh_header_on_retry() {
    let transport = ScriptedTransport::new([challenge(CAE_CHALLENGE), HttpResponse::new(204)]);
    let provider = BaseBearerTokenAuthenticationProvider::new(StaticAccessTokenProvider::new(
        "secret",
        vec!["graph.example.com".to_string()],
    ));
    let mut adapter = HttpRequestAdapter::new(
        Arc::new(provider),
        common::JsonParseNodeFactory::new(),
        transport.clone(),
    );
    adapter.set_base_url(BASE_URL);

    let mut request = get("{+baseurl}/me");
    request.add_header("Authorization", "Bearer stale");
    adapter.send_no_content(request, &ErrorMap::new()).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0].headers.get("authorization"), Some("Bearer stale"));
    assert_eq!(requests[1].headers.get("authorization"), Some("Bearer secret"));
}
