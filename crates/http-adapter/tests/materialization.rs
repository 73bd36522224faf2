//! Turning a request description into the native request handed to the
//! transport.

mod common;

use abstractions::{AdapterError, ErrorMap, HttpMethod, HttpResponse, RequestInformation, RequestOption};
use common::{get, harness, BASE_URL};
use http_adapter::ObservabilityOptions;

#[derive(Debug, Clone, PartialEq)]
struct Tag(&'static str);

impl RequestOption for Tag {
    const KEY: &'static str = "Tag";
}

fn list_messages() -> RequestInformation {
    let mut request = RequestInformation::new(
        HttpMethod::Post,
        "{+baseurl}/users/{user%2Did}/messages{?%24top,%24select}",
    );
    request.add_path_parameter("user%2Did", "ada@example.com");
    request.add_query_parameter("%24top", 5_i64);
    request.add_query_parameter("%24select", vec!["id".to_string(), "subject".to_string()]);
    request.add_header("Accept", "application/json");
    request.set_content(r#"{"subject": "hi"}"#, "application/json");
    request
}

#[tokio::test]
async fn native_request_carries_url_headers_and_body() {
    let h = harness([]);

    let native = h.adapter.convert_to_native(list_messages()).await.unwrap();

    assert_eq!(native.method, HttpMethod::Post);
    assert_eq!(
        native.url.as_str(),
        "https://graph.example.com/v1.0/users/ada%40example.com/messages?%24top=5&%24select=id,subject"
    );
    assert_eq!(native.headers.get("accept"), Some("application/json"));
    assert_eq!(native.headers.get("content-type"), Some("application/json"));
    assert_eq!(native.headers.get("authorization"), Some("Bearer token-1"));
    assert_eq!(native.body.as_deref(), Some(br#"{"subject": "hi"}"#.as_slice()));
    assert_eq!(h.transport.request_count(), 0);
}

#[tokio::test]
async fn identical_requests_materialize_identically() {
    let first = harness([HttpResponse::new(204)]);
    let second = harness([HttpResponse::new(204)]);

    first.adapter.send_no_content(list_messages(), &ErrorMap::new()).await.unwrap();
    second.adapter.send_no_content(list_messages(), &ErrorMap::new()).await.unwrap();

    let sent = [first.transport.requests(), second.transport.requests()];
    assert_eq!(sent[0].len(), 1);
    assert_eq!(sent[0][0], sent[1][0]);
    assert_eq!(sent[0][0].headers.get("authorization"), Some("Bearer token-1"));
}

#[tokio::test]
async fn base_url_replaces_any_caller_value() {
    let h = harness([HttpResponse::new(204)]);
    let mut request = get("{+baseurl}/me");
    request.add_path_parameter("baseurl", "https://attacker.example.net");

    h.adapter.send_no_content(request, &ErrorMap::new()).await.unwrap();

    assert_eq!(h.transport.requests()[0].url.as_str(), format!("{BASE_URL}/me"));
}

#[tokio::test]
async fn request_options_and_observability_options_are_attached() {
    let h = harness([HttpResponse::new(204)]);
    let mut request = get("{+baseurl}/me");
    request.add_request_option(Tag("first"));

    h.adapter.send_no_content(request, &ErrorMap::new()).await.unwrap();

    let options = &h.transport.requests()[0].options;
    assert_eq!(options.get::<Tag>(), Some(&Tag("first")));
    assert_eq!(options.get::<ObservabilityOptions>(), Some(&ObservabilityOptions::default()));
}

#[tokio::test]
async fn request_level_observability_options_win() {
    let h = harness([HttpResponse::new(204)]);
    let custom = ObservabilityOptions {
        enabled: true,
        include_euii_attributes: true,
    };
    let mut request = get("{+baseurl}/me");
    request.add_request_option(custom.clone());

    h.adapter.send_no_content(request, &ErrorMap::new()).await.unwrap();

    let options = &h.transport.requests()[0].options;
    assert_eq!(options.get::<ObservabilityOptions>(), Some(&custom));
}

#[tokio::test]
async fn unresolvable_template_is_an_invalid_request() {
    let h = harness([]);

    let err = h
        .adapter
        .send_no_content(get("/relative/{id}"), &ErrorMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::InvalidRequest { .. }));
    assert_eq!(h.transport.request_count(), 0);
}

#[tokio::test]
async fn raw_url_bypasses_template_expansion() {
    let h = harness([HttpResponse::new(204)]);
    let mut request = get("{+baseurl}/ignored");
    let next_link = url::Url::parse("https://graph.example.com/v1.0/users?$skiptoken=abc").unwrap();
    request.set_url(&next_link);

    h.adapter.send_no_content(request, &ErrorMap::new()).await.unwrap();

    assert_eq!(h.transport.requests()[0].url, next_link);
}
