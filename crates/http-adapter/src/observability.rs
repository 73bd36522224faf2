//! Tracing spans for the request pipeline.
//!
//! Every public send operation opens one parent span whose OpenTelemetry name is
//! `"<operation> - <decoded URL template>"`. Internal phases run inside child
//! spans opened by [`in_phase`], which records a failed result on the span
//! before returning it. Spans close when dropped, so every exit path closes
//! them.
//!
//! Span field names follow the OpenTelemetry HTTP semantic conventions so the
//! `tracing-opentelemetry` layer exports them as attributes unchanged.

use std::borrow::Cow;
use std::future::Future;

use abstractions::{RequestInformation, RequestOption};
use serde::{Deserialize, Serialize};
use tracing::field::Empty;
use tracing::{Instrument, Span};

// ---------------------------------------------------------------------------
// Attribute and event names
// ---------------------------------------------------------------------------

pub const HTTP_METHOD: &str = "http.method";
pub const HTTP_HOST: &str = "http.host";
pub const HTTP_PORT: &str = "http.port";
pub const HTTP_SCHEME: &str = "http.scheme";
pub const HTTP_URI: &str = "http.uri";
pub const HTTP_URI_TEMPLATE: &str = "http.uri_template";
pub const HTTP_STATUS_CODE: &str = "http.status_code";
pub const HTTP_FLAVOR: &str = "http.flavor";
pub const HTTP_REQUEST_CONTENT_LENGTH: &str = "http.request_content_length";
pub const HTTP_REQUEST_CONTENT_TYPE: &str = "http.request_content_type";
pub const HTTP_RESPONSE_CONTENT_LENGTH: &str = "http.response_content_length";
pub const HTTP_RESPONSE_CONTENT_TYPE: &str = "http.response_content_type";
pub const HTTP_RETRY_COUNT: &str = "http.retry_count";
pub const DESERIALIZED_MODEL_NAME: &str = "response.deserialized_type";
pub const ERROR_MAPPING_FOUND: &str = "error.mapping_found";
pub const ERROR_BODY_FOUND: &str = "error.body_found";

pub const AUTHENTICATE_CHALLENGED_EVENT: &str = "authenticate_challenge_received";
pub const RESPONSE_HANDLER_INVOKED_EVENT: &str = "response_handler_invoked";

const OTEL_STATUS_CODE: &str = "otel.status_code";
const UNKNOWN_TEMPLATE: &str = "UNKNOWN";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Observability configuration of a request adapter.
///
/// Also attached to every native request so transport middleware can honour
/// the same flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityOptions {
    /// Emit spans at all. When `false`, every span is disabled.
    pub enabled: bool,

    /// Record attributes that may identify end users, such as the full URL.
    pub include_euii_attributes: bool,
}

impl Default for ObservabilityOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            include_euii_attributes: false,
        }
    }
}

impl ObservabilityOptions {
    /// Instrumentation scope name used when registering the tracer.
    pub fn tracer_instrumentation_name() -> &'static str {
        env!("CARGO_PKG_NAME")
    }
}

impl RequestOption for ObservabilityOptions {
    const KEY: &'static str = "ObservabilityOptions";
}

// ---------------------------------------------------------------------------
// Spans
// ---------------------------------------------------------------------------

/// Opens the parent span of a public operation.
pub(crate) fn start_parent_span(
    options: &ObservabilityOptions,
    request: Option<&RequestInformation>,
    operation: &str,
) -> Span {
    if !options.enabled {
        return Span::none();
    }
    let template = request
        .and_then(|r| r.url_template.as_deref())
        .unwrap_or(UNKNOWN_TEMPLATE);
    let decoded = urlencoding::decode(template).unwrap_or(Cow::Borrowed(template));
    tracing::info_span!(
        "request_adapter",
        otel.name = %format!("{operation} - {decoded}"),
        otel.status_code = Empty,
        http.method = Empty,
        http.host = Empty,
        http.port = Empty,
        http.scheme = Empty,
        http.uri = Empty,
        http.uri_template = Empty,
        http.status_code = Empty,
        http.flavor = Empty,
        http.request_content_length = Empty,
        http.request_content_type = Empty,
        http.response_content_length = Empty,
        http.response_content_type = Empty,
        http.retry_count = Empty,
        response.deserialized_type = Empty,
        error.mapping_found = Empty,
        error.body_found = Empty
    )
}

/// Opens a child span for one internal phase.
pub(crate) fn phase_span(parent: &Span, name: &'static str) -> Span {
    if parent.is_disabled() {
        return Span::none();
    }
    tracing::debug_span!(
        parent: parent,
        "phase",
        otel.name = name,
        otel.status_code = Empty,
        http.method = Empty,
        http.host = Empty,
        http.port = Empty,
        http.scheme = Empty,
        http.uri = Empty,
        http.uri_template = Empty,
        http.request_content_length = Empty,
        http.request_content_type = Empty,
        http.status_code = Empty,
        http.retry_count = Empty,
        error.mapping_found = Empty
    )
}

/// Runs `future` inside `span`, recording an error result on it.
pub(crate) async fn in_phase<F, T, E>(span: Span, future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: std::error::Error,
{
    let result = future.instrument(span.clone()).await;
    if let Err(error) = &result {
        record_exception(&span, error);
    }
    result
}

/// Marks `span` as failed and attaches the error as an event.
pub(crate) fn record_exception(span: &Span, error: &dyn std::error::Error) {
    span.record(OTEL_STATUS_CODE, "ERROR");
    span.in_scope(|| {
        tracing::error!(exception.message = %error, "exception");
    });
}

/// Adds a named event to `span`.
pub(crate) fn add_event(span: &Span, name: &'static str) {
    span.in_scope(|| {
        tracing::info!(event.name = name, "{name}");
    });
}
