//! [`HttpRequestAdapter`]: executes request descriptions and resolves their
//! responses.
//!
//! Every send variant runs the same pipeline: inject the base URL,
//! authenticate, materialize, dispatch, retry once on a claims challenge, then
//! either hand the response to a per-request [`ResponseHandler`] or resolve
//! failures through the error map and deserialize the body.
//!
//! [`ResponseHandler`]: abstractions::ResponseHandler

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::Arc;

use abstractions::{
    AdapterError, AuthenticationProvider, ErrorMap, HandledResponse, HttpRequest, HttpResponse,
    HttpTransport, Parsable, ParseNode, ParseNodeFactory, PrimitiveKind, PrimitiveValue,
    RequestInformation, RequestOptions, ResponseHandlerOption, BASE_URL_KEY, CLAIMS_KEY,
};
use tracing::Span;

use crate::claims::claims_from_challenge;
use crate::observability::{
    add_event, in_phase, phase_span, start_parent_span, ObservabilityOptions,
    AUTHENTICATE_CHALLENGED_EVENT, DESERIALIZED_MODEL_NAME, HTTP_FLAVOR, HTTP_HOST, HTTP_METHOD,
    HTTP_PORT, HTTP_REQUEST_CONTENT_LENGTH, HTTP_REQUEST_CONTENT_TYPE,
    HTTP_RESPONSE_CONTENT_LENGTH, HTTP_RESPONSE_CONTENT_TYPE, HTTP_RETRY_COUNT, HTTP_SCHEME,
    HTTP_STATUS_CODE, HTTP_URI, HTTP_URI_TEMPLATE, RESPONSE_HANDLER_INVOKED_EVENT,
};
use crate::resolution;

const CONTENT_TYPE_HEADER: &str = "content-type";
const NO_CONTENT: u16 = 204;

/// Outcome of the shared pipeline, before result-type dispatch.
enum Execution {
    /// A response handler resolved the response.
    Handled(HandledResponse),
    /// A successful response still to be deserialized.
    Response(HttpResponse),
}

/// Executes [`RequestInformation`]s over an [`HttpTransport`].
///
/// The adapter is long-lived and shared: configure it (including
/// [`set_base_url`](Self::set_base_url)) before wrapping it in an `Arc`.
#[derive(Clone)]
pub struct HttpRequestAdapter {
    authentication_provider: Arc<dyn AuthenticationProvider>,
    parse_node_factory: Arc<dyn ParseNodeFactory>,
    transport: Arc<dyn HttpTransport>,
    observability: ObservabilityOptions,
    base_url: String,
}

impl HttpRequestAdapter {
    pub fn new(
        authentication_provider: Arc<dyn AuthenticationProvider>,
        parse_node_factory: Arc<dyn ParseNodeFactory>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            authentication_provider,
            parse_node_factory,
            transport,
            observability: ObservabilityOptions::default(),
            base_url: String::new(),
        }
    }

    pub fn with_observability_options(mut self, options: ObservabilityOptions) -> Self {
        self.observability = options;
        self
    }

    /// Base URL substituted for the `baseurl` path parameter of every request.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sets the base URL. An empty value leaves the current one in place.
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        let base_url = base_url.into();
        if !base_url.is_empty() {
            self.base_url = base_url;
        }
    }

    // -----------------------------------------------------------------------
    // Send variants
    // -----------------------------------------------------------------------

    /// Executes `request` and deserializes the body into a `T`.
    ///
    /// Returns `Ok(None)` for a `204`.
    ///
    /// # Errors
    ///
    /// [`AdapterError::InvalidRequest`] without a request, [`AdapterError::Api`]
    /// for a non-2xx status, or any collaborator failure.
    pub async fn send<T: Parsable>(
        &self,
        request: impl Into<Option<RequestInformation>>,
        error_map: &ErrorMap,
    ) -> Result<Option<T>, AdapterError> {
        let request = request.into();
        let span = start_parent_span(&self.observability, request.as_ref(), "send");
        let parent = span.clone();
        in_phase(span, async move {
            let response = match self.execute(request, error_map, &parent).await? {
                Execution::Handled(value) => return handled_value::<T>(value),
                Execution::Response(response) => response,
            };
            if response.status == NO_CONTENT {
                return Ok(None);
            }
            let root = self.get_root_parse_node(&response, &parent).await?;
            let value = in_phase(phase_span(&parent, "get_object_value"), async {
                Ok::<_, AdapterError>(root.as_ref().get_object_value::<T>()?)
            })
            .await?;
            parent.record(DESERIALIZED_MODEL_NAME, type_name::<T>());
            Ok(Some(value))
        })
        .await
    }

    /// Executes `request` and deserializes the body into a collection of `T`.
    ///
    /// # Errors
    ///
    /// As for [`send`](Self::send).
    pub async fn send_collection<T: Parsable>(
        &self,
        request: impl Into<Option<RequestInformation>>,
        error_map: &ErrorMap,
    ) -> Result<Option<Vec<T>>, AdapterError> {
        let request = request.into();
        let span = start_parent_span(&self.observability, request.as_ref(), "send_collection");
        let parent = span.clone();
        in_phase(span, async move {
            let response = match self.execute(request, error_map, &parent).await? {
                Execution::Handled(value) => return handled_value::<Vec<T>>(value),
                Execution::Response(response) => response,
            };
            if response.status == NO_CONTENT {
                return Ok(None);
            }
            let root = self.get_root_parse_node(&response, &parent).await?;
            let values = in_phase(phase_span(&parent, "get_collection_of_object_values"), async {
                Ok::<_, AdapterError>(root.as_ref().get_collection_of_object_values::<T>()?)
            })
            .await?;
            parent.record(DESERIALIZED_MODEL_NAME, type_name::<Vec<T>>());
            Ok(Some(values))
        })
        .await
    }

    /// Executes `request` and reads the body as a collection of `kind`
    /// values. Null elements are skipped.
    ///
    /// # Errors
    ///
    /// As for [`send`](Self::send).
    pub async fn send_collection_of_primitive(
        &self,
        request: impl Into<Option<RequestInformation>>,
        kind: PrimitiveKind,
        error_map: &ErrorMap,
    ) -> Result<Option<Vec<PrimitiveValue>>, AdapterError> {
        let request = request.into();
        let span = start_parent_span(
            &self.observability,
            request.as_ref(),
            "send_collection_of_primitive",
        );
        let parent = span.clone();
        in_phase(span, async move {
            let response = match self.execute(request, error_map, &parent).await? {
                Execution::Handled(value) => return handled_value::<Vec<PrimitiveValue>>(value),
                Execution::Response(response) => response,
            };
            if response.status == NO_CONTENT {
                return Ok(None);
            }
            let root = self.get_root_parse_node(&response, &parent).await?;
            let values = in_phase(phase_span(&parent, "get_collection_of_primitive_values"), async {
                Ok::<_, AdapterError>(root.as_ref().get_collection_of_primitive_values(kind)?)
            })
            .await?;
            parent.record(DESERIALIZED_MODEL_NAME, kind.type_name());
            Ok(Some(values))
        })
        .await
    }

    /// Executes `request` and reads the body as one `kind` value.
    ///
    /// [`PrimitiveKind::Bytes`] returns the raw body without consulting the
    /// parse node factory.
    ///
    /// # Errors
    ///
    /// [`AdapterError::UnsupportedType`] when the body holds no value of
    /// `kind`; otherwise as for [`send`](Self::send).
    pub async fn send_primitive(
        &self,
        request: impl Into<Option<RequestInformation>>,
        kind: PrimitiveKind,
        error_map: &ErrorMap,
    ) -> Result<Option<PrimitiveValue>, AdapterError> {
        let request = request.into();
        let span = start_parent_span(&self.observability, request.as_ref(), "send_primitive");
        let parent = span.clone();
        in_phase(span, async move {
            let response = match self.execute(request, error_map, &parent).await? {
                Execution::Handled(value) => return handled_value::<PrimitiveValue>(value),
                Execution::Response(response) => response,
            };
            if response.status == NO_CONTENT {
                return Ok(None);
            }
            if kind == PrimitiveKind::Bytes {
                parent.record(DESERIALIZED_MODEL_NAME, kind.type_name());
                return Ok(Some(PrimitiveValue::Bytes(response.body)));
            }
            let root = self.get_root_parse_node(&response, &parent).await?;
            let value = in_phase(phase_span(&parent, "get_primitive_value"), async {
                root.as_ref()
                    .get_primitive_value(kind)?
                    .ok_or_else(|| AdapterError::UnsupportedType {
                        type_name: kind.type_name().to_string(),
                    })
            })
            .await?;
            parent.record(DESERIALIZED_MODEL_NAME, kind.type_name());
            Ok(Some(value))
        })
        .await
    }

    /// Executes `request` for its side effect only.
    ///
    /// A response handler's value, if any, is discarded.
    ///
    /// # Errors
    ///
    /// As for [`send`](Self::send).
    pub async fn send_no_content(
        &self,
        request: impl Into<Option<RequestInformation>>,
        error_map: &ErrorMap,
    ) -> Result<(), AdapterError> {
        let request = request.into();
        let span = start_parent_span(&self.observability, request.as_ref(), "send_no_content");
        let parent = span.clone();
        in_phase(span, async move {
            self.execute(request, error_map, &parent).await?;
            Ok::<_, AdapterError>(())
        })
        .await
    }

    /// Authenticates and materializes `request` without sending it.
    ///
    /// # Errors
    ///
    /// [`AdapterError::InvalidRequest`] without a request or when its URL does
    /// not resolve; [`AdapterError::Authentication`] when the provider fails.
    pub async fn convert_to_native(
        &self,
        request: impl Into<Option<RequestInformation>>,
    ) -> Result<HttpRequest, AdapterError> {
        let request = request.into();
        let span = start_parent_span(&self.observability, request.as_ref(), "convert_to_native");
        let parent = span.clone();
        in_phase(span, async move {
            let mut request = request.ok_or_else(AdapterError::request_is_null)?;
            self.set_base_url_for_request_information(&mut request);
            self.authentication_provider
                .authenticate_request(&mut request, &HashMap::new())
                .await?;
            self.get_request_from_request_information(&request, &parent, &parent)
                .await
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Pipeline
    // -----------------------------------------------------------------------

    async fn execute(
        &self,
        request: Option<RequestInformation>,
        error_map: &ErrorMap,
        parent: &Span,
    ) -> Result<Execution, AdapterError> {
        let mut request = request.ok_or_else(AdapterError::request_is_null)?;
        let response = self.get_http_response_message(&mut request, parent).await?;

        let handler = request
            .request_options
            .get::<ResponseHandlerOption>()
            .map(|option| Arc::clone(&option.handler));
        if let Some(handler) = handler {
            add_event(parent, RESPONSE_HANDLER_INVOKED_EVENT);
            let value = handler.handle_response(response, error_map).await?;
            return Ok(Execution::Handled(value));
        }

        self.throw_failed_responses(&response, error_map, parent).await?;
        Ok(Execution::Response(response))
    }

    /// Dispatches `request`, retrying once when the response is a claims
    /// challenge.
    async fn get_http_response_message(
        &self,
        request: &mut RequestInformation,
        parent: &Span,
    ) -> Result<HttpResponse, AdapterError> {
        let response = self.dispatch(request, parent, None).await?;

        let phase = phase_span(parent, "retry_cae_response_if_required");
        let claims = in_phase(phase.clone(), async { claims_from_challenge(&response) }).await?;
        let Some(claims) = claims else {
            return Ok(response);
        };

        tracing::info!(parent: parent, status = response.status, "retrying request with claims from challenge");
        add_event(parent, AUTHENTICATE_CHALLENGED_EVENT);
        parent.record(HTTP_RETRY_COUNT, 1_u64);
        phase.record(HTTP_RETRY_COUNT, 1_u64);
        self.dispatch(request, parent, Some(&claims)).await
    }

    /// One authenticate → materialize → send round trip.
    async fn dispatch(
        &self,
        request: &mut RequestInformation,
        parent: &Span,
        claims: Option<&str>,
    ) -> Result<HttpResponse, AdapterError> {
        let phase = phase_span(parent, "get_http_response_message");
        let attributes = phase.clone();
        in_phase(phase, async move {
            self.set_base_url_for_request_information(request);

            let mut context = HashMap::new();
            if let Some(claims) = claims {
                context.insert(CLAIMS_KEY.to_string(), claims.to_string());
            }
            self.authentication_provider
                .authenticate_request(request, &context)
                .await?;

            let native = self
                .get_request_from_request_information(request, &attributes, parent)
                .await?;
            let response = self.transport.send(native).await?;

            parent.record(HTTP_STATUS_CODE, u64::from(response.status));
            attributes.record(HTTP_STATUS_CODE, u64::from(response.status));
            if let Some(version) = response.version.as_deref() {
                parent.record(HTTP_FLAVOR, version);
            }
            parent.record(HTTP_RESPONSE_CONTENT_LENGTH, response.body.len() as u64);
            if let Some(content_type) = response.headers.get(CONTENT_TYPE_HEADER) {
                parent.record(HTTP_RESPONSE_CONTENT_TYPE, content_type);
            }
            tracing::debug!(status = response.status, "received response");
            Ok::<_, AdapterError>(response)
        })
        .await
    }

    fn set_base_url_for_request_information(&self, request: &mut RequestInformation) {
        request.add_path_parameter(BASE_URL_KEY, self.base_url.as_str());
    }

    /// Materializes the native request, recording its shape on `phase_parent`'s
    /// child span and on `attributes`.
    async fn get_request_from_request_information(
        &self,
        request: &RequestInformation,
        phase_parent: &Span,
        attributes: &Span,
    ) -> Result<HttpRequest, AdapterError> {
        let phase = phase_span(phase_parent, "get_request_from_request_information");
        let local = phase.clone();
        in_phase(phase, async move {
            let url = request.url()?;

            for span in [attributes, &local] {
                span.record(HTTP_METHOD, request.http_method.as_str());
                span.record(HTTP_SCHEME, url.scheme());
                if let Some(host) = url.host_str() {
                    span.record(HTTP_HOST, host);
                }
                if let Some(port) = url.port_or_known_default() {
                    span.record(HTTP_PORT, u64::from(port));
                }
                if let Some(template) = request.url_template.as_deref() {
                    span.record(HTTP_URI_TEMPLATE, template);
                }
                if self.observability.include_euii_attributes {
                    span.record(HTTP_URI, url.as_str());
                }
                if let Some(content) = &request.content {
                    span.record(HTTP_REQUEST_CONTENT_LENGTH, content.len() as u64);
                }
                if let Some(content_type) = request.headers.get(CONTENT_TYPE_HEADER) {
                    span.record(HTTP_REQUEST_CONTENT_TYPE, content_type);
                }
            }

            let mut options = request.request_options.clone();
            let mut adapter_options = RequestOptions::new();
            adapter_options.add(self.observability.clone());
            options.merge_missing(&adapter_options);

            Ok::<_, AdapterError>(HttpRequest {
                method: request.http_method,
                url,
                headers: request.headers.clone(),
                body: request.content.clone(),
                options,
            })
        })
        .await
    }

    async fn throw_failed_responses(
        &self,
        response: &HttpResponse,
        error_map: &ErrorMap,
        parent: &Span,
    ) -> Result<(), AdapterError> {
        if response.is_success() {
            return Ok(());
        }
        let phase = phase_span(parent, "throw_failed_responses");
        phase.record(HTTP_STATUS_CODE, u64::from(response.status));
        in_phase(phase, async {
            resolution::throw_failed_responses(
                self.parse_node_factory.as_ref(),
                response,
                error_map,
                parent,
            )
        })
        .await
    }

    async fn get_root_parse_node(
        &self,
        response: &HttpResponse,
        parent: &Span,
    ) -> Result<Box<dyn ParseNode>, AdapterError> {
        in_phase(phase_span(parent, "get_root_parse_node"), async {
            resolution::get_root_parse_node(self.parse_node_factory.as_ref(), response)
        })
        .await
    }
}

impl std::fmt::Debug for HttpRequestAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRequestAdapter")
            .field("base_url", &self.base_url)
            .field("observability", &self.observability)
            .finish_non_exhaustive()
    }
}

/// Recovers a send variant's result from a response handler's value.
///
/// Handlers may return either `Option<T>` or a bare `T`.
fn handled_value<T: Any>(value: HandledResponse) -> Result<Option<T>, AdapterError> {
    match value.downcast::<Option<T>>() {
        Ok(value) => Ok(*value),
        Err(value) => value
            .downcast::<T>()
            .map(|value| Some(*value))
            .map_err(|_| AdapterError::ResponseHandler {
                expected: type_name::<T>(),
            }),
    }
}
