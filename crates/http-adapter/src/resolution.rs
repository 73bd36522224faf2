//! Turning a failed response into an [`ApiError`], and a response body into a
//! root parse node.

use abstractions::{
    AdapterError, ApiError, ErrorMap, ErrorObject, HttpResponse, ParseError, ParseNode,
    ParseNodeFactory,
};
use tracing::Span;

use crate::observability::{ERROR_BODY_FOUND, ERROR_MAPPING_FOUND};

/// Parses the response body with the codec registered for its content type.
///
/// # Errors
///
/// [`AdapterError::Deserialization`] when the response has no content type or
/// no codec is registered for it; [`AdapterError::Parse`] when the codec
/// rejects the payload.
pub(crate) fn get_root_parse_node(
    factory: &dyn ParseNodeFactory,
    response: &HttpResponse,
) -> Result<Box<dyn ParseNode>, AdapterError> {
    let content_type = response
        .content_type()
        .ok_or_else(|| AdapterError::Deserialization {
            message: "No response content type found for deserialization".to_string(),
            source: None,
        })?;
    factory
        .get_root_parse_node(&content_type, &response.body)
        .map_err(|e| match e {
            ParseError::UnsupportedContentType(_) => AdapterError::Deserialization {
                message: e.to_string(),
                source: Some(e),
            },
            other => AdapterError::Parse(other),
        })
}

/// Raises the error registered for a non-2xx response.
///
/// Successful responses pass through untouched. `attributes` receives the
/// `error.mapping_found` and `error.body_found` attributes.
///
/// # Errors
///
/// Always [`AdapterError::Api`] for a non-2xx status, unless the body could
/// not be parsed, in which case the parse failure is returned instead.
pub(crate) fn throw_failed_responses(
    factory: &dyn ParseNodeFactory,
    response: &HttpResponse,
    error_map: &ErrorMap,
    attributes: &Span,
) -> Result<(), AdapterError> {
    if response.is_success() {
        return Ok(());
    }

    let status = response.status;
    let Some(error_factory) = error_map.resolve(status) else {
        attributes.record(ERROR_MAPPING_FOUND, false);
        return Err(ApiError::new(
            format!(
                "The server returned an unexpected status code and no error class is registered for this code {status}"
            ),
            status,
            response.headers.clone(),
        )
        .into());
    };
    attributes.record(ERROR_MAPPING_FOUND, true);

    let root = get_root_parse_node(factory, response)?;
    attributes.record(ERROR_BODY_FOUND, true);

    let error = match error_factory.create(root.as_ref())? {
        ErrorObject::Error(typed) => {
            ApiError::from_typed(typed).with_response(status, response.headers.clone())
        }
        ErrorObject::Unexpected { type_name } => ApiError::new(
            format!("Unexpected error type: {type_name}"),
            status,
            response.headers.clone(),
        ),
    };
    tracing::debug!(status, error_type = error_factory.type_name(), "mapped error response");
    Err(error.into())
}
