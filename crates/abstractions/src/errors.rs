//! Error types produced while executing a request description.
//!
//! [`AdapterError`] is the single error type returned by every send operation.
//! Collaborator failures (authentication, transport, codec) are carried in
//! dedicated variants so callers can tell them apart from HTTP failures, which
//! surface as [`ApiError`].
//!
//! None of these conditions are retried by the adapter. The only recovery the
//! adapter performs is the single claims-challenge retry, which happens before
//! any of these errors is produced.

use std::error::Error as StdError;

use thiserror::Error;

use crate::Headers;

/// Boxed error type used for collaborator-supplied sources.
pub type BoxError = Box<dyn StdError + Send + Sync>;

// ---------------------------------------------------------------------------
// HTTP failures
// ---------------------------------------------------------------------------

/// A non-2xx response, resolved through the request's error map.
///
/// When the error map produced a typed error, it is available through
/// [`ApiError::typed`] and its message becomes this error's message. When no
/// error class was registered for the status, `source` is `None` and the message
/// says so.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    /// Human-readable description of the failure.
    pub message: String,

    /// HTTP status code of the failed response.
    pub response_status_code: Option<u16>,

    /// Headers of the failed response.
    pub response_headers: Headers,

    /// The typed error materialized from the response body, if any.
    #[source]
    pub source: Option<BoxError>,
}

impl ApiError {
    /// Creates an error without a typed body.
    pub fn new(message: impl Into<String>, status: u16, headers: Headers) -> Self {
        Self {
            message: message.into(),
            response_status_code: Some(status),
            response_headers: headers,
            source: None,
        }
    }

    /// Wraps a typed error materialized from the response body.
    pub fn from_typed(typed: BoxError) -> Self {
        Self {
            message: typed.to_string(),
            response_status_code: None,
            response_headers: Headers::new(),
            source: Some(typed),
        }
    }

    /// Stamps the response status and headers onto this error.
    pub fn with_response(mut self, status: u16, headers: Headers) -> Self {
        self.response_status_code = Some(status);
        self.response_headers = headers;
        self
    }

    /// Returns the typed error if it is of type `E`.
    pub fn typed<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.as_deref().and_then(|e| e.downcast_ref::<E>())
    }
}

// ---------------------------------------------------------------------------
// Collaborator failures
// ---------------------------------------------------------------------------

/// Failure reported by an [`AuthenticationProvider`](crate::AuthenticationProvider).
#[derive(Debug, Error)]
pub enum AuthenticationError {
    /// Credentials would be sent over an insecure scheme.
    #[error("Only https is supported for authenticated requests, got '{scheme}'")]
    InsecureScheme { scheme: String },

    /// Any other provider-specific failure.
    #[error("Authentication failed: {message}")]
    Other {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

/// Failure reported by an [`HttpTransport`](crate::HttpTransport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be converted into the transport's native form.
    #[error("Invalid request for transport: {message}")]
    InvalidRequest { message: String },

    /// Connection, TLS, timeout or body-streaming failure.
    #[error("Transport failed: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

/// Failure reported by a [`ParseNode`](crate::ParseNode) or
/// [`ParseNodeFactory`](crate::ParseNodeFactory).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No factory is registered for the content type.
    #[error("Content type '{0}' does not have a factory registered to be parsed")]
    UnsupportedContentType(String),

    /// The payload is not valid for the content type.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The node does not hold a value of the requested shape.
    #[error("Expected {expected}, found {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: String,
    },

    /// A property required by the target type is missing.
    #[error("Missing property '{0}'")]
    MissingProperty(String),
}

// ---------------------------------------------------------------------------
// Adapter errors
// ---------------------------------------------------------------------------

/// Error returned by every send operation of the request adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The request description is absent or does not resolve to a valid URL.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// The response body could not be handed to a codec.
    #[error("Deserialization failed: {message}")]
    Deserialization {
        message: String,
        #[source]
        source: Option<ParseError>,
    },

    /// A `401` challenge was not a Bearer challenge with a claims value.
    #[error("Unable to parse claims from response header '{header}'")]
    ClaimsParse { header: String },

    /// A primitive send variant could not produce the requested kind.
    #[error("Unable to deserialize type: {type_name}")]
    UnsupportedType { type_name: String },

    /// A response handler returned a value of a different type than requested.
    #[error("Response handler returned a value that is not {expected}")]
    ResponseHandler { expected: &'static str },

    /// The server returned a non-2xx status.
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The codec failed while materializing a value from a parse node.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl AdapterError {
    /// Error returned when a send operation receives no request description.
    pub fn request_is_null() -> Self {
        AdapterError::InvalidRequest {
            message: "Request info cannot be null".to_string(),
        }
    }

    /// Returns the HTTP status if this error was produced by a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AdapterError::Api(api) => api.response_status_code,
            _ => None,
        }
    }
}
