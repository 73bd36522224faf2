//! Transport port and the native request/response it exchanges.
//!
//! [`HttpRequest`] is what the adapter materializes from a
//! [`RequestInformation`](crate::RequestInformation); [`HttpResponse`] is what
//! the transport hands back, with the body fully read. Both are plain data so
//! transports and test doubles can be swapped freely.

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::{Headers, HttpMethod, RequestOptions, TransportError};

/// A materialized request, ready for dispatch.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Headers,
    pub body: Option<Bytes>,

    /// Options copied from the request description, readable by transport
    /// middleware.
    pub options: RequestOptions,
}

impl PartialEq for HttpRequest {
    /// Compares the wire-visible parts: method, URL, headers and body.
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method
            && self.url == other.url
            && self.headers == other.headers
            && self.body == other.body
    }
}

/// A response with its body fully read.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,

    /// Protocol version as reported by the transport, e.g. `"HTTP/1.1"`.
    pub version: Option<String>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// `true` for statuses in `[200, 300)`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The media type of the body: lowercased, parameters stripped.
    ///
    /// `application/json; charset=utf-8` resolves to `application/json`.
    pub fn content_type(&self) -> Option<String> {
        let header = self.headers.get("content-type")?;
        let media_type = header.split(';').next()?.trim().to_ascii_lowercase();
        if media_type.is_empty() {
            None
        } else {
            Some(media_type)
        }
    }
}

/// Sends native requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
