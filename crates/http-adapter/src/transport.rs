//! [`HttpTransport`] over `reqwest`.

use abstractions::{HttpRequest, HttpResponse, HttpTransport, RequestOption, TransportError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

/// Decodes selected percent-encoded characters in query parameter names.
///
/// URL templates encode names such as `$select` as `%24select`; some services
/// only accept the literal form. Attach this option to a request to override
/// the transport's default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParametersNameDecodingOption {
    pub enabled: bool,
    pub characters_to_decode: Vec<char>,
}

impl Default for ParametersNameDecodingOption {
    fn default() -> Self {
        Self {
            enabled: true,
            characters_to_decode: vec!['$', '.', '-', '~'],
        }
    }
}

impl RequestOption for ParametersNameDecodingOption {
    const KEY: &'static str = "ParametersNameDecodingOption";
}

/// Sends requests with a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    decoding: ParametersNameDecodingOption,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            decoding: ParametersNameDecodingOption::default(),
        }
    }

    pub fn with_parameters_name_decoding(mut self, option: ParametersNameDecodingOption) -> Self {
        self.decoding = option;
        self
    }

    fn build(&self, request: HttpRequest) -> Result<reqwest::Request, TransportError> {
        let decoding = request
            .options
            .get::<ParametersNameDecodingOption>()
            .unwrap_or(&self.decoding);
        let url = if decoding.enabled {
            decode_parameter_names(&request.url, &decoding.characters_to_decode)
        } else {
            request.url.clone()
        };

        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes()).map_err(|e| {
            TransportError::InvalidRequest {
                message: format!("invalid method '{}': {e}", request.method),
            }
        })?;

        let mut headers = HeaderMap::new();
        for (name, value) in request.headers.iter() {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::InvalidRequest {
                    message: format!("invalid header name '{name}': {e}"),
                }
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| TransportError::InvalidRequest {
                message: format!("invalid value for header '{name}': {e}"),
            })?;
            headers.append(name, value);
        }

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        builder.build().map_err(|e| TransportError::InvalidRequest {
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let native = self.build(request)?;
        tracing::debug!(method = %native.method(), url = %native.url(), "sending request");

        let response = self.client.execute(native).await.map_err(io_error)?;

        let status = response.status().as_u16();
        let version = format!("{:?}", response.version());
        let headers = convert_response_headers(response.headers());
        let body = response.bytes().await.map_err(io_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
            version: Some(version),
        })
    }
}

// Values outside visible ASCII are kept, decoded lossily as UTF-8.
fn convert_response_headers(native: &HeaderMap) -> abstractions::Headers {
    let mut headers = abstractions::Headers::new();
    for (name, value) in native {
        headers.add(
            name.as_str(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        );
    }
    headers
}

fn io_error(e: reqwest::Error) -> TransportError {
    TransportError::Io {
        message: e.to_string(),
        source: Some(Box::new(e)),
    }
}

/// Rewrites the query so that `%XX` escapes of `characters` in parameter
/// names are replaced by the character itself. Values are left untouched.
pub(crate) fn decode_parameter_names(url: &Url, characters: &[char]) -> Url {
    let Some(query) = url.query() else {
        return url.clone();
    };
    if characters.is_empty() || !query.contains('%') {
        return url.clone();
    }

    let decoded = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => format!("{}={value}", decode_name(name, characters)),
            None => decode_name(pair, characters),
        })
        .collect::<Vec<_>>()
        .join("&");

    let mut url = url.clone();
    url.set_query(Some(&decoded));
    url
}

fn decode_name(name: &str, characters: &[char]) -> String {
    let mut out = String::with_capacity(name.len());
    let mut rest = name;
    while let Some(index) = rest.find('%') {
        out.push_str(&rest[..index]);
        let escape = rest.get(index + 1..index + 3);
        let decoded = escape
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            .map(char::from)
            .filter(|c| characters.contains(c));
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[index + 3..];
            }
            None => {
                out.push('%');
                rest = &rest[index + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}
