//! The request description handed to the request adapter.
//!
//! A [`RequestInformation`] is built by generated request builders immediately
//! before one send call and is consumed by that call. The adapter injects its
//! base URL under the reserved [`BASE_URL_KEY`] path parameter; generated code
//! never supplies it.

use std::collections::HashMap;

use bytes::Bytes;
use url::Url;

use stduritemplate::Value as Substitution;

use crate::{AdapterError, Headers, HttpMethod, RequestOption, RequestOptions};

/// Reserved path parameter holding the adapter's base URL.
pub const BASE_URL_KEY: &str = "baseurl";

/// Path parameter holding a fully-formed URL that bypasses template expansion.
pub const RAW_URL_KEY: &str = "request-raw-url";

const CONTENT_TYPE_HEADER: &str = "content-type";

/// A value bound to a template variable.
///
/// Variable names are matched exactly as written in the template, so
/// percent-encoded names such as `%24top` are bound with that spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue {
    Single(String),
    List(Vec<String>),
}

impl ParameterValue {
    fn to_substitution(&self) -> Substitution {
        match self {
            ParameterValue::Single(value) => Substitution::String(value.clone()),
            ParameterValue::List(values) => {
                Substitution::List(values.iter().cloned().map(Substitution::String).collect())
            }
        }
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::Single(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::Single(value.to_string())
    }
}

impl From<Vec<String>> for ParameterValue {
    fn from(values: Vec<String>) -> Self {
        ParameterValue::List(values)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Single(value.to_string())
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        ParameterValue::Single(value.to_string())
    }
}

/// Method, URL template, parameters, headers, body and options of one request.
#[derive(Debug, Clone, Default)]
pub struct RequestInformation {
    pub http_method: HttpMethod,

    /// RFC 6570 template, e.g. `{+baseurl}/users/{user%2Did}{?%24top}`.
    pub url_template: Option<String>,

    pub path_parameters: HashMap<String, ParameterValue>,
    pub query_parameters: HashMap<String, ParameterValue>,
    pub headers: Headers,
    pub content: Option<Bytes>,
    pub request_options: RequestOptions,
}

impl RequestInformation {
    pub fn new(http_method: HttpMethod, url_template: impl Into<String>) -> Self {
        Self {
            http_method,
            url_template: Some(url_template.into()),
            ..Self::default()
        }
    }

    /// Resolves the template and parameters into an absolute URL.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidRequest`] when the template is missing or
    /// malformed, or when its expansion is not an absolute URL (typically
    /// because a required parameter such as `baseurl` is unresolved).
    pub fn url(&self) -> Result<Url, AdapterError> {
        if let Some(ParameterValue::Single(raw)) = self.path_parameters.get(RAW_URL_KEY) {
            return parse_absolute(raw);
        }

        let template =
            self.url_template
                .as_deref()
                .ok_or_else(|| AdapterError::InvalidRequest {
                    message: "url template cannot be empty".to_string(),
                })?;

        let substitutions: HashMap<String, Substitution> = self
            .path_parameters
            .iter()
            .chain(&self.query_parameters)
            .map(|(name, value)| (name.clone(), value.to_substitution()))
            .collect();

        let expanded = stduritemplate::expand(template, &substitutions).map_err(|e| {
            AdapterError::InvalidRequest {
                message: format!("invalid url template '{template}': {e}"),
            }
        })?;
        parse_absolute(&expanded)
    }

    /// Sets a fully-formed URL, bypassing template expansion.
    pub fn set_url(&mut self, url: &Url) {
        self.query_parameters.clear();
        self.path_parameters.clear();
        self.path_parameters
            .insert(RAW_URL_KEY.to_string(), url.as_str().into());
    }

    pub fn add_path_parameter(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParameterValue>,
    ) {
        self.path_parameters.insert(name.into(), value.into());
    }

    pub fn add_query_parameter(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParameterValue>,
    ) {
        self.query_parameters.insert(name.into(), value.into());
    }

    pub fn add_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.headers.add(name, value);
    }

    /// Sets the body and its `Content-Type` header.
    pub fn set_content(&mut self, content: impl Into<Bytes>, content_type: &str) {
        self.headers.insert(CONTENT_TYPE_HEADER, content_type);
        self.content = Some(content.into());
    }

    pub fn add_request_option<O: RequestOption>(&mut self, option: O) {
        self.request_options.add(option);
    }
}

fn parse_absolute(candidate: &str) -> Result<Url, AdapterError> {
    Url::parse(candidate).map_err(|e| AdapterError::InvalidRequest {
        message: format!("'{candidate}' is not an absolute URL: {e}"),
    })
}
