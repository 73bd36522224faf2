//! Shared fakes for the adapter integration tests.
//!
//! - [`ScriptedTransport`] replays canned responses and records every request.
//! - [`RecordingAuthenticationProvider`] records each authentication context.
//! - [`JsonParseNodeFactory`] is a small `serde_json` codec.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use abstractions::{
    AuthenticationError, AuthenticationProvider, HttpMethod, HttpRequest, HttpResponse,
    HttpTransport, Parsable, ParseError, ParseNode, ParseNodeFactory, RequestInformation,
    TransportError,
};
use async_trait::async_trait;
use bytes::Bytes;
use http_adapter::HttpRequestAdapter;
use serde_json::Value;

pub const BASE_URL: &str = "https://graph.example.com/v1.0";
pub const CAE_CHALLENGE: &str = r#"Bearer realm="x", claims="eyAiY2xhaW1zIjogIngiIH0=""#;
pub const CAE_CLAIMS: &str = "eyAiY2xhaW1zIjogIngiIH0=";

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: impl IntoIterator<Item = HttpResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::Io {
                message: "no scripted response left".to_string(),
                source: None,
            })
    }
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Sets `Authorization: Bearer token-<n>` on the n-th call.
#[derive(Default)]
pub struct RecordingAuthenticationProvider {
    contexts: Mutex<Vec<HashMap<String, String>>>,
}

impl RecordingAuthenticationProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn contexts(&self) -> Vec<HashMap<String, String>> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthenticationProvider for RecordingAuthenticationProvider {
    async fn authenticate_request(
        &self,
        request: &mut RequestInformation,
        additional_context: &HashMap<String, String>,
    ) -> Result<(), AuthenticationError> {
        let mut contexts = self.contexts.lock().unwrap();
        contexts.push(additional_context.clone());
        request
            .headers
            .insert("Authorization", format!("Bearer token-{}", contexts.len()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

pub struct JsonParseNode(Value);

impl JsonParseNode {
    fn unexpected(&self, expected: &'static str) -> ParseError {
        ParseError::UnexpectedValue {
            expected,
            found: self.0.to_string(),
        }
    }
}

impl ParseNode for JsonParseNode {
    fn get_string_value(&self) -> Result<Option<String>, ParseError> {
        match &self.0 {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            _ => Err(self.unexpected("string")),
        }
    }

    fn get_i64_value(&self) -> Result<Option<i64>, ParseError> {
        match &self.0 {
            Value::Null => Ok(None),
            Value::Number(n) => n.as_i64().map(Some).ok_or_else(|| self.unexpected("integer")),
            _ => Err(self.unexpected("integer")),
        }
    }

    fn get_f64_value(&self) -> Result<Option<f64>, ParseError> {
        match &self.0 {
            Value::Null => Ok(None),
            Value::Number(n) => n.as_f64().map(Some).ok_or_else(|| self.unexpected("number")),
            _ => Err(self.unexpected("number")),
        }
    }

    fn get_bool_value(&self) -> Result<Option<bool>, ParseError> {
        match &self.0 {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(*b)),
            _ => Err(self.unexpected("boolean")),
        }
    }

    fn get_bytes_value(&self) -> Result<Option<Bytes>, ParseError> {
        Ok(self.get_string_value()?.map(Bytes::from))
    }

    fn get_child_node(&self, name: &str) -> Result<Option<Box<dyn ParseNode>>, ParseError> {
        match &self.0 {
            Value::Object(map) => Ok(map
                .get(name)
                .map(|value| Box::new(JsonParseNode(value.clone())) as Box<dyn ParseNode>)),
            _ => Err(self.unexpected("object")),
        }
    }

    fn get_collection_nodes(&self) -> Result<Vec<Box<dyn ParseNode>>, ParseError> {
        match &self.0 {
            Value::Array(items) => Ok(items
                .iter()
                .map(|value| Box::new(JsonParseNode(value.clone())) as Box<dyn ParseNode>)
                .collect()),
            _ => Err(self.unexpected("array")),
        }
    }
}

/// `application/json` codec that counts how often it is asked for a root node.
#[derive(Default)]
pub struct JsonParseNodeFactory {
    calls: AtomicUsize,
}

impl JsonParseNodeFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ParseNodeFactory for JsonParseNodeFactory {
    fn get_root_parse_node(
        &self,
        content_type: &str,
        content: &[u8],
    ) -> Result<Box<dyn ParseNode>, ParseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if content_type != "application/json" {
            return Err(ParseError::UnsupportedContentType(content_type.to_string()));
        }
        let value = serde_json::from_slice(content)
            .map_err(|e| ParseError::InvalidPayload(e.to_string()))?;
        Ok(Box::new(JsonParseNode(value)))
    }
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
}

impl Parsable for User {
    fn create_from_parse_node(node: &dyn ParseNode) -> Result<Self, ParseError> {
        let id = node
            .get_required_child("id")?
            .get_string_value()?
            .ok_or_else(|| ParseError::MissingProperty("id".to_string()))?;
        let display_name = match node.get_child_node("displayName")? {
            Some(child) => child.get_string_value()?,
            None => None,
        };
        Ok(Self { id, display_name })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ODataError {
    pub code: String,
    pub message: String,
}

impl Parsable for ODataError {
    fn create_from_parse_node(node: &dyn ParseNode) -> Result<Self, ParseError> {
        let error = node.get_required_child("error")?;
        let field = |name: &str| -> Result<String, ParseError> {
            Ok(error
                .get_required_child(name)?
                .get_string_value()?
                .unwrap_or_default())
        };
        Ok(Self {
            code: field("code")?,
            message: field("message")?,
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("service unavailable")]
pub struct ServiceUnavailable;

impl Parsable for ServiceUnavailable {
    fn create_from_parse_node(_node: &dyn ParseNode) -> Result<Self, ParseError> {
        Ok(Self)
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub struct Harness {
    pub adapter: HttpRequestAdapter,
    pub transport: Arc<ScriptedTransport>,
    pub auth: Arc<RecordingAuthenticationProvider>,
    pub codec: Arc<JsonParseNodeFactory>,
}

pub fn harness(responses: impl IntoIterator<Item = HttpResponse>) -> Harness {
    let transport = ScriptedTransport::new(responses);
    let auth = RecordingAuthenticationProvider::new();
    let codec = JsonParseNodeFactory::new();
    let mut adapter = HttpRequestAdapter::new(auth.clone(), codec.clone(), transport.clone());
    adapter.set_base_url(BASE_URL);
    Harness {
        adapter,
        transport,
        auth,
        codec,
    }
}

pub fn get(template: &str) -> RequestInformation {
    RequestInformation::new(HttpMethod::Get, template)
}

pub fn json(status: u16, body: &str) -> HttpResponse {
    HttpResponse::new(status)
        .with_header("Content-Type", "application/json; charset=utf-8")
        .with_body(body.to_string())
}
