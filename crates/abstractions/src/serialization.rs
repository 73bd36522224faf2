//! Codec-agnostic parsing ports.
//!
//! A [`ParseNodeFactory`] turns `(content type, bytes)` into a navigable
//! [`ParseNode`] tree; model types implement [`Parsable`] to materialize
//! themselves from a node. The adapter depends only on these traits, and the
//! concrete codec is picked at runtime by content type through
//! [`ParseNodeFactoryRegistry`].

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, FixedOffset};

use crate::{AdapterError, ParseError};

// ---------------------------------------------------------------------------
// Parse nodes
// ---------------------------------------------------------------------------

/// One node of a deserialized response body.
///
/// Scalar getters return `Ok(None)` for an explicit null and
/// [`ParseError::UnexpectedValue`] when the node holds a different shape.
pub trait ParseNode: Send + Sync {
    fn get_string_value(&self) -> Result<Option<String>, ParseError>;

    fn get_i64_value(&self) -> Result<Option<i64>, ParseError>;

    fn get_f64_value(&self) -> Result<Option<f64>, ParseError>;

    fn get_bool_value(&self) -> Result<Option<bool>, ParseError>;

    fn get_bytes_value(&self) -> Result<Option<Bytes>, ParseError>;

    /// Parses the node's string value as an RFC 3339 timestamp.
    fn get_datetime_value(&self) -> Result<Option<DateTime<FixedOffset>>, ParseError> {
        self.get_string_value()?
            .map(|raw| {
                DateTime::parse_from_rfc3339(&raw).map_err(|_| ParseError::UnexpectedValue {
                    expected: "RFC 3339 date-time",
                    found: raw,
                })
            })
            .transpose()
    }

    /// Returns the property `name` of an object node.
    fn get_child_node(&self, name: &str) -> Result<Option<Box<dyn ParseNode>>, ParseError>;

    /// Returns the elements of a collection node.
    fn get_collection_nodes(&self) -> Result<Vec<Box<dyn ParseNode>>, ParseError>;
}

impl<'a> dyn ParseNode + 'a {
    pub fn get_object_value<T: Parsable>(&self) -> Result<T, ParseError> {
        T::create_from_parse_node(self)
    }

    pub fn get_collection_of_object_values<T: Parsable>(&self) -> Result<Vec<T>, ParseError> {
        self.get_collection_nodes()?
            .iter()
            .map(|node| node.as_ref().get_object_value::<T>())
            .collect()
    }

    /// Reads one value of `kind`; `Ok(None)` when the node is null.
    pub fn get_primitive_value(&self, kind: PrimitiveKind) -> Result<Option<PrimitiveValue>, ParseError> {
        Ok(match kind {
            PrimitiveKind::String => self.get_string_value()?.map(PrimitiveValue::String),
            PrimitiveKind::Int => self.get_i64_value()?.map(PrimitiveValue::Int),
            PrimitiveKind::Float => self.get_f64_value()?.map(PrimitiveValue::Float),
            PrimitiveKind::Bool => self.get_bool_value()?.map(PrimitiveValue::Bool),
            PrimitiveKind::DateTime => self.get_datetime_value()?.map(PrimitiveValue::DateTime),
            PrimitiveKind::Bytes => self.get_bytes_value()?.map(PrimitiveValue::Bytes),
        })
    }

    /// Reads every non-null element of a collection node as `kind`.
    pub fn get_collection_of_primitive_values(
        &self,
        kind: PrimitiveKind,
    ) -> Result<Vec<PrimitiveValue>, ParseError> {
        let mut values = Vec::new();
        for node in self.get_collection_nodes()? {
            if let Some(value) = node.as_ref().get_primitive_value(kind)? {
                values.push(value);
            }
        }
        Ok(values)
    }

    /// Returns the property `name`, failing when it is absent.
    pub fn get_required_child(&self, name: &str) -> Result<Box<dyn ParseNode>, ParseError> {
        self.get_child_node(name)?
            .ok_or_else(|| ParseError::MissingProperty(name.to_string()))
    }
}

/// A model type that can be materialized from a parse node.
pub trait Parsable: Sized + Send + 'static {
    fn create_from_parse_node(node: &dyn ParseNode) -> Result<Self, ParseError>;
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// The scalar kinds the primitive send variants can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Int,
    Float,
    Bool,
    DateTime,
    /// Raw body bytes; read without the structured parser by `send_primitive`.
    Bytes,
}

impl PrimitiveKind {
    pub fn type_name(self) -> &'static str {
        match self {
            PrimitiveKind::String => "str",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::DateTime => "datetime",
            PrimitiveKind::Bytes => "bytes",
        }
    }
}

impl FromStr for PrimitiveKind {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "str" | "string" => Ok(PrimitiveKind::String),
            "int" | "i64" => Ok(PrimitiveKind::Int),
            "float" | "f64" => Ok(PrimitiveKind::Float),
            "bool" => Ok(PrimitiveKind::Bool),
            "datetime" => Ok(PrimitiveKind::DateTime),
            "bytes" => Ok(PrimitiveKind::Bytes),
            other => Err(AdapterError::UnsupportedType {
                type_name: other.to_string(),
            }),
        }
    }
}

/// A scalar produced by the primitive send variants.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(DateTime<FixedOffset>),
    Bytes(Bytes),
}

impl PrimitiveValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PrimitiveValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            PrimitiveValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Factories
// ---------------------------------------------------------------------------

/// Creates root parse nodes for a response body.
pub trait ParseNodeFactory: Send + Sync {
    fn get_root_parse_node(
        &self,
        content_type: &str,
        content: &[u8],
    ) -> Result<Box<dyn ParseNode>, ParseError>;
}

/// Dispatches to a registered factory by content type.
///
/// Vendor-specific types fall back to their structured suffix, so
/// `application/vnd.github+json` is served by the `application/json` factory
/// unless the vendor type is registered itself.
#[derive(Clone, Default)]
pub struct ParseNodeFactoryRegistry {
    factories: HashMap<String, Arc<dyn ParseNodeFactory>>,
}

impl ParseNodeFactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, content_type: &str, factory: Arc<dyn ParseNodeFactory>) {
        self.factories
            .insert(content_type.to_ascii_lowercase(), factory);
    }

    fn resolve(&self, content_type: &str) -> Option<&Arc<dyn ParseNodeFactory>> {
        let bare = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if let Some(factory) = self.factories.get(&bare) {
            return Some(factory);
        }
        let (main, sub) = bare.split_once('/')?;
        let suffix = sub.rsplit_once('+').map(|(_, suffix)| suffix)?;
        self.factories.get(&format!("{main}/{suffix}"))
    }
}

impl std::fmt::Debug for ParseNodeFactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseNodeFactoryRegistry")
            .field("content_types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ParseNodeFactory for ParseNodeFactoryRegistry {
    fn get_root_parse_node(
        &self,
        content_type: &str,
        content: &[u8],
    ) -> Result<Box<dyn ParseNode>, ParseError> {
        if content_type.is_empty() {
            return Err(ParseError::UnsupportedContentType(String::new()));
        }
        self.resolve(content_type)
            .ok_or_else(|| ParseError::UnsupportedContentType(content_type.to_string()))?
            .get_root_parse_node(content_type, content)
    }
}
