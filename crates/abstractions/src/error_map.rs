//! Mapping from response status to the error type materialized on failure.
//!
//! Keys are an exact 3-digit status (`"404"`) or a class wildcard (`"4XX"`,
//! `"5XX"`). [`ErrorMap::resolve`] looks up the exact status first, then the
//! wildcard for the status's hundred-range.

use std::any::Any;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::Arc;

use crate::errors::BoxError;
use crate::{ParseError, ParseNode, Parsable};

type CreateFn =
    dyn Fn(&dyn ParseNode) -> Result<Box<dyn Any + Send + Sync>, ParseError> + Send + Sync;

/// What an [`ErrorFactory`] produced from a response body.
#[derive(Debug)]
pub enum ErrorObject {
    /// An error type, ready to be wrapped in an [`ApiError`](crate::ApiError).
    Error(BoxError),
    /// A value that is not an error; carries the type name for diagnostics.
    Unexpected { type_name: &'static str },
}

/// Materializes an error object from a parse node.
#[derive(Clone)]
pub struct ErrorFactory {
    type_name: &'static str,
    create: Arc<CreateFn>,
}

impl ErrorFactory {
    /// Factory for a typed error `E`.
    pub fn of<E>() -> Self
    where
        E: Parsable + StdError + Sync,
    {
        Self {
            type_name: std::any::type_name::<E>(),
            create: Arc::new(|node: &dyn ParseNode| -> Result<Box<dyn Any + Send + Sync>, ParseError> {
                let error: BoxError = Box::new(E::create_from_parse_node(node)?);
                Ok(Box::new(error))
            }),
        }
    }

    /// Factory for an arbitrary model type `T`.
    ///
    /// Registering a non-error type is allowed; resolution then reports it as
    /// [`ErrorObject::Unexpected`].
    pub fn for_model<T>() -> Self
    where
        T: Parsable + Sync,
    {
        Self {
            type_name: std::any::type_name::<T>(),
            create: Arc::new(|node: &dyn ParseNode| -> Result<Box<dyn Any + Send + Sync>, ParseError> {
                Ok(Box::new(T::create_from_parse_node(node)?))
            }),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn create(&self, node: &dyn ParseNode) -> Result<ErrorObject, ParseError> {
        let value = (self.create)(node)?;
        Ok(match value.downcast::<BoxError>() {
            Ok(error) => ErrorObject::Error(*error),
            Err(_) => ErrorObject::Unexpected {
                type_name: self.type_name,
            },
        })
    }
}

impl std::fmt::Debug for ErrorFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorFactory")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Discriminator → [`ErrorFactory`] table supplied with each send call.
#[derive(Debug, Clone, Default)]
pub struct ErrorMap {
    entries: HashMap<String, ErrorFactory>,
}

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `discriminator` (`"404"`, `"4XX"`, `"5XX"`).
    pub fn insert(&mut self, discriminator: impl Into<String>, factory: ErrorFactory) {
        self.entries.insert(discriminator.into().to_ascii_uppercase(), factory);
    }

    /// Builder form of [`ErrorMap::insert`] for a typed error.
    pub fn with<E>(mut self, discriminator: &str) -> Self
    where
        E: Parsable + StdError + Sync,
    {
        self.insert(discriminator, ErrorFactory::of::<E>());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Resolves the factory for `status`: exact code, then class wildcard.
    pub fn resolve(&self, status: u16) -> Option<&ErrorFactory> {
        if let Some(factory) = self.entries.get(&status.to_string()) {
            return Some(factory);
        }
        match status {
            400..=499 => self.entries.get("4XX"),
            500..=599 => self.entries.get("5XX"),
            _ => None,
        }
    }
}
