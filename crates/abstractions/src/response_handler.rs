//! Per-request override of response resolution.
//!
//! When a request carries a [`ResponseHandlerOption`], the adapter hands the
//! raw response and the error map to the handler and returns whatever it
//! produces. Failure mapping, the `204` short-circuit and deserialization are
//! all skipped.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{AdapterError, ErrorMap, HttpResponse, RequestOption};

/// Value produced by a [`ResponseHandler`].
///
/// The send variant downcasts it to its own result type: `Option<T>` or `T`
/// for the value-returning variants, `()` for `send_no_content`.
pub type HandledResponse = Box<dyn Any + Send>;

#[async_trait]
pub trait ResponseHandler: Send + Sync {
    async fn handle_response(
        &self,
        response: HttpResponse,
        error_map: &ErrorMap,
    ) -> Result<HandledResponse, AdapterError>;
}

/// Carries a [`ResponseHandler`] in a request's option bag.
#[derive(Clone)]
pub struct ResponseHandlerOption {
    pub handler: Arc<dyn ResponseHandler>,
}

impl ResponseHandlerOption {
    pub fn new(handler: impl ResponseHandler + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl RequestOption for ResponseHandlerOption {
    const KEY: &'static str = "ResponseHandlerOption";
}

impl std::fmt::Debug for ResponseHandlerOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseHandlerOption").finish_non_exhaustive()
    }
}
