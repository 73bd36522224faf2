//! Request adapter over HTTP.
//!
//! [`HttpRequestAdapter`] executes the [`abstractions::RequestInformation`]s
//! built by generated request builders and resolves each response into a typed
//! model, a primitive value or an [`abstractions::ApiError`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Transport dispatch, claims challenge handling, error
//! mapping and span recording live here. The default transport is
//! [`ReqwestTransport`]; anything implementing
//! [`abstractions::HttpTransport`] can replace it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`adapter`] | [`HttpRequestAdapter`] and its send variants |
//! | [`observability`] | [`ObservabilityOptions`], span and attribute names |
//! | [`transport`] | [`ReqwestTransport`], [`ParametersNameDecodingOption`] |
//! | [`config`] | [`ClientOptions`] |
//! | [`client_factory`] | [`ClientFactory`] |

pub mod adapter;
mod claims;
pub mod client_factory;
pub mod config;
pub mod observability;
mod resolution;
pub mod transport;

pub use adapter::HttpRequestAdapter;
pub use client_factory::ClientFactory;
pub use config::ClientOptions;
pub use observability::ObservabilityOptions;
pub use transport::{ParametersNameDecodingOption, ReqwestTransport};
