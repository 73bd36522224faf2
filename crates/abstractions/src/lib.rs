//! Domain types and port traits for the typed HTTP request adapter.
//!
//! Generated request builders describe each call as a [`RequestInformation`];
//! the adapter in the `http-adapter` crate executes it and resolves the
//! response into a [`Parsable`] model, a primitive value, or an [`ApiError`]
//! chosen through an [`ErrorMap`].
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies. It
//! defines *what* the adapter needs from its collaborators
//! ([`AuthenticationProvider`], [`HttpTransport`], [`ParseNodeFactory`],
//! [`ResponseHandler`]); adapter crates and hosts supply *how*.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`request_information`] | The request description, RFC 6570 URL resolution and the reserved `baseurl` parameter |
//! | [`request_option`] | The per-request option bag |
//! | [`authentication`] | Authentication and access-token ports, bearer provider |
//! | [`serialization`] | Parse node, parsable and codec factory ports |
//! | [`error_map`] | Status → error factory table |
//! | [`transport`] | Native request/response and the transport port |
//! | [`response_handler`] | Per-request response resolution override |
//! | [`errors`] | [`AdapterError`] and collaborator error types |

pub mod authentication;
pub mod error_map;
pub mod errors;
pub mod headers;
pub mod method;
pub mod request_information;
pub mod request_option;
pub mod response_handler;
pub mod serialization;
pub mod transport;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use authentication::{
    AccessTokenProvider, AnonymousAuthenticationProvider, AuthenticationProvider,
    BaseBearerTokenAuthenticationProvider, StaticAccessTokenProvider, CLAIMS_KEY,
};
pub use error_map::{ErrorFactory, ErrorMap, ErrorObject};
pub use errors::{AdapterError, ApiError, AuthenticationError, BoxError, ParseError, TransportError};
pub use headers::Headers;
pub use method::HttpMethod;
pub use request_information::{ParameterValue, RequestInformation, BASE_URL_KEY, RAW_URL_KEY};
pub use request_option::{RequestOption, RequestOptions};
pub use response_handler::{HandledResponse, ResponseHandler, ResponseHandlerOption};
pub use serialization::{
    Parsable, ParseNode, ParseNodeFactory, ParseNodeFactoryRegistry, PrimitiveKind, PrimitiveValue,
};
pub use transport::{HttpRequest, HttpResponse, HttpTransport};
