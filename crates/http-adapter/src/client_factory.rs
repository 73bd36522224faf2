//! Builds the `reqwest::Client` used by [`ReqwestTransport`](crate::ReqwestTransport).

use abstractions::TransportError;

use crate::config::ClientOptions;

/// Creates HTTP clients from [`ClientOptions`].
pub struct ClientFactory;

impl ClientFactory {
    /// Builds a client with the configured timeouts and user agent.
    ///
    /// Redirects follow `reqwest`'s default policy.
    ///
    /// # Errors
    ///
    /// [`TransportError::Io`] when the TLS backend cannot be initialised.
    pub fn create_with_default_options(options: &ClientOptions) -> Result<reqwest::Client, TransportError> {
        let mut builder = reqwest::Client::builder().user_agent(options.user_agent.as_str());
        if let Some(timeout) = options.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = options.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        builder.build().map_err(|e| TransportError::Io {
            message: format!("failed to build HTTP client: {e}"),
            source: Some(Box::new(e)),
        })
    }
}
