//! Authentication port and the providers that need no token protocol.
//!
//! The adapter calls [`AuthenticationProvider::authenticate_request`] before
//! every dispatch. On a claims-challenge retry the context map carries the
//! claims under [`CLAIMS_KEY`]; otherwise it is empty. Token acquisition itself
//! lives behind [`AccessTokenProvider`] and is supplied by the host.

use std::collections::HashMap;

use async_trait::async_trait;
use url::Url;

use crate::{AuthenticationError, RequestInformation};

/// Context key carrying the claims of a continuous access evaluation challenge.
pub const CLAIMS_KEY: &str = "claims";

const AUTHORIZATION_HEADER: &str = "authorization";

/// Authenticates a request description, typically by adding headers.
#[async_trait]
pub trait AuthenticationProvider: Send + Sync {
    async fn authenticate_request(
        &self,
        request: &mut RequestInformation,
        additional_context: &HashMap<String, String>,
    ) -> Result<(), AuthenticationError>;
}

/// Leaves requests untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousAuthenticationProvider;

#[async_trait]
impl AuthenticationProvider for AnonymousAuthenticationProvider {
    async fn authenticate_request(
        &self,
        _request: &mut RequestInformation,
        _additional_context: &HashMap<String, String>,
    ) -> Result<(), AuthenticationError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Bearer tokens
// ---------------------------------------------------------------------------

/// Supplies access tokens for a URL.
///
/// An empty token means "do not authenticate this URL" (e.g. the host is not
/// in the provider's allow list).
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn get_authorization_token(
        &self,
        url: &Url,
        additional_context: &HashMap<String, String>,
    ) -> Result<String, AuthenticationError>;
}

/// Adds `Authorization: Bearer <token>` using an [`AccessTokenProvider`].
///
/// When the context carries claims, an `Authorization` header left over from
/// the first attempt is dropped so a fresh token is requested.
pub struct BaseBearerTokenAuthenticationProvider<P> {
    token_provider: P,
}

impl<P: AccessTokenProvider> BaseBearerTokenAuthenticationProvider<P> {
    pub fn new(token_provider: P) -> Self {
        Self { token_provider }
    }
}

#[async_trait]
impl<P: AccessTokenProvider> AuthenticationProvider for BaseBearerTokenAuthenticationProvider<P> {
    async fn authenticate_request(
        &self,
        request: &mut RequestInformation,
        additional_context: &HashMap<String, String>,
    ) -> Result<(), AuthenticationError> {
        if additional_context.contains_key(CLAIMS_KEY)
            && request.headers.remove(AUTHORIZATION_HEADER).is_some()
        {
            tracing::debug!("dropping authorization header to re-authenticate with claims");
        }
        if request.headers.contains(AUTHORIZATION_HEADER) {
            return Ok(());
        }

        let url = request.url().map_err(|e| AuthenticationError::Other {
            message: "request URL could not be resolved".to_string(),
            source: Some(Box::new(e)),
        })?;
        let token = self
            .token_provider
            .get_authorization_token(&url, additional_context)
            .await?;
        if token.is_empty() {
            tracing::debug!(host = url.host_str(), "no token for host, request left anonymous");
        } else {
            request
                .headers
                .insert(AUTHORIZATION_HEADER, format!("Bearer {token}"));
        }
        Ok(())
    }
}

/// Returns a fixed token for allowed hosts over HTTPS.
///
/// Plain HTTP is accepted only for `localhost`.
#[derive(Debug, Clone)]
pub struct StaticAccessTokenProvider {
    token: String,
    allowed_hosts: Vec<String>,
}

impl StaticAccessTokenProvider {
    /// Creates a provider; an empty `allowed_hosts` allows every host.
    pub fn new(token: impl Into<String>, allowed_hosts: Vec<String>) -> Self {
        Self {
            token: token.into(),
            allowed_hosts: allowed_hosts
                .into_iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
        }
    }

    fn is_allowed(&self, url: &Url) -> bool {
        match url.host_str() {
            Some(host) => {
                self.allowed_hosts.is_empty()
                    || self.allowed_hosts.iter().any(|allowed| allowed == host)
            }
            None => false,
        }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticAccessTokenProvider {
    async fn get_authorization_token(
        &self,
        url: &Url,
        _additional_context: &HashMap<String, String>,
    ) -> Result<String, AuthenticationError> {
        if !self.is_allowed(url) {
            return Ok(String::new());
        }
        if url.scheme() != "https" && url.host_str() != Some("localhost") {
            return Err(AuthenticationError::InsecureScheme {
                scheme: url.scheme().to_string(),
            });
        }
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HttpMethod, BASE_URL_KEY};

    fn request(base: &str) -> RequestInformation {
        let mut request = RequestInformation::new(HttpMethod::Get, "{+baseurl}/me");
        request.add_path_parameter(BASE_URL_KEY, base);
        request
    }

    fn provider(hosts: &[&str]) -> BaseBearerTokenAuthenticationProvider<StaticAccessTokenProvider> {
        BaseBearerTokenAuthenticationProvider::new(StaticAccessTokenProvider::new(
            "token-1",
            hosts.iter().map(|h| h.to_string()).collect(),
        ))
    }

    #[tokio::test]
    async fn adds_bearer_header_for_allowed_host() {
        let mut request = request("https://graph.example.com");
        provider(&["graph.example.com"])
            .authenticate_request(&mut request, &HashMap::new())
            .await
            .unwrap();
        assert_eq!(request.headers.get("Authorization"), Some("Bearer token-1"));
    }

    #[tokio::test]
    async fn skips_hosts_outside_allow_list() {
        let mut request = request("https://other.example.com");
        provider(&["graph.example.com"])
            .authenticate_request(&mut request, &HashMap::new())
            .await
            .unwrap();
        assert!(!request.headers.contains("Authorization"));
    }

    #[tokio::test]
    async fn claims_replace_existing_authorization_header() {
        let mut request = request("https://graph.example.com");
        request.add_header("Authorization", "Bearer stale");
        let context = HashMap::from([(CLAIMS_KEY.to_string(), "abc".to_string())]);

        provider(&[])
            .authenticate_request(&mut request, &context)
            .await
            .unwrap();
        assert_eq!(request.headers.get_all("authorization"), ["Bearer token-1".to_string()]);
    }

    #[tokio::test]
    async fn existing_header_is_kept_without_claims() {
        let mut request = request("https://graph.example.com");
        request.add_header("Authorization", "Bearer caller");
        provider(&[])
            .authenticate_request(&mut request, &HashMap::new())
            .await
            .unwrap();
        assert_eq!(request.headers.get("authorization"), Some("Bearer caller"));
    }

    #[tokio::test]
    async fn plain_http_is_rejected_except_localhost() {
        let mut remote = request("http://graph.example.com");
        let err = provider(&[])
            .authenticate_request(&mut remote, &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthenticationError::InsecureScheme { .. }));

        let mut local = request("http://localhost:8080");
        provider(&[])
            .authenticate_request(&mut local, &HashMap::new())
            .await
            .unwrap();
        assert!(local.headers.contains("authorization"));
    }
}
