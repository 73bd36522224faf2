//! Client configuration.
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::observability::ObservabilityOptions;

const DEFAULT_TIMEOUT_SECS: u64 = 100;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Settings for the `reqwest::Client` built by
/// [`ClientFactory`](crate::ClientFactory) and for the adapter's spans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Whole-request timeout, in seconds. `0` disables it.
    pub timeout_secs: u64,

    /// Connection establishment timeout, in seconds. `0` disables it.
    pub connect_timeout_secs: u64,

    pub user_agent: String,

    pub observability: ObservabilityOptions,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            observability: ObservabilityOptions::default(),
        }
    }
}

impl ClientOptions {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_secs > 0).then(|| Duration::from_secs(self.connect_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let options: ClientOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ClientOptions::default());
        assert_eq!(options.timeout(), Some(Duration::from_secs(100)));
        assert!(options.user_agent.starts_with("http-adapter/"));
    }

    #[test]
    fn zero_disables_timeouts() {
        let options: ClientOptions =
            serde_json::from_str(r#"{"timeout_secs": 0, "observability": {"enabled": false}}"#)
                .unwrap();
        assert_eq!(options.timeout(), None);
        assert_eq!(options.connect_timeout(), Some(Duration::from_secs(30)));
        assert!(!options.observability.enabled);
        assert!(!options.observability.include_euii_attributes);
    }
}
