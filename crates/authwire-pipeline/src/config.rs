//! Client configuration.

use std::time::Duration;

use authwire_protocol::EndpointPaths;
use serde::{Deserialize, Serialize};

/// How concurrent `401`s share refresh calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Requests that fail while a refresh is running wait for it and
    /// retry with its result. At most one refresh is in flight.
    #[default]
    Coalesce,

    /// Every eligible `401` runs its own refresh, even if another one is
    /// already in flight.
    PerRequest,
}

/// Settings for an [`ApiClient`](crate::ApiClient).
///
/// All fields have defaults; a partial config file only needs to name
/// what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every request path is relative to.
    pub base_url: String,

    /// Where the authentication endpoints live.
    pub endpoints: EndpointPaths,

    /// Name of the cookie carrying the anti-forgery token.
    pub csrf_cookie: String,

    /// Header the anti-forgery token is echoed in.
    pub csrf_header: String,

    pub refresh_policy: RefreshPolicy,

    /// Per-request timeout handed to the transport. `None` means the
    /// transport's own default.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api/v1".to_string(),
            endpoints: EndpointPaths::default(),
            csrf_cookie: "csrfToken".to_string(),
            csrf_header: "X-CSRF-Token".to_string(),
            refresh_policy: RefreshPolicy::Coalesce,
            timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:3000/api/v1");
        assert_eq!(config.csrf_cookie, "csrfToken");
        assert_eq!(config.csrf_header, "X-CSRF-Token");
        assert_eq!(config.refresh_policy, RefreshPolicy::Coalesce);
        assert_eq!(config.endpoints.refresh, "/auth/refresh");
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_client_config_partial_json_keeps_defaults() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"base_url":"https://api.example.com/v2","refresh_policy":"per_request"}"#,
        )
        .unwrap();
        assert_eq!(config.base_url, "https://api.example.com/v2");
        assert_eq!(config.refresh_policy, RefreshPolicy::PerRequest);
        assert_eq!(config.csrf_cookie, "csrfToken");
        assert_eq!(config.endpoints.login, "/auth/login");
    }
}
