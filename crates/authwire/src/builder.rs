//! `Authwire` builder and handle.
//!
//! This is the entry point for most applications. It ties the layers
//! together: transport → pipeline → session.

use std::time::Duration;

use authwire_pipeline::{ApiClient, ClientConfig, RefreshPolicy};
use authwire_session::{AuthSession, SessionConfig};
use authwire_transport::{ReqwestTransport, Transport};

use crate::AuthwireError;

/// Builder for an [`Authwire`] handle.
///
/// # Example
///
/// ```rust,no_run
/// use authwire::prelude::*;
///
/// # fn main() -> Result<(), AuthwireError> {
/// let authwire = Authwire::builder()
///     .base_url("https://api.example.com/api/v1")
///     .timeout(std::time::Duration::from_secs(10))
///     .build()?;
/// # let _ = authwire;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AuthwireBuilder {
    client_config: ClientConfig,
    session_config: SessionConfig,
}

impl AuthwireBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the URL every request path is relative to.
    pub fn base_url(mut self, url: &str) -> Self {
        self.client_config.base_url = url.to_string();
        self
    }

    /// Replaces the whole client configuration.
    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client_config = config;
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.client_config.timeout = Some(timeout);
        self
    }

    pub fn refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.client_config.refresh_policy = policy;
        self
    }

    /// Builds a handle over a cookie-aware `reqwest` transport.
    ///
    /// # Errors
    /// Fails if the base URL does not parse, the HTTP client can't be
    /// created, or a configured header name is invalid.
    pub fn build(self) -> Result<Authwire<ReqwestTransport>, AuthwireError> {
        let transport = ReqwestTransport::with_timeout(
            &self.client_config.base_url,
            self.client_config.timeout,
        )?;
        self.build_with(transport)
    }

    /// Builds a handle over any transport.
    ///
    /// `base_url` and `timeout` are the transport's business here; the
    /// caller configured `transport` with whatever it needs.
    pub fn build_with<T: Transport>(self, transport: T) -> Result<Authwire<T>, AuthwireError> {
        let client = ApiClient::new(transport, self.client_config)?;
        let session = AuthSession::new(client.clone(), self.session_config);

        tracing::debug!(
            base_url = %client.config().base_url,
            refresh_policy = ?client.config().refresh_policy,
            "authwire client ready"
        );
        Ok(Authwire { client, session })
    }
}

/// An authenticated client and the session built on top of it.
///
/// Cheap to clone; clones share the credential store, the refresh gate,
/// and the session state.
pub struct Authwire<T: Transport = ReqwestTransport> {
    client: ApiClient<T>,
    session: AuthSession<T>,
}

impl<T: Transport> Clone for Authwire<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            session: self.session.clone(),
        }
    }
}

impl Authwire<ReqwestTransport> {
    /// Creates a new builder.
    pub fn builder() -> AuthwireBuilder {
        AuthwireBuilder::new()
    }
}

impl<T: Transport> Authwire<T> {
    /// The request pipeline, for calling application endpoints.
    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }

    /// Login, logout, and the observable session.
    pub fn session(&self) -> &AuthSession<T> {
        &self.session
    }
}
