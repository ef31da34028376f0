//! The session facade: login, register, logout, and "who am I".
//!
//! [`AuthSession`] sits on top of an [`ApiClient`] and turns the wire
//! operations into session state that UI code can watch:
//!
//! ```text
//!   [Loading] ──probe──→ [SignedIn] / [SignedOut]
//!                           │    ▲          │
//!                        logout  └─ login ──┘
//! ```
//!
//! This layer never navigates or redirects. When a refresh fails deep in
//! the pipeline, the pipeline clears the access token; a background task
//! watching the credential store then signs the session out, and whoever
//! is watching the session decides what to show.

use std::sync::{Arc, Weak};
use std::time::Instant;

use authwire_pipeline::{AccessToken, ApiClient, ApiError};
use authwire_protocol::codec;
use authwire_protocol::{AuthPayload, Endpoint, LoginRequest, RegisterRequest, User};
use authwire_transport::Transport;
use tokio::sync::{Mutex, watch};

use crate::{Session, SessionConfig};

struct Inner<T: Transport> {
    client: ApiClient<T>,
    state: watch::Sender<Session>,
    config: SessionConfig,
    /// When the last "who am I" probe completed. `None` forces a probe.
    probed_at: Mutex<Option<Instant>>,
}

/// Login/logout operations plus the observable session they produce.
///
/// Cheap to clone; clones share the client and the session state.
pub struct AuthSession<T: Transport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for AuthSession<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> AuthSession<T> {
    /// Creates a facade in the loading state. Call
    /// [`fetch_current_session`](Self::fetch_current_session) to resolve it.
    ///
    /// Inside a Tokio runtime this also starts the task that signs the
    /// session out when the pipeline drops the access token (failed
    /// refresh, second `401`). Outside one, only explicit logout does.
    pub fn new(client: ApiClient<T>, config: SessionConfig) -> Self {
        let (state, _) = watch::channel(Session::loading());
        let tokens = client.credentials().subscribe();
        let inner = Arc::new(Inner {
            client,
            state,
            config,
            probed_at: Mutex::new(None),
        });

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(watch_credentials(Arc::downgrade(&inner), tokens));
            }
            Err(_) => tracing::debug!("no Tokio runtime, credential teardown is not tracked"),
        }
        Self { inner }
    }

    pub fn client(&self) -> &ApiClient<T> {
        &self.inner.client
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// The session as it is right now.
    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Returns a receiver notified on every session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.state.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// Signs in with a username and password.
    ///
    /// The access token in the answer reaches the credential store through
    /// the pipeline; this method only records the user.
    ///
    /// # Errors
    /// The server's refusal, unchanged (usually
    /// [`ApiError::CredentialRejected`]).
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let payload: AuthPayload = self
            .inner
            .client
            .post_data(self.path(Endpoint::Login), &body)
            .await?;

        self.sign_in(payload.user.clone()).await;
        tracing::info!(user = %payload.user, "logged in");
        Ok(payload.user)
    }

    /// Creates an account and signs in as it.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: &str,
    ) -> Result<User, ApiError> {
        let body = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            role: role.to_string(),
        };
        let payload: AuthPayload = self
            .inner
            .client
            .post_data(self.path(Endpoint::Register), &body)
            .await?;

        self.sign_in(payload.user.clone()).await;
        tracing::info!(user = %payload.user, role, "registered");
        Ok(payload.user)
    }

    /// [`register`](Self::register) with [`SessionConfig::default_role`].
    pub async fn register_with_default_role(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let role = self.inner.config.default_role.clone();
        self.register(username, password, &role).await
    }

    /// Signs out.
    ///
    /// The token and the user are cleared whatever happens to the logout
    /// call: a client that can't reach the server must still stop being
    /// signed in. A failed call is still reported, after the local state
    /// has been cleared.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.inner.client.post(self.path(Endpoint::Logout)).await;

        let mut probed_at = self.inner.probed_at.lock().await;
        self.inner.client.credentials().clear();
        self.inner.state.send_replace(Session::signed_out());
        *probed_at = None;

        match result {
            Ok(_) => {
                tracing::info!("logged out");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "logout call failed, local session cleared anyway");
                Err(err)
            }
        }
    }

    /// Asks the server who is signed in, at most once per `probe_ttl`.
    ///
    /// Any failure counts as "nobody": being signed out is an expected
    /// answer at startup, not an error.
    pub async fn fetch_current_session(&self) -> Option<User> {
        let mut probed_at = self.inner.probed_at.lock().await;
        if let Some(at) = *probed_at {
            if at.elapsed() < self.inner.config.probe_ttl {
                return self.current_user();
            }
        }

        let user = match self.inner.client.get(self.path(Endpoint::Me)).await {
            Ok(response) => codec::session_user(&response.body).unwrap_or_else(|err| {
                tracing::debug!(error = %err, "unreadable session probe answer");
                None
            }),
            Err(err) => {
                tracing::debug!(error = %err, "session probe failed");
                None
            }
        };

        let session = match &user {
            Some(user) => Session::signed_in(user.clone()),
            None => Session::signed_out(),
        };
        self.inner.state.send_replace(session);
        *probed_at = Some(Instant::now());

        tracing::info!(authenticated = user.is_some(), "session probed");
        user
    }

    async fn sign_in(&self, user: User) {
        // Taking the probe lock orders us after any probe already in
        // flight, so its stale answer can't overwrite this user.
        let mut probed_at = self.inner.probed_at.lock().await;
        self.inner.state.send_replace(Session::signed_in(user));
        *probed_at = None;
    }

    fn path(&self, endpoint: Endpoint) -> &str {
        self.inner.client.config().endpoints.path(endpoint)
    }
}

impl<T: Transport> Inner<T> {
    /// Signs out after the token was cleared behind the session's back.
    async fn end_revoked_session(&self) {
        let mut probed_at = self.probed_at.lock().await;
        // A login may have stored a new token since the clear.
        if self.client.credentials().is_set() {
            return;
        }
        *probed_at = None;

        let signed_out = self.state.send_if_modified(|session| {
            if !session.is_authenticated() {
                return false;
            }
            *session = Session::signed_out();
            true
        });
        if signed_out {
            tracing::warn!("access token revoked, session signed out");
        }
    }
}

/// Watches the credential store and ends the session whenever a token is
/// replaced by nothing. Exits once the session is dropped.
async fn watch_credentials<T: Transport>(
    inner: Weak<Inner<T>>,
    mut tokens: watch::Receiver<Option<AccessToken>>,
) {
    let mut had_token = tokens.borrow_and_update().is_some();
    while tokens.changed().await.is_ok() {
        let has_token = tokens.borrow_and_update().is_some();
        let revoked = had_token && !has_token;
        had_token = has_token;

        let Some(session) = inner.upgrade() else {
            break;
        };
        if revoked {
            session.end_revoked_session().await;
        }
    }
}
