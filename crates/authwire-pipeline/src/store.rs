//! The in-memory holder of the current access token.
//!
//! There is exactly one "current" token per client. It lives in memory
//! only, is overwritten by every login and refresh, and is cleared on
//! logout or when a refresh fails. Nothing here ever writes it to disk.
//!
//! # Concurrency note
//!
//! The cell is a `tokio::sync::watch` channel. A write replaces the value
//! for every reader at once, so readers never see a stale token, and
//! anyone who wants to react to token changes can [`subscribe`].
//!
//! [`subscribe`]: CredentialStore::subscribe

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

// ---------------------------------------------------------------------------
// AccessToken
// ---------------------------------------------------------------------------

/// An opaque, short-lived bearer credential.
///
/// The shape is never validated. `Debug` prints a placeholder so a token
/// can't leak through a stray `{:?}` in a log line.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The value of an `Authorization` header carrying this token.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

impl From<String> for AccessToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for AccessToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

// ---------------------------------------------------------------------------
// CredentialStore
// ---------------------------------------------------------------------------

/// Shared handle to the current access token.
///
/// Cloning the store clones the *handle*: every clone reads and writes the
/// same cell. The request decorator and the response interceptor each get
/// a clone instead of reaching for a global.
#[derive(Clone)]
pub struct CredentialStore {
    cell: Arc<watch::Sender<Option<AccessToken>>>,
}

impl CredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        let (cell, _) = watch::channel(None);
        Self {
            cell: Arc::new(cell),
        }
    }

    /// Replaces the current token (or clears it with `None`).
    pub fn set(&self, token: Option<AccessToken>) {
        self.cell.send_replace(token);
    }

    /// Returns the current token.
    pub fn get(&self) -> Option<AccessToken> {
        self.cell.borrow().clone()
    }

    pub fn clear(&self) {
        self.set(None);
    }

    pub fn is_set(&self) -> bool {
        self.cell.borrow().is_some()
    }

    /// Returns a receiver that is notified on every write.
    pub fn subscribe(&self) -> watch::Receiver<Option<AccessToken>> {
        self.cell.subscribe()
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("is_set", &self.is_set())
            .finish()
    }
}
