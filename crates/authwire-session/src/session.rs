//! Session types: what the client believes about who is signed in.
//!
//! A session is derived state, never persisted. It starts out loading,
//! is filled in by the startup probe, replaced on login and register, and
//! emptied on logout.

use std::time::Duration;

use authwire_protocol::User;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Role sent by [`register_with_default_role`].
    ///
    /// [`register_with_default_role`]: crate::AuthSession::register_with_default_role
    pub default_role: String,

    /// How long a completed "who am I" probe stays fresh. Within this
    /// window [`fetch_current_session`] answers from memory.
    ///
    /// [`fetch_current_session`]: crate::AuthSession::fetch_current_session
    pub probe_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_role: "user".to_string(),
            probe_ttl: Duration::from_secs(5 * 60),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A snapshot of the client-side session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The signed-in user, if any.
    pub user: Option<User>,

    /// `true` until the first session probe has resolved.
    pub is_loading: bool,
}

impl Session {
    /// The state before anything is known.
    pub fn loading() -> Self {
        Self {
            user: None,
            is_loading: true,
        }
    }

    pub fn signed_in(user: User) -> Self {
        Self {
            user: Some(user),
            is_loading: false,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            user: None,
            is_loading: false,
        }
    }

    /// A session is authenticated exactly when it has a user.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::loading()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "1".into(),
            username: "ada".into(),
            role: "user".into(),
        }
    }

    #[test]
    fn test_session_default_is_loading_and_anonymous() {
        let session = Session::default();
        assert!(session.is_loading);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_is_authenticated_follows_user_presence() {
        assert!(Session::signed_in(user()).is_authenticated());
        assert!(!Session::signed_out().is_authenticated());
    }

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.default_role, "user");
        assert_eq!(config.probe_ttl, Duration::from_secs(300));
    }
}
