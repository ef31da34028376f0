//! Wire types for the authentication API.
//!
//! Every successful answer from the server is wrapped in a `{"data": ...}`
//! envelope. Failures carry a `{"message": ...}` body. This module defines
//! the payloads inside those envelopes and the table of endpoint paths.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// The authenticated subject, as the server describes it.
///
/// A `User` is replaced wholesale whenever the session changes; nothing in
/// the client ever patches one field of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub role: String,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.id)
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The `{"data": T}` wrapper around every success payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST /auth/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of `POST /auth/register`.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: String,
}

// Hand-written so passwords never end up in logs.
impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// `data` of a login or register answer.
///
/// The access token is optional on the wire: a server may rely on the
/// refresh cookie alone and let the first API call trigger a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: User,
    #[serde(rename = "accessToken", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// `data` of a refresh answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshPayload {
    #[serde(rename = "accessToken", default)]
    pub access_token: Option<String>,
}

/// Body of a failed request, when the server sends one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// The authentication endpoints the client knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    Register,
    Refresh,
    Logout,
    Me,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => write!(f, "login"),
            Self::Register => write!(f, "register"),
            Self::Refresh => write!(f, "refresh"),
            Self::Logout => write!(f, "logout"),
            Self::Me => write!(f, "me"),
        }
    }
}

/// Paths of the authentication endpoints, relative to the API base URL.
///
/// The pipeline also uses this table to classify requests: a request whose
/// path contains the refresh path is a refresh request, one whose path
/// contains the login or register path is an auth request. Neither kind
/// may ever trigger a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointPaths {
    pub login: String,
    pub register: String,
    pub refresh: String,
    pub logout: String,
    pub me: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            register: "/auth/register".to_string(),
            refresh: "/auth/refresh".to_string(),
            logout: "/auth/logout".to_string(),
            me: "/auth/me".to_string(),
        }
    }
}

impl EndpointPaths {
    pub fn path(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Login => &self.login,
            Endpoint::Register => &self.register,
            Endpoint::Refresh => &self.refresh,
            Endpoint::Logout => &self.logout,
            Endpoint::Me => &self.me,
        }
    }

    /// `true` if `path` targets the refresh endpoint.
    pub fn is_refresh_request(&self, path: &str) -> bool {
        path.contains(self.refresh.as_str())
    }

    /// `true` if `path` targets login or register.
    pub fn is_auth_request(&self, path: &str) -> bool {
        path.contains(self.login.as_str()) || path.contains(self.register.as_str())
    }
}
