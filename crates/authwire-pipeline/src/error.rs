//! Error types for the request pipeline.

use authwire_protocol::ProtocolError;
use authwire_transport::{StatusCode, TransportError};

/// Everything a caller of the pipeline can observe as a failed request.
///
/// Only one kind of failure never shows up here: a first `401` on an
/// ordinary API call that a refresh fixed. That one is recovered inside
/// the pipeline and the caller just sees the successful retry.
///
/// `Clone` because a single failed refresh is reported to every request
/// that was waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// Login or register was refused (bad credentials, invalid input).
    /// `message` is the server's own text when it sent one.
    #[error("credentials rejected: {message}")]
    CredentialRejected { status: StatusCode, message: String },

    /// The session could not be renewed: the refresh call failed, or the
    /// request was refused again after a successful refresh. The stored
    /// access token has already been cleared when this is returned.
    #[error("session expired: {message}")]
    SessionExpired { status: StatusCode, message: String },

    /// Any other non-2xx answer, passed through unchanged.
    #[error("request failed with status {status}: {message}")]
    Status { status: StatusCode, message: String },

    /// The request never got an HTTP answer.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The answer did not match the wire contract.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The client was built with settings it cannot use.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// The HTTP status behind this error, if there was one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::CredentialRejected { status, .. }
            | Self::SessionExpired { status, .. }
            | Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` if the server answered `401 Unauthorized`.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Text suitable for showing to a user: the server's message when it
    /// sent one, a generic description otherwise.
    pub fn user_message(&self) -> String {
        match self {
            Self::CredentialRejected { message, .. }
            | Self::SessionExpired { message, .. }
            | Self::Status { message, .. } => message.clone(),
            Self::Transport(_) => "Network error".to_string(),
            Self::Protocol(_) => "Unexpected response from server".to_string(),
            Self::InvalidConfig(_) => "Client misconfigured".to_string(),
        }
    }
}
