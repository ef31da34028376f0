//! Unified error type for Authwire.

use authwire_pipeline::ApiError;
use authwire_protocol::ProtocolError;
use authwire_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `authwire` meta-crate you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant generates the `From` impls, so `?` converts
/// sub-crate errors automatically.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthwireError {
    /// The request never got an HTTP answer (connect, timeout, body).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A body could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The server refused, or the session could not be recovered.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthwireError {
    /// `true` if the caller is no longer signed in and should log in again.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Api(ApiError::SessionExpired { .. }))
    }
}
