/// Errors that can occur in the transport layer.
///
/// Only connectivity and request-building problems land here. An HTTP
/// response with a non-2xx status is still a successful round trip from
/// the transport's point of view and is returned as `Ok`.
///
/// Variants carry rendered messages instead of source errors so the type
/// stays `Clone`: one failed refresh can be handed to several waiting
/// requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The remote host could not be reached.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request did not complete within the transport's timeout.
    #[error("request timed out")]
    Timeout,

    /// The request could not be built (bad URL, bad header, ...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Reading the response body failed.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// Any other failure reported by the underlying HTTP client.
    #[error("request failed: {0}")]
    Request(String),
}
