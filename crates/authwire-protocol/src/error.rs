//! Error types for the protocol layer.
//!
//! Each crate in Authwire defines its own error enum. A `ProtocolError`
//! means the bytes arrived fine but did not have the shape the wire
//! contract promises.

/// Errors that can occur while encoding or decoding wire payloads.
///
/// The serde error is rendered to a string so the type is `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(String),

    /// Deserialization failed: malformed JSON, missing required fields,
    /// wrong data types.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The payload decoded but a field the contract requires is absent,
    /// e.g. a refresh answer without `accessToken`.
    #[error("response is missing `{0}`")]
    MissingField(&'static str),
}
