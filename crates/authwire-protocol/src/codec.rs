//! JSON encoding and decoding of wire payloads.
//!
//! Besides plain `encode`/`decode`, the pipeline needs to *peek* into
//! bodies it otherwise passes through untouched: any successful response
//! may carry a fresh access token, and any failed one may carry a server
//! message. Those peeks work on `serde_json::Value` and never fail; a body
//! that isn't JSON simply has nothing to find.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{Envelope, ErrorBody, ProtocolError, User};

/// Serializes a value into JSON bytes.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(value).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Deserializes JSON bytes into a value.
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(data).map_err(|e| ProtocolError::Decode(e.to_string()))
}

/// Deserializes a `{"data": T}` envelope and returns the inner `T`.
pub fn decode_data<T: DeserializeOwned>(data: &[u8]) -> Result<T, ProtocolError> {
    decode::<Envelope<T>>(data).map(|envelope| envelope.data)
}

/// Returns the access token at `data.accessToken`, if the body has one.
///
/// Empty strings and non-string values count as absent.
pub fn access_token_in(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .pointer("/data/accessToken")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Returns the server-provided `message` of a failure body, if any.
pub fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.trim().is_empty())
}

/// Extracts the user from a "who am I" answer.
///
/// Accepts `{"data": {"user": ...}}` as well as a bare `{"user": ...}`.
/// A `null` or missing user decodes to `None`.
pub fn session_user(body: &[u8]) -> Result<Option<User>, ProtocolError> {
    let value: Value = decode(body)?;
    let user = value
        .pointer("/data/user")
        .or_else(|| value.get("user"))
        .cloned()
        .unwrap_or(Value::Null);
    serde_json::from_value(user).map_err(|e| ProtocolError::Decode(e.to_string()))
}
