//! Wire protocol for Authwire.
//!
//! This crate defines what the client and the authentication server say
//! to each other:
//!
//! - **Types** ([`User`], [`Envelope`], [`AuthPayload`], ...): the
//!   payloads inside `{"data": ...}` envelopes.
//! - **Endpoints** ([`Endpoint`], [`EndpointPaths`]): where each
//!   operation lives, and how to tell a refresh or login request apart
//!   from an ordinary API call.
//! - **Codec** ([`codec`]): JSON encoding plus the peeks the pipeline
//!   needs (fresh access token, server error message).
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (payloads) → Pipeline (auth state)
//! ```

pub mod codec;
mod error;
mod types;

pub use error::ProtocolError;
pub use types::{
    AuthPayload, Endpoint, EndpointPaths, Envelope, ErrorBody, LoginRequest,
    RefreshPayload, RegisterRequest, User,
};
