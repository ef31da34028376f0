//! Transport abstraction layer for Authwire.
//!
//! Provides the [`Transport`] trait that the request pipeline sends
//! through, plus the owned [`HttpRequest`]/[`HttpResponse`] values it
//! exchanges. The pipeline never talks to an HTTP client directly, so the
//! same refresh logic runs against `reqwest` in production and against a
//! scripted transport in tests.
//!
//! # Feature Flags
//!
//! - `reqwest` (default): [`ReqwestTransport`], cookie-aware HTTP via `reqwest`
//! - `mock`: [`mock::ScriptedTransport`], an in-memory transport for tests

mod cookie;
mod error;
mod message;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
#[cfg(feature = "reqwest")]
mod reqwest_transport;

pub use cookie::cookie_value;
pub use error::TransportError;
pub use message::{HttpRequest, HttpResponse};
#[cfg(feature = "reqwest")]
pub use reqwest_transport::ReqwestTransport;

pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};

use std::future::Future;

/// Sends requests and exposes the cookies the server has set.
///
/// Implementations must send cookies with every request (the refresh
/// flow depends on a server-managed session cookie) and must return
/// every HTTP response as `Ok`, whatever its status. Status handling is
/// the pipeline's job.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → one transport is shared by every request
///   in flight, across Tokio tasks.
/// - The returned future is `Send` so callers can spawn requests.
pub trait Transport: Send + Sync + 'static {
    /// Sends one request and buffers the whole response.
    ///
    /// Timeouts, if any, are the transport's own setting.
    fn send(
        &self,
        request: &HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;

    /// Returns the current value of cookie `name`, if the server set one.
    ///
    /// Never fails: a missing or unreadable cookie is simply `None`.
    fn cookie(&self, name: &str) -> Option<String>;
}
