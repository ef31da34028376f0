//! The authenticated request pipeline for Authwire.
//!
//! This crate is where the failure handling lives:
//!
//! 1. **Credential storage**: [`CredentialStore`] holds the current
//!    access token in memory, shared by handle.
//! 2. **Decoration**: [`RequestAuthenticator`] adds the bearer token
//!    and the anti-forgery header to every request.
//! 3. **Interception**: [`ResponseInterceptor`] captures newly issued
//!    tokens and turns a first `401` into one refresh and one retry.
//!
//! [`ApiClient`] ties the three together over any
//! [`Transport`](authwire_transport::Transport).
//!
//! ```text
//! Session Layer (above)   ← login/logout, who is signed in
//!     ↕
//! Pipeline (this crate)   ← tokens on the way out, recovery on the way back
//!     ↕
//! Transport (below)       ← bytes and cookies
//! ```

pub mod attempt;
mod authenticator;
mod client;
mod config;
mod error;
mod interceptor;
mod refresh;
mod store;

pub use attempt::{Attempt, PendingRequest};
pub use authenticator::RequestAuthenticator;
pub use client::ApiClient;
pub use config::{ClientConfig, RefreshPolicy};
pub use error::ApiError;
pub use interceptor::ResponseInterceptor;
pub use refresh::RefreshOutcome;
pub use store::{AccessToken, CredentialStore};
