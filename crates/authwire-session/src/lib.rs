//! Session management for Authwire.
//!
//! This crate is what application code usually talks to:
//!
//! 1. **Operations**: login, register, logout ([`AuthSession`])
//! 2. **Startup probe**: asking the server who is signed in
//! 3. **Observation**: a [`Session`] snapshot, or a watch receiver that
//!    fires on every change, so UI code can react without polling
//!
//! # How it fits in the stack
//!
//! ```text
//! Application (above)      ← renders, navigates, reacts to Session
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Pipeline (below)         ← tokens, refresh, retry
//! ```

mod facade;
mod session;

pub use facade::AuthSession;
pub use session::{Session, SessionConfig};
