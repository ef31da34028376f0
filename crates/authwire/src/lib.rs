//! # Authwire
//!
//! An HTTP client for APIs that authenticate with a short-lived bearer
//! token and a long-lived session cookie.
//!
//! Every request carries the current access token and the anti-forgery
//! header. When the server answers `401`, the client renews the token
//! through the refresh endpoint and resends the request once. Callers
//! only see a failure when the session really is gone.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use authwire::prelude::*;
//!
//! # async fn run() -> Result<(), AuthwireError> {
//! let authwire = Authwire::builder()
//!     .base_url("http://localhost:3000/api/v1")
//!     .build()?;
//!
//! authwire.session().login("ada", "secret").await?;
//! let projects = authwire.client().get("/projects").await?;
//! println!("{}", projects.text());
//! authwire.session().logout().await?;
//! # Ok(())
//! # }
//! ```

mod builder;
mod error;
pub mod telemetry;

pub use builder::{Authwire, AuthwireBuilder};
pub use error::AuthwireError;

pub use authwire_pipeline as pipeline;
pub use authwire_protocol as protocol;
pub use authwire_session as session;
pub use authwire_transport as transport;

/// The types most applications need.
pub mod prelude {
    pub use crate::{Authwire, AuthwireBuilder, AuthwireError};

    pub use authwire_pipeline::{
        AccessToken, ApiClient, ApiError, ClientConfig, CredentialStore, RefreshPolicy,
    };
    pub use authwire_protocol::{Endpoint, EndpointPaths, User};
    pub use authwire_session::{AuthSession, Session, SessionConfig};
    pub use authwire_transport::{
        HttpRequest, HttpResponse, Method, ReqwestTransport, StatusCode, Transport,
        TransportError,
    };
}
