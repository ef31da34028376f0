//! Pre-send decoration: bearer token and anti-forgery header.

use authwire_transport::header::{AUTHORIZATION, HeaderName, HeaderValue};
use authwire_transport::{HttpRequest, Transport};

use crate::{ApiError, CredentialStore};

/// Adds credentials to every outgoing request, right before it is sent.
///
/// - If the store holds a token → `Authorization: Bearer <token>`.
/// - If the server set the anti-forgery cookie → its decoded value is
///   echoed in the anti-forgery header (`X-CSRF-Token` by default).
///
/// Decoration never fails and never blocks. A missing token or cookie
/// just means the header is left alone.
#[derive(Debug, Clone)]
pub struct RequestAuthenticator {
    store: CredentialStore,
    csrf_cookie: String,
    csrf_header: HeaderName,
}

impl RequestAuthenticator {
    /// # Errors
    /// Returns [`ApiError::InvalidConfig`] if `csrf_header` is not a
    /// valid header name.
    pub fn new(
        store: CredentialStore,
        csrf_cookie: impl Into<String>,
        csrf_header: &str,
    ) -> Result<Self, ApiError> {
        let csrf_header = HeaderName::from_bytes(csrf_header.as_bytes())
            .map_err(|e| {
                ApiError::InvalidConfig(format!(
                    "bad anti-forgery header name {csrf_header:?}: {e}"
                ))
            })?;
        Ok(Self {
            store,
            csrf_cookie: csrf_cookie.into(),
            csrf_header,
        })
    }

    /// Decorates `request` in place using the store and the transport's
    /// cookies.
    pub fn decorate<T: Transport>(&self, request: &mut HttpRequest, transport: &T) {
        let bearer = self.store.get().and_then(|token| {
            let mut value = HeaderValue::from_str(&token.bearer()).ok()?;
            value.set_sensitive(true);
            Some(value)
        });
        let has_bearer = bearer.is_some();
        if let Some(value) = bearer {
            request.set_header(AUTHORIZATION, value);
        }

        let csrf = transport
            .cookie(&self.csrf_cookie)
            .and_then(|token| HeaderValue::from_str(&token).ok());
        let has_csrf = csrf.is_some();
        if let Some(value) = csrf {
            request.set_header(self.csrf_header.clone(), value);
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            bearer = has_bearer,
            csrf = has_csrf,
            "request decorated"
        );
    }
}
