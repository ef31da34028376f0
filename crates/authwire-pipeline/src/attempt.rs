//! Request attempts and the single-retry guarantee.
//!
//! A request goes out at most twice: once as sent by the caller, and at
//! most once more after a refresh. Instead of a mutable "already retried"
//! flag, the attempt is a type parameter:
//!
//! ```text
//!   PendingRequest<Initial> ──(into_retry)──→ PendingRequest<Retried>
//! ```
//!
//! `into_retry` only exists on `PendingRequest<Initial>` and consumes it,
//! so there is no way to write code that retries a retried request.

use std::fmt;
use std::marker::PhantomData;

use authwire_transport::HttpRequest;
use authwire_transport::header::{AUTHORIZATION, HeaderValue};

use crate::AccessToken;

/// Which attempt a request is on, for logs and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Initial,
    Retried,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::Retried => write!(f, "retried"),
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Marker for the attempt a [`PendingRequest`] is on.
pub trait AttemptState: sealed::Sealed {
    const ATTEMPT: Attempt;
}

/// The caller's first attempt. May be retried once.
#[derive(Debug)]
pub enum Initial {}

/// The resubmission after a refresh. Never retried.
#[derive(Debug)]
pub enum Retried {}

impl sealed::Sealed for Initial {}
impl sealed::Sealed for Retried {}

impl AttemptState for Initial {
    const ATTEMPT: Attempt = Attempt::Initial;
}

impl AttemptState for Retried {
    const ATTEMPT: Attempt = Attempt::Retried;
}

/// One in-flight request plus the bookkeeping the refresh logic needs.
#[derive(Debug)]
pub struct PendingRequest<S: AttemptState> {
    request: HttpRequest,
    /// Refresh generation observed right before the request was sent.
    generation: u64,
    _attempt: PhantomData<S>,
}

impl PendingRequest<Initial> {
    pub fn new(request: HttpRequest, generation: u64) -> Self {
        Self {
            request,
            generation,
            _attempt: PhantomData,
        }
    }

    /// Turns the first attempt into its one and only retry, carrying the
    /// freshly issued token.
    pub fn into_retry(self, token: &AccessToken) -> PendingRequest<Retried> {
        let mut request = self.request;
        if let Ok(mut value) = HeaderValue::from_str(&token.bearer()) {
            value.set_sensitive(true);
            request.set_header(AUTHORIZATION, value);
        }
        PendingRequest {
            request,
            generation: self.generation,
            _attempt: PhantomData,
        }
    }
}

impl<S: AttemptState> PendingRequest<S> {
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut HttpRequest {
        &mut self.request
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn attempt(&self) -> Attempt {
        S::ATTEMPT
    }
}
