//! Serialising refresh calls.
//!
//! When several requests hit a `401` at about the same time, they all
//! hold the same expired token. With [`RefreshPolicy::Coalesce`] only the
//! first of them calls the refresh endpoint; the others wait on the gate
//! and then reuse its outcome.
//!
//! The gate keeps a generation counter that moves forward after every
//! completed refresh. A request records the generation right before it
//! is sent. When its `401` comes back:
//!
//! - generation unchanged → nobody refreshed since we sent; refresh now.
//! - generation moved → a refresh finished after we sent; reuse it, as
//!   long as the store still holds what that refresh left behind.
//!
//! A login or logout between that refresh and our `401` changes the
//! store, and the old outcome no longer describes the session. The
//! request then gets its own refresh.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use crate::{AccessToken, ApiError, CredentialStore, RefreshPolicy};

/// Result of one refresh step.
///
/// A refresh that fails is an ordinary outcome here, not an early return:
/// the caller branches on it to decide between retrying and giving up.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Refreshed(AccessToken),
    Failed(ApiError),
}

impl RefreshOutcome {
    /// `true` if `store` is still in the state this outcome left it in:
    /// holding the refreshed token, or empty after a failure.
    fn is_current(&self, store: &CredentialStore) -> bool {
        match self {
            Self::Refreshed(token) => store.get().as_ref() == Some(token),
            Self::Failed(_) => !store.is_set(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct RefreshGate {
    generation: AtomicU64,
    last: Mutex<Option<RefreshOutcome>>,
}

impl RefreshGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The number of refreshes completed so far.
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Runs `refresh`, or reuses a newer outcome, according to `policy`.
    ///
    /// `observed` is the generation the failed request was sent under.
    /// `store` is checked before a newer outcome is reused.
    pub(crate) async fn run<F, Fut>(
        &self,
        policy: RefreshPolicy,
        observed: u64,
        store: &CredentialStore,
        refresh: F,
    ) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome>,
    {
        if policy == RefreshPolicy::PerRequest {
            let outcome = refresh().await;
            *self.last.lock().await = Some(outcome.clone());
            self.generation.fetch_add(1, Ordering::AcqRel);
            return outcome;
        }

        let mut last = self.last.lock().await;
        if self.generation() != observed {
            match last.as_ref() {
                Some(outcome) if outcome.is_current(store) => {
                    tracing::debug!(observed, "reusing newer refresh outcome");
                    return outcome.clone();
                }
                Some(_) => {
                    tracing::debug!(observed, "credentials changed since last refresh");
                }
                None => {}
            }
        }

        let outcome = refresh().await;
        *last = Some(outcome.clone());
        // Bumped while the lock is held, after `last` is written: anyone
        // who sees the new generation also sees its outcome.
        self.generation.fetch_add(1, Ordering::AcqRel);
        outcome
    }
}
