//! An in-memory [`Transport`] for tests.
//!
//! [`ScriptedTransport`] replays queued responses per `(method, path)` and
//! records every request exactly as it reached the wire, headers
//! included. That makes it possible to assert what the pipeline actually
//! sent (`Authorization: Bearer T2` on the retry) without a server.
//!
//! Queues are consumed front to back; the last entry of a queue is sticky
//! and answers every later request to that route. Unscripted routes get
//! a `404`.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use http::{Method, StatusCode};

use crate::{HttpRequest, HttpResponse, Transport, TransportError};

type Route = (Method, String);

#[derive(Debug, Clone)]
struct Reply {
    outcome: Result<HttpResponse, TransportError>,
    delay: Option<Duration>,
}

/// Scripted transport: queued replies in, recorded requests out.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<Route, VecDeque<Reply>>>,
    sent: Mutex<Vec<HttpRequest>>,
    cookies: Mutex<HashMap<String, String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response with a JSON (or any text) body.
    pub fn respond(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: &str,
    ) -> &Self {
        self.push(method, path, Ok(response(status, body)), None)
    }

    /// Queues a response that is only delivered after `delay`.
    ///
    /// Useful for holding a refresh open while other requests pile up.
    pub fn respond_after(
        &self,
        delay: Duration,
        method: Method,
        path: &str,
        status: u16,
        body: &str,
    ) -> &Self {
        self.push(method, path, Ok(response(status, body)), Some(delay))
    }

    /// Queues a transport-level failure (no HTTP response at all).
    pub fn fail(
        &self,
        method: Method,
        path: &str,
        error: TransportError,
    ) -> &Self {
        self.push(method, path, Err(error), None)
    }

    /// Pretends the server set a cookie.
    pub fn set_cookie(&self, name: &str, value: &str) -> &Self {
        lock(&self.cookies).insert(name.to_string(), value.to_string());
        self
    }

    pub fn clear_cookie(&self, name: &str) -> &Self {
        lock(&self.cookies).remove(name);
        self
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.sent).clone()
    }

    /// Requests sent to `path`, in order.
    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        lock(&self.sent)
            .iter()
            .filter(|req| req.path == path)
            .cloned()
            .collect()
    }

    /// Number of requests sent to `path`.
    pub fn count(&self, path: &str) -> usize {
        lock(&self.sent).iter().filter(|req| req.path == path).count()
    }

    fn push(
        &self,
        method: Method,
        path: &str,
        outcome: Result<HttpResponse, TransportError>,
        delay: Option<Duration>,
    ) -> &Self {
        lock(&self.routes)
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Reply { outcome, delay });
        self
    }

    fn next_reply(&self, request: &HttpRequest) -> Reply {
        let mut routes = lock(&self.routes);
        let queue = routes.get_mut(&(request.method.clone(), request.path.clone()));
        match queue {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(not_scripted),
            Some(queue) => queue.front().cloned().unwrap_or_else(not_scripted),
            None => not_scripted(),
        }
    }
}

fn response(status: u16, body: &str) -> HttpResponse {
    let status =
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::new(status, body.as_bytes().to_vec())
}

fn not_scripted() -> Reply {
    Reply {
        outcome: Ok(response(404, r#"{"message":"no scripted response"}"#)),
        delay: None,
    }
}

impl Transport for ScriptedTransport {
    async fn send(
        &self,
        request: &HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        lock(&self.sent).push(request.clone());
        let reply = self.next_reply(request);
        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }
        reply.outcome
    }

    fn cookie(&self, name: &str) -> Option<String> {
        lock(&self.cookies)
            .get(name)
            .filter(|value| !value.is_empty())
            .cloned()
    }
}
