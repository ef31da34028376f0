//! Post-receive handling: token capture and refresh-and-retry.
//!
//! Every response passes through [`ResponseInterceptor`] before the caller
//! sees it. Per logical request the flow is:
//!
//! ```text
//!   SENT ──→ OK
//!     │
//!     └──→ FAILED ──(401, initial attempt, not login/register/refresh)──→ REFRESHING
//!                                                                            │
//!            ┌────────────────────────┬──────────────────────────────────────┤
//!            ▼                        ▼                                      ▼
//!       RETRIED-OK             RETRIED-FAILED                         REFRESH-FAILED
//! ```
//!
//! No state is visited twice: the retry is a `PendingRequest<Retried>`,
//! and the code handling it has no path back into `REFRESHING`.

use authwire_protocol::codec::{access_token_in, decode_data, error_message};
use authwire_protocol::{EndpointPaths, ProtocolError, RefreshPayload};
use authwire_transport::{HttpRequest, HttpResponse, StatusCode, Transport, TransportError};

use crate::attempt::{Initial, PendingRequest, Retried};
use crate::client::Dispatcher;
use crate::refresh::{RefreshGate, RefreshOutcome};
use crate::{AccessToken, ApiError, CredentialStore, RefreshPolicy};

/// Inspects responses, captures issued tokens, and recovers expired ones.
#[derive(Debug)]
pub struct ResponseInterceptor {
    store: CredentialStore,
    endpoints: EndpointPaths,
    policy: RefreshPolicy,
    gate: RefreshGate,
}

impl ResponseInterceptor {
    pub fn new(
        store: CredentialStore,
        endpoints: EndpointPaths,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            store,
            endpoints,
            policy,
            gate: RefreshGate::new(),
        }
    }

    /// Refresh generation to stamp on a request about to be sent.
    pub(crate) fn generation(&self) -> u64 {
        self.gate.generation()
    }

    /// Stores the access token a successful response carries, if any.
    ///
    /// This is how login, register and refresh answers reach the store
    /// without their callers doing anything. Returns `true` if a token
    /// was captured.
    pub fn capture_token(&self, response: &HttpResponse) -> bool {
        match access_token_in(&response.body) {
            Some(token) => {
                self.store.set(Some(AccessToken::new(token)));
                tracing::debug!("access token captured from response");
                true
            }
            None => false,
        }
    }

    /// `true` if a failed first attempt may be recovered by a refresh.
    ///
    /// All of these must hold: the answer is `401`, the request is not
    /// itself a refresh, and it is not a login or register (a `401` there
    /// means the credentials are wrong, not that a token expired). That it
    /// has not been retried yet is guaranteed by the argument type.
    pub fn is_recoverable(
        &self,
        pending: &PendingRequest<Initial>,
        response: &HttpResponse,
    ) -> bool {
        let path = pending.request().path.as_str();
        response.status == StatusCode::UNAUTHORIZED
            && !self.endpoints.is_refresh_request(path)
            && !self.endpoints.is_auth_request(path)
    }

    /// Turns a non-2xx answer into the error the caller sees.
    pub fn rejection(&self, request: &HttpRequest, response: &HttpResponse) -> ApiError {
        let status = response.status;
        let message = error_message(&response.body);
        let path = request.path.as_str();

        if self.endpoints.is_refresh_request(path) {
            ApiError::SessionExpired {
                status,
                message: message.unwrap_or_else(|| "Session refresh failed".to_string()),
            }
        } else if self.endpoints.is_auth_request(path) && status.is_client_error() {
            let fallback = if path.contains(self.endpoints.register.as_str()) {
                "Registration failed"
            } else {
                "Login failed"
            };
            ApiError::CredentialRejected {
                status,
                message: message.unwrap_or_else(|| fallback.to_string()),
            }
        } else {
            ApiError::Status {
                status,
                message: message.unwrap_or_else(|| "Request failed".to_string()),
            }
        }
    }

    /// Settles the outcome of a first attempt, refreshing and retrying
    /// once if that can recover it.
    pub(crate) async fn intercept<T: Transport>(
        &self,
        dispatcher: &Dispatcher<T>,
        pending: PendingRequest<Initial>,
        outcome: Result<HttpResponse, TransportError>,
    ) -> Result<HttpResponse, ApiError> {
        let response = outcome?;

        if response.is_success() {
            self.capture_token(&response);
            return Ok(response);
        }

        if !self.is_recoverable(&pending, &response) {
            return Err(self.rejection(pending.request(), &response));
        }

        tracing::debug!(
            path = %pending.request().path,
            attempt = %pending.attempt(),
            "unauthorized, attempting refresh"
        );

        let refresh = self
            .gate
            .run(self.policy, pending.generation(), &self.store, move || {
                self.refresh(dispatcher)
            })
            .await;

        match refresh {
            RefreshOutcome::Refreshed(token) => {
                let mut retry = pending.into_retry(&token);
                let outcome = dispatcher.dispatch(retry.request_mut()).await;
                self.settle_retry(&retry, outcome)
            }
            RefreshOutcome::Failed(err) => Err(err),
        }
    }

    /// Exchanges the session cookie for a new access token.
    ///
    /// Any failure clears the store: the client is logged out locally
    /// and later requests go out without a stale bearer.
    async fn refresh<T: Transport>(&self, dispatcher: &Dispatcher<T>) -> RefreshOutcome {
        let mut request = HttpRequest::post(self.endpoints.refresh.clone());

        let outcome = match dispatcher.dispatch(&mut request).await {
            Ok(response) if response.is_success() => match refreshed_token(&response.body) {
                Ok(token) => {
                    self.store.set(Some(token.clone()));
                    tracing::info!("access token refreshed");
                    RefreshOutcome::Refreshed(token)
                }
                Err(err) => RefreshOutcome::Failed(err),
            },
            Ok(response) => RefreshOutcome::Failed(self.rejection(&request, &response)),
            Err(err) => RefreshOutcome::Failed(err.into()),
        };

        if let RefreshOutcome::Failed(err) = &outcome {
            self.store.clear();
            tracing::warn!(error = %err, "refresh failed, credentials cleared");
        }
        outcome
    }

    /// Settles the outcome of the one retry. There is no refresh here.
    fn settle_retry(
        &self,
        retry: &PendingRequest<Retried>,
        outcome: Result<HttpResponse, TransportError>,
    ) -> Result<HttpResponse, ApiError> {
        let response = outcome?;

        if response.is_success() {
            self.capture_token(&response);
            return Ok(response);
        }

        if response.status == StatusCode::UNAUTHORIZED {
            self.store.clear();
            tracing::warn!(
                path = %retry.request().path,
                attempt = %retry.attempt(),
                "still unauthorized after refresh, credentials cleared"
            );
            return Err(ApiError::SessionExpired {
                status: response.status,
                message: error_message(&response.body)
                    .unwrap_or_else(|| "Session expired".to_string()),
            });
        }

        Err(self.rejection(retry.request(), &response))
    }
}

/// Reads the new access token out of a successful refresh answer.
fn refreshed_token(body: &[u8]) -> Result<AccessToken, ApiError> {
    let payload: RefreshPayload = decode_data(body)?;
    payload
        .access_token
        .filter(|token| !token.is_empty())
        .map(AccessToken::new)
        .ok_or_else(|| ProtocolError::MissingField("accessToken").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interceptor(store: &CredentialStore) -> ResponseInterceptor {
        ResponseInterceptor::new(
            store.clone(),
            EndpointPaths::default(),
            RefreshPolicy::Coalesce,
        )
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse::new(StatusCode::from_u16(status).unwrap(), body.as_bytes().to_vec())
    }

    fn pending(path: &str) -> PendingRequest<Initial> {
        PendingRequest::new(HttpRequest::get(path), 0)
    }

    // =====================================================================
    // capture_token()
    // =====================================================================

    #[test]
    fn test_capture_token_stores_issued_token() {
        let store = CredentialStore::new();
        let captured = interceptor(&store)
            .capture_token(&response(200, r#"{"data":{"accessToken":"T9"}}"#));

        assert!(captured);
        assert_eq!(store.get(), Some(AccessToken::new("T9")));
    }

    #[test]
    fn test_capture_token_without_token_leaves_store_alone() {
        let store = CredentialStore::new();
        store.set(Some("T1".into()));

        let captured =
            interceptor(&store).capture_token(&response(200, r#"{"data":{"orders":[]}}"#));

        assert!(!captured);
        assert_eq!(store.get(), Some(AccessToken::new("T1")));
    }

    // =====================================================================
    // refreshed_token()
    // =====================================================================

    #[test]
    fn test_refreshed_token_reads_refresh_payload() {
        let token = refreshed_token(br#"{"data":{"accessToken":"T2"}}"#).unwrap();
        assert_eq!(token, AccessToken::new("T2"));
    }

    #[test]
    fn test_refreshed_token_missing_or_empty_is_missing_field() {
        for body in [r#"{"data":{}}"#, r#"{"data":{"accessToken":""}}"#] {
            let err = refreshed_token(body.as_bytes()).unwrap_err();
            assert!(
                matches!(err, ApiError::Protocol(ProtocolError::MissingField("accessToken"))),
                "{body} should have no token"
            );
        }
    }

    #[test]
    fn test_refreshed_token_unreadable_body_is_decode_error() {
        let err = refreshed_token(b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, ApiError::Protocol(ProtocolError::Decode(_))));
    }

    // =====================================================================
    // is_recoverable()
    // =====================================================================

    #[test]
    fn test_is_recoverable_plain_401_is_true() {
        let store = CredentialStore::new();
        assert!(interceptor(&store).is_recoverable(&pending("/orders"), &response(401, "")));
    }

    #[test]
    fn test_is_recoverable_other_statuses_are_false() {
        let store = CredentialStore::new();
        let icpt = interceptor(&store);
        for status in [400, 403, 404, 500, 503] {
            assert!(
                !icpt.is_recoverable(&pending("/orders"), &response(status, "")),
                "status {status} must not trigger a refresh"
            );
        }
    }

    #[test]
    fn test_is_recoverable_auth_and_refresh_requests_are_false() {
        let store = CredentialStore::new();
        let icpt = interceptor(&store);
        for path in ["/auth/login", "/auth/register", "/auth/refresh"] {
            assert!(
                !icpt.is_recoverable(&pending(path), &response(401, "")),
                "{path} must not trigger a refresh"
            );
        }
    }

    #[test]
    fn test_is_recoverable_session_probe_is_true() {
        // `/auth/me` is neither auth nor refresh, so an expired token on
        // the startup probe is recovered like any API call.
        let store = CredentialStore::new();
        assert!(interceptor(&store).is_recoverable(&pending("/auth/me"), &response(401, "")));
    }

    // =====================================================================
    // rejection()
    // =====================================================================

    #[test]
    fn test_rejection_login_401_is_credential_rejected_with_server_message() {
        let store = CredentialStore::new();
        let err = interceptor(&store).rejection(
            &HttpRequest::post("/auth/login"),
            &response(401, r#"{"message":"Invalid credentials"}"#),
        );
        assert!(matches!(
            err,
            ApiError::CredentialRejected { status, ref message }
                if status == StatusCode::UNAUTHORIZED && message == "Invalid credentials"
        ));
    }

    #[test]
    fn test_rejection_register_without_message_uses_fallback() {
        let store = CredentialStore::new();
        let err = interceptor(&store)
            .rejection(&HttpRequest::post("/auth/register"), &response(409, ""));
        assert!(matches!(
            err,
            ApiError::CredentialRejected { ref message, .. } if message == "Registration failed"
        ));
    }

    #[test]
    fn test_rejection_login_server_error_is_plain_status() {
        let store = CredentialStore::new();
        let err = interceptor(&store)
            .rejection(&HttpRequest::post("/auth/login"), &response(502, "Bad Gateway"));
        assert!(matches!(
            err,
            ApiError::Status { status, ref message }
                if status == StatusCode::BAD_GATEWAY && message == "Request failed"
        ));
    }

    #[test]
    fn test_rejection_refresh_failure_is_session_expired() {
        let store = CredentialStore::new();
        let err = interceptor(&store)
            .rejection(&HttpRequest::post("/auth/refresh"), &response(401, ""));
        assert!(matches!(
            err,
            ApiError::SessionExpired { ref message, .. } if message == "Session refresh failed"
        ));
    }

    #[test]
    fn test_rejection_ordinary_request_passes_status_through() {
        let store = CredentialStore::new();
        let err = interceptor(&store).rejection(
            &HttpRequest::get("/orders"),
            &response(404, r#"{"message":"Order not found"}"#),
        );
        assert!(matches!(
            err,
            ApiError::Status { status, ref message }
                if status == StatusCode::NOT_FOUND && message == "Order not found"
        ));
    }
}
