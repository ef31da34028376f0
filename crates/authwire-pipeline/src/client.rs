//! `ApiClient`: the request pipeline callers talk to.
//!
//! ```text
//! caller ──→ RequestAuthenticator ──→ Transport ──→ ResponseInterceptor ──→ caller
//!                     ▲                                   │
//!                     └──────── refresh / retry ──────────┘
//! ```

use std::sync::Arc;

use authwire_protocol::codec;
use authwire_transport::{HttpRequest, HttpResponse, Transport, TransportError};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::attempt::PendingRequest;
use crate::{
    ApiError, ClientConfig, CredentialStore, RequestAuthenticator, ResponseInterceptor,
};

/// Decorate-then-send, shared by first attempts, refreshes and retries.
pub(crate) struct Dispatcher<T> {
    transport: T,
    authenticator: RequestAuthenticator,
}

impl<T: Transport> Dispatcher<T> {
    pub(crate) async fn dispatch(
        &self,
        request: &mut HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        self.authenticator.decorate(request, &self.transport);
        self.transport.send(request).await
    }
}

struct Inner<T> {
    dispatcher: Dispatcher<T>,
    interceptor: ResponseInterceptor,
    store: CredentialStore,
    config: ClientConfig,
}

/// An HTTP client that authenticates every request and transparently
/// recovers from expired access tokens.
///
/// Cloning is cheap and every clone shares the same transport, token
/// store and refresh gate.
pub struct ApiClient<T: Transport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> ApiClient<T> {
    /// Creates a client with its own, empty credential store.
    ///
    /// # Errors
    /// Returns [`ApiError::InvalidConfig`] if the config can't be used.
    pub fn new(transport: T, config: ClientConfig) -> Result<Self, ApiError> {
        Self::with_store(transport, config, CredentialStore::new())
    }

    /// Creates a client around an existing credential store.
    pub fn with_store(
        transport: T,
        config: ClientConfig,
        store: CredentialStore,
    ) -> Result<Self, ApiError> {
        let authenticator =
            RequestAuthenticator::new(store.clone(), &config.csrf_cookie, &config.csrf_header)?;
        let interceptor = ResponseInterceptor::new(
            store.clone(),
            config.endpoints.clone(),
            config.refresh_policy,
        );

        Ok(Self {
            inner: Arc::new(Inner {
                dispatcher: Dispatcher {
                    transport,
                    authenticator,
                },
                interceptor,
                store,
                config,
            }),
        })
    }

    /// The credential store this client reads and writes.
    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.store
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn transport(&self) -> &T {
        &self.inner.dispatcher.transport
    }

    /// Sends a request through the full pipeline.
    ///
    /// Resolves with the response for any 2xx answer, including one that
    /// only succeeded after a refresh and retry.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let inner = &*self.inner;
        let mut pending = PendingRequest::new(request, inner.interceptor.generation());

        tracing::debug!(
            method = %pending.request().method,
            path = %pending.request().path,
            "sending request"
        );

        let outcome = inner.dispatcher.dispatch(pending.request_mut()).await;
        inner
            .interceptor
            .intercept(&inner.dispatcher, pending, outcome)
            .await
    }

    pub async fn get(&self, path: &str) -> Result<HttpResponse, ApiError> {
        self.send(HttpRequest::get(path)).await
    }

    pub async fn delete(&self, path: &str) -> Result<HttpResponse, ApiError> {
        self.send(HttpRequest::delete(path)).await
    }

    /// `POST` without a body.
    pub async fn post(&self, path: &str) -> Result<HttpResponse, ApiError> {
        self.send(HttpRequest::post(path)).await
    }

    pub async fn post_json<B>(&self, path: &str, body: &B) -> Result<HttpResponse, ApiError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let body = codec::encode(body)?;
        self.send(HttpRequest::post(path).with_json_body(body)).await
    }

    pub async fn put_json<B>(&self, path: &str, body: &B) -> Result<HttpResponse, ApiError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let body = codec::encode(body)?;
        self.send(HttpRequest::put(path).with_json_body(body)).await
    }

    /// `GET` and decode the `data` of the answer's envelope.
    pub async fn get_data<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let response = self.get(path).await?;
        Ok(codec::decode_data(&response.body)?)
    }

    /// `POST` a JSON body and decode the `data` of the answer's envelope.
    pub async fn post_data<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.post_json(path, body).await?;
        Ok(codec::decode_data(&response.body)?)
    }
}
