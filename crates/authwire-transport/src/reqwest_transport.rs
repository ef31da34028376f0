//! HTTP transport implementation using `reqwest`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};

use crate::{HttpRequest, HttpResponse, Transport, TransportError, cookie_value};

/// A [`Transport`] backed by a `reqwest::Client` with a shared cookie jar.
///
/// The jar receives every `Set-Cookie` the server sends (session cookie,
/// anti-forgery cookie) and replays them on later requests, which is what
/// "send with credentials" means outside a browser.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    jar: Arc<Jar>,
    base_url: Url,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    /// Creates a transport rooted at `base_url` (e.g. `http://host/api/v1`)
    /// with no request timeout.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        Self::with_timeout(base_url, None)
    }

    /// Creates a transport with an optional per-request timeout.
    pub fn with_timeout(
        base_url: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        let jar = Arc::new(Jar::default());

        let mut builder = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(map_reqwest_error)?;

        tracing::debug!(base_url = %base_url, ?timeout, "reqwest transport ready");
        Ok(Self {
            client,
            jar,
            base_url,
        })
    }

    /// The URL every relative request path is appended to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The cookie jar shared with the underlying client.
    pub fn jar(&self) -> &Arc<Jar> {
        &self.jar
    }

    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path)
                .map_err(|e| TransportError::InvalidRequest(e.to_string()));
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))
    }
}

impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: &HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        let url = self.url_for(&request.path)?;

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        tracing::trace!(
            method = %request.method,
            path = %request.path,
            %status,
            "response received"
        );

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }

    fn cookie(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        cookie_value(header.to_str().ok()?, name)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}
