//! HTTP transport abstraction.

use std::future::Future;

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// An HTTP response, reduced to the parts the bridge protocol looks at.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// The declared `Content-Type` header, verbatim.
    pub content_type: Option<String>,
    pub body: String,
}

/// Trait for the HTTP calls the bridge protocol performs.
///
/// This trait abstracts the transport so the protocol logic can be driven
/// against scripted responses in tests. [`ReqwestTransport`] is the
/// production implementation; bridges only speak plain HTTP on the local
/// network.
pub trait HttpTransport: Send + Sync {
    /// Fetch a URL.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse>> + Send;

    /// POST a body to a URL.
    fn post(&self, url: &str, body: String) -> impl Future<Output = Result<HttpResponse>> + Send;

    /// PUT a body to a URL.
    fn put(&self, url: &str, body: String) -> impl Future<Output = Result<HttpResponse>> + Send;
}

/// HTTP transport backed by a shared [`reqwest::Client`].
#[derive(Debug, Default, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read(action: &str, response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        let body = response
            .text()
            .await
            .map_err(|err| Error::http(action, err))?;

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| Error::http("get", err))?;
        Self::read("get", response).await
    }

    async fn post(&self, url: &str, body: String) -> Result<HttpResponse> {
        let response = self
            .client
            .post(url)
            .body(body)
            .send()
            .await
            .map_err(|err| Error::http("post", err))?;
        Self::read("post", response).await
    }

    async fn put(&self, url: &str, body: String) -> Result<HttpResponse> {
        let response = self
            .client
            .put(url)
            .body(body)
            .send()
            .await
            .map_err(|err| Error::http("put", err))?;
        Self::read("put", response).await
    }
}
