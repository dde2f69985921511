//! Outbound transport capability.
//!
//! The recorder never talks HTTP itself. It hands a fully built
//! [`OutboundRequest`] to a [`Transport`] and receives either a buffered
//! [`TransportResponse`] or a classified [`TransportError`].

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode, Url, Version};
use std::time::Duration;

use crate::error::TransportError;

/// A single outbound HTTP request with a fully buffered body.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl OutboundRequest {
    /// Create a request with no headers and no body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Attach a body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A completed response: status line, headers and the whole body.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Response with the given status and body and no headers.
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// Request/response exchange with a remote endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request`, giving up after `timeout`.
    async fn execute(
        &self,
        request: &OutboundRequest,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Use a preconfigured client (proxies, TLS roots, ...).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(
        &self,
        request: &OutboundRequest,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .timeout(timeout);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(classify)?;

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(TransportResponse {
            status,
            version,
            headers,
            body: body.to_vec(),
        })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}
