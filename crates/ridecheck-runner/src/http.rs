//! HTTP-call abstraction and its reqwest implementation

use std::time::Duration;

use crate::body::{CapturedResponse, ReplayableBody};
use crate::request::ApiRequest;

/// Connection refused, timeout, DNS failure, ...
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The only network-facing dependency of the orchestrator.
pub trait HttpCall {
    /// Issue `request` and capture the response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response was received.
    fn call(&self, request: &ApiRequest) -> Result<CapturedResponse, TransportError>;
}

impl<T: HttpCall + ?Sized> HttpCall for &T {
    fn call(&self, request: &ApiRequest) -> Result<CapturedResponse, TransportError> {
        (**self).call(request)
    }
}

/// Blocking reqwest client.
pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns error if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError(error_chain(&e)))?;
        Ok(Self { client })
    }
}

impl HttpCall for HttpClient {
    fn call(&self, request: &ApiRequest) -> Result<CapturedResponse, TransportError> {
        let mut req = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            req = req.body(body.to_vec());
        }

        let resp = req.send().map_err(|e| TransportError(error_chain(&e)))?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        // The body stays on the wire until an assertion first reads it
        Ok(CapturedResponse::new(
            status,
            headers,
            ReplayableBody::new(resp),
        ))
    }
}

/// Flatten an error and its sources into "outer: inner: root".
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
