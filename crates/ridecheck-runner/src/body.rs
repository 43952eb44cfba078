//! Captured responses with a replayable body
//!
//! The network body is a single-consume stream. [`ReplayableBody`] reads it
//! to completion on first access and hands out the cached bytes afterwards,
//! so every assertion sees the full body without re-fetching it.

use std::cell::{OnceCell, RefCell};
use std::io::Read;

use reqwest::header::{HeaderMap, HeaderValue};

/// Failure to read the response body from the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot read response body: {0}")]
pub struct BodyError(String);

/// Read-once, cache-forever body.
pub struct ReplayableBody {
    source: RefCell<Option<Box<dyn Read>>>,
    buffer: OnceCell<Result<Vec<u8>, BodyError>>,
}

impl ReplayableBody {
    /// Wrap a stream. Nothing is read until the first call to [`Self::bytes`].
    pub fn new(source: impl Read + 'static) -> Self {
        Self {
            source: RefCell::new(Some(Box::new(source))),
            buffer: OnceCell::new(),
        }
    }

    /// Body that is already in memory.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let buffer = OnceCell::new();
        let _ = buffer.set(Ok(bytes.into()));
        Self {
            source: RefCell::new(None),
            buffer,
        }
    }

    /// Full body. The first call drains the stream; later calls replay it.
    ///
    /// # Errors
    ///
    /// Returns the read error of the first call, on every call.
    pub fn bytes(&self) -> Result<&[u8], BodyError> {
        self.buffer
            .get_or_init(|| {
                let Some(mut source) = self.source.borrow_mut().take() else {
                    return Err(BodyError("body stream already consumed".into()));
                };
                let mut buf = Vec::new();
                source
                    .read_to_end(&mut buf)
                    .map(|_| buf)
                    .map_err(|e| BodyError(e.to_string()))
            })
            .as_deref()
            .map_err(Clone::clone)
    }

    /// Whether the stream has been read (or was never a stream).
    #[must_use]
    pub fn is_buffered(&self) -> bool {
        self.buffer.get().is_some()
    }
}

impl std::fmt::Debug for ReplayableBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.buffer.get() {
            Some(Ok(bytes)) => write!(f, "ReplayableBody({} bytes)", bytes.len()),
            Some(Err(e)) => write!(f, "ReplayableBody(error: {e})"),
            None => f.write_str("ReplayableBody(unread)"),
        }
    }
}

/// A response as seen by the assertions: status, headers, replayable body.
#[derive(Debug)]
pub struct CapturedResponse {
    status: u16,
    headers: HeaderMap,
    body: ReplayableBody,
}

impl CapturedResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderMap, body: ReplayableBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Response with an in-memory body, e.g. for test doubles.
    #[must_use]
    pub fn from_bytes(status: u16, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, headers, ReplayableBody::from_bytes(body))
    }

    /// JSON response with `Content-Type: application/json`.
    #[must_use]
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self::from_bytes(status, headers, body.to_string())
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text, `None` if absent or not visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// See [`ReplayableBody::bytes`].
    ///
    /// # Errors
    ///
    /// Returns error if the body stream failed to read.
    pub fn body(&self) -> Result<&[u8], BodyError> {
        self.body.bytes()
    }
}
