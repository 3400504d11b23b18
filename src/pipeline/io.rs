//! Host I/O primitives handed to content handlers.
//!
//! # Responsibilities
//! - Drain and discard an unread request body
//! - Accept the response header, then body chunks, in that order
//! - Turn what was written into an axum `Response`
//!
//! # Design Decisions
//! - The writer buffers in memory; nothing reaches the socket until the
//!   phase finishes, so a late failure can still become a clean 500
//! - HEAD requests are header-only: `send_header` says so and the body step
//!   is skipped by the caller

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use futures_util::StreamExt;
use thiserror::Error;

/// Failures reported by host primitives.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to drain request body: {0}")]
    Drain(String),

    #[error("response header already sent")]
    HeaderAlreadySent,

    #[error("response header not sent")]
    HeaderNotSent,

    #[error("response body already finished")]
    BodyFinished,
}

/// Discards whatever request body the client sent.
#[async_trait]
pub trait BodyDrain: Send {
    /// Read the body to the end, returning the number of bytes dropped.
    async fn discard(&mut self) -> Result<u64, HostError>;
}

/// Outcome of a successful header emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderState {
    /// Body chunks may follow.
    Body,
    /// The request only wants headers (HEAD).
    HeaderOnly,
}

/// Response status line and entity headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub content_length: u64,
}

/// Ordered header-then-body output channel.
pub trait ResponseWriter: Send {
    fn send_header(&mut self, head: ResponseHead) -> Result<HeaderState, HostError>;

    /// Append a body chunk. `last` closes the body.
    fn output(&mut self, chunk: Bytes, last: bool) -> Result<(), HostError>;
}

/// Request body as received from axum.
pub struct RequestBody {
    inner: Option<Body>,
}

impl RequestBody {
    pub fn new(body: Body) -> Self {
        Self { inner: Some(body) }
    }

    pub fn empty() -> Self {
        Self { inner: None }
    }
}

#[async_trait]
impl BodyDrain for RequestBody {
    async fn discard(&mut self) -> Result<u64, HostError> {
        let Some(body) = self.inner.take() else {
            return Ok(0);
        };

        let mut stream = body.into_data_stream();
        let mut drained = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| HostError::Drain(e.to_string()))?;
            drained += chunk.len() as u64;
        }

        Ok(drained)
    }
}

/// In-memory response writer.
#[derive(Debug, Default)]
pub struct BufferedResponse {
    header_only: bool,
    head: Option<ResponseHead>,
    chunks: Vec<Bytes>,
    finished: bool,
}

impl BufferedResponse {
    pub fn new(header_only: bool) -> Self {
        Self {
            header_only,
            ..Self::default()
        }
    }

    pub fn head(&self) -> Option<&ResponseHead> {
        self.head.as_ref()
    }

    /// Body bytes written so far.
    pub fn body_len(&self) -> usize {
        self.chunks.iter().map(Bytes::len).sum()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Build the response. Without a header this is a bare 500.
    pub fn into_response(self) -> Response {
        let Some(head) = self.head else {
            return special_response(StatusCode::INTERNAL_SERVER_ERROR);
        };

        let body = match self.chunks.len() {
            0 => Body::empty(),
            1 => Body::from(self.chunks.into_iter().next().unwrap_or_default()),
            _ => Body::from(self.chunks.concat()),
        };

        let mut response = Response::new(body);
        *response.status_mut() = head.status;
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(head.content_type));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(head.content_length));
        response
    }
}

impl ResponseWriter for BufferedResponse {
    fn send_header(&mut self, head: ResponseHead) -> Result<HeaderState, HostError> {
        if self.head.is_some() {
            return Err(HostError::HeaderAlreadySent);
        }
        self.head = Some(head);

        if self.header_only {
            self.finished = true;
            Ok(HeaderState::HeaderOnly)
        } else {
            Ok(HeaderState::Body)
        }
    }

    fn output(&mut self, chunk: Bytes, last: bool) -> Result<(), HostError> {
        if self.head.is_none() {
            return Err(HostError::HeaderNotSent);
        }
        if self.finished {
            return Err(HostError::BodyFinished);
        }

        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
        self.finished = last;
        Ok(())
    }
}

/// Status-only response with an empty body.
pub fn special_response(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(0u64));
    response
}
