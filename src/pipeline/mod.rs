//! Request-processing pipeline.
//!
//! # Data Flow
//! ```text
//! axum request
//!     → routing (location lookup)
//!     → RequestContext (method, location, body drain, response writer)
//!     → content phase: handlers in registration order
//!         Declined       → next handler
//!         Special(code)  → status-only response
//!         Done           → buffered header + body
//!     → all declined: default content (404)
//! ```
//!
//! # Design Decisions
//! - The handler list is built once at startup and frozen
//! - Handlers never see axum types beyond `Method`/`StatusCode`

pub mod io;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    http::{Method, StatusCode},
    response::Response,
};

use crate::routing::Location;
use io::special_response;

pub use io::{
    BodyDrain, BufferedResponse, HeaderState, HostError, RequestBody, ResponseHead, ResponseWriter,
};

/// What a content handler tells the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolResult {
    /// Not handled here; try the next handler.
    Declined,
    /// Answer with this status and no body.
    Special(StatusCode),
    /// Header (and body) have been written to the context's writer.
    Done,
}

/// Per-request state passed to content handlers.
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub location: Arc<Location>,
    pub body: Box<dyn BodyDrain>,
    pub writer: BufferedResponse,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>, location: Arc<Location>, body: Box<dyn BodyDrain>) -> Self {
        let header_only = method == Method::HEAD;
        Self {
            method,
            path: path.into(),
            location,
            body,
            writer: BufferedResponse::new(header_only),
        }
    }
}

/// A handler registered into the content phase.
#[async_trait]
pub trait PhaseHandler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    async fn handle(&self, ctx: &mut RequestContext) -> ProtocolResult;
}

/// Collects content-phase handlers during startup.
#[derive(Default)]
pub struct PipelineBuilder {
    content: Vec<Arc<dyn PhaseHandler>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a content handler. Handlers run in the order added.
    pub fn content_handler(mut self, handler: Arc<dyn PhaseHandler>) -> Self {
        tracing::debug!(handler = handler.name(), position = self.content.len(), "Content handler registered");
        self.content.push(handler);
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            content: self.content.into(),
        }
    }
}

/// Frozen handler list.
#[derive(Clone)]
pub struct Pipeline {
    content: Arc<[Arc<dyn PhaseHandler>]>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Number of registered content handlers.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Run the content phase for one request.
    pub async fn run(&self, mut ctx: RequestContext) -> Response {
        for handler in self.content.iter() {
            match handler.handle(&mut ctx).await {
                ProtocolResult::Declined => {
                    tracing::trace!(handler = handler.name(), location = %ctx.location.name, "Handler declined");
                    continue;
                }
                ProtocolResult::Special(status) => return special_response(status),
                ProtocolResult::Done => return ctx.writer.into_response(),
            }
        }

        default_content(&ctx)
    }
}

/// Fallback when no content handler accepted the request.
pub fn default_content(ctx: &RequestContext) -> Response {
    tracing::debug!(location = %ctx.location.name, path = %ctx.path, "No content handler accepted request");
    special_response(StatusCode::NOT_FOUND)
}
