//! Greeting content module.
//!
//! # Data Flow
//! ```text
//! Config load:
//!     location directives → conf.rs (compile, validate) → RouteConfig
//!
//! Per request (content phase):
//!     RequestContext
//!     → handler.rs (drain body, eligibility, compose body, count visit)
//!     → HandlerOutcome
//!     → response.rs (status, Content-Type, Content-Length, body)
//!     → ProtocolResult back to the pipeline
//! ```
//!
//! # Design Decisions
//! - Module state (visit counters) is owned here and created once at
//!   startup, not held in globals
//! - Registration adds exactly one content handler

pub mod conf;
pub mod counter;
pub mod handler;
pub mod response;

use std::sync::Arc;

use async_trait::async_trait;

use crate::pipeline::{PhaseHandler, PipelineBuilder, ProtocolResult, RequestContext};

pub use conf::{ConfigError, RouteConfig};
pub use counter::{CounterScope, VisitCounter, VisitCounters};
pub use handler::{ContentHandler, HandlerOutcome, MAX_BODY_LEN};
pub use response::ResponseAssembler;

/// The greeting module as registered into the content phase.
#[derive(Debug, Clone)]
pub struct GreetingModule {
    handler: ContentHandler,
    assembler: ResponseAssembler,
}

impl GreetingModule {
    pub fn new(scope: CounterScope) -> Self {
        Self::with_counters(Arc::new(VisitCounters::new(scope)))
    }

    /// Build around an existing counter table.
    pub fn with_counters(counters: Arc<VisitCounters>) -> Self {
        Self {
            handler: ContentHandler::new(counters),
            assembler: ResponseAssembler,
        }
    }

    pub fn counters(&self) -> &VisitCounters {
        self.handler.counters()
    }

    /// Add this module's content handler to the pipeline.
    pub fn register(self: Arc<Self>, pipeline: PipelineBuilder) -> PipelineBuilder {
        pipeline.content_handler(self)
    }
}

#[async_trait]
impl PhaseHandler for GreetingModule {
    fn name(&self) -> &'static str {
        "greeting"
    }

    async fn handle(&self, ctx: &mut RequestContext) -> ProtocolResult {
        let outcome = self
            .handler
            .handle(&ctx.method, &ctx.location, ctx.body.as_mut())
            .await;
        self.assembler.assemble(outcome, &mut ctx.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Pipeline, RequestBody};
    use crate::routing::Location;
    use axum::{
        body::to_bytes,
        http::{header, Method, StatusCode},
    };

    fn pipeline(module: GreetingModule) -> Pipeline {
        Arc::new(module).register(Pipeline::builder()).build()
    }

    fn request(method: Method, directives: &[&str]) -> RequestContext {
        let conf = RouteConfig::compile(directives).unwrap();
        let location = Arc::new(Location::new("hello", None, "/hello", conf));
        RequestContext::new(method, "/hello", location, Box::new(RequestBody::empty()))
    }

    #[test]
    fn test_registers_one_handler() {
        let pipeline = pipeline(GreetingModule::new(CounterScope::PerRoute));
        assert_eq!(pipeline.len(), 1);
    }

    #[tokio::test]
    async fn test_get_welcome() {
        let pipeline = pipeline(GreetingModule::new(CounterScope::PerRoute));
        let response = pipeline
            .run(request(Method::GET, &["greeting_name jo-qzy"]))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "19");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Hi jo-qzy, welcome!");
    }

    #[tokio::test]
    async fn test_first_counted_visit() {
        let pipeline = pipeline(GreetingModule::new(CounterScope::PerRoute));
        let response = pipeline
            .run(request(Method::GET, &["greeting_name jo-qzy", "enable_counter on"]))
            .await;

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Hi jo-qzy, you've visited this page 1 times.");
    }

    #[tokio::test]
    async fn test_unconfigured_location_falls_through() {
        let pipeline = pipeline(GreetingModule::new(CounterScope::PerRoute));
        let response = pipeline.run(request(Method::GET, &[])).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_post_is_405_without_body() {
        let pipeline = pipeline(GreetingModule::new(CounterScope::PerRoute));
        let response = pipeline
            .run(request(Method::POST, &["greeting_name jo-qzy"]))
            .await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_overflow_is_500_without_body() {
        let counters = Arc::new(VisitCounters::new(CounterScope::PerRoute));
        let pipeline = pipeline(GreetingModule::with_counters(counters.clone()));
        let line = format!("greeting_name {}", "y".repeat(MAX_BODY_LEN));

        let response = pipeline
            .run(request(Method::GET, &[line.as_str(), "enable_counter on"]))
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
        assert_eq!(counters.visits("hello"), 0);
    }
}
