//! Greeting content handler.
//!
//! # Responsibilities
//! - Drain the request body the handler never reads
//! - Decide eligibility (configured name, GET/HEAD)
//! - Compose the greeting body, counting the visit when enabled
//!
//! # Design Decisions
//! - Produces a `HandlerOutcome` value; never touches headers
//! - Bodies over `MAX_BODY_LEN` are rejected, not truncated, and do not
//!   consume a visit

use std::sync::Arc;

use axum::http::Method;

use crate::greeting::conf::RouteConfig;
use crate::greeting::counter::VisitCounters;
use crate::observability::metrics;
use crate::pipeline::BodyDrain;
use crate::routing::Location;

/// Largest body the handler will produce, in bytes.
pub const MAX_BODY_LEN: usize = 1024;

/// Result of handling one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// The location has no greeting configured.
    Declined,
    MethodNotAllowed,
    InternalError,
    /// Respond with `body`; `method` is GET or HEAD.
    Serve { body: String, method: Method },
}

/// Body composition failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyTooLong {
    pub len: usize,
    pub max: usize,
}

/// Builds greeting bodies for matched locations.
#[derive(Debug, Clone)]
pub struct ContentHandler {
    counters: Arc<VisitCounters>,
    max_body_len: usize,
}

impl ContentHandler {
    pub fn new(counters: Arc<VisitCounters>) -> Self {
        Self {
            counters,
            max_body_len: MAX_BODY_LEN,
        }
    }

    /// Override the body limit.
    pub fn with_max_body_len(mut self, max_body_len: usize) -> Self {
        self.max_body_len = max_body_len;
        self
    }

    pub fn counters(&self) -> &VisitCounters {
        &self.counters
    }

    /// Handle one request against its location.
    pub async fn handle(&self, method: &Method, location: &Location, body: &mut dyn BodyDrain) -> HandlerOutcome {
        if let Err(e) = body.discard().await {
            tracing::error!(location = %location.name, error = %e, "Failed to discard request body");
            return HandlerOutcome::InternalError;
        }

        let conf = location.conf();
        if !conf.is_serving() {
            tracing::debug!(location = %location.name, "Greeting name is empty, declining");
            return HandlerOutcome::Declined;
        }

        if *method != Method::GET && *method != Method::HEAD {
            return HandlerOutcome::MethodNotAllowed;
        }

        match self.compose(&location.name, conf) {
            Ok(body) => HandlerOutcome::Serve {
                body,
                method: method.clone(),
            },
            Err(BodyTooLong { len, max }) => {
                tracing::error!(
                    location = %location.name,
                    body_len = len,
                    max_body_len = max,
                    "Greeting body exceeds buffer size"
                );
                HandlerOutcome::InternalError
            }
        }
    }

    /// Compose the greeting for `conf`, counting the visit if enabled.
    pub fn compose(&self, location: &str, conf: &RouteConfig) -> Result<String, BodyTooLong> {
        let max = self.max_body_len;

        if !conf.counts_visits() {
            let body = format!("Hi {}, welcome!", conf.greeting_name);
            return if body.len() <= max {
                Ok(body)
            } else {
                Err(BodyTooLong { len: body.len(), max })
            };
        }

        let counter = self.counters.counter_for(location);
        let mut body = String::new();
        let visits = counter.increment_if(|next| {
            body = format!(
                "Hi {}, you've visited this page {} times.",
                conf.greeting_name, next
            );
            body.len() <= max
        });

        match visits {
            Some(visits) => {
                metrics::record_visit(location);
                tracing::debug!(location, visits, "Visit counted");
                Ok(body)
            }
            None => Err(BodyTooLong { len: body.len(), max }),
        }
    }
}
