//! Turns a `HandlerOutcome` into protocol output.
//!
//! # Responsibilities
//! - Map outcomes to status codes
//! - Emit `Content-Type`/`Content-Length`, then the body as one final chunk
//! - Keep HEAD responses header-only with the GET content length
//!
//! # Design Decisions
//! - Header emission and body emission are two ordered steps; a failed or
//!   header-only header step skips the body

use axum::{body::Bytes, http::StatusCode};

use crate::greeting::handler::HandlerOutcome;
use crate::pipeline::{HeaderState, ProtocolResult, ResponseHead, ResponseWriter};

pub const CONTENT_TYPE: &str = "text/html";

/// Writes greeting outcomes through the host's output primitives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseAssembler;

impl ResponseAssembler {
    pub fn assemble(&self, outcome: HandlerOutcome, writer: &mut dyn ResponseWriter) -> ProtocolResult {
        let body = match outcome {
            HandlerOutcome::Declined => return ProtocolResult::Declined,
            HandlerOutcome::MethodNotAllowed => return ProtocolResult::Special(StatusCode::METHOD_NOT_ALLOWED),
            HandlerOutcome::InternalError => return ProtocolResult::Special(StatusCode::INTERNAL_SERVER_ERROR),
            HandlerOutcome::Serve { body, .. } => body,
        };

        let head = ResponseHead {
            status: StatusCode::OK,
            content_type: CONTENT_TYPE,
            content_length: body.len() as u64,
        };

        match writer.send_header(head) {
            Ok(HeaderState::Body) => {}
            Ok(HeaderState::HeaderOnly) => return ProtocolResult::Done,
            Err(e) => {
                tracing::error!(error = %e, "Failed to send response header");
                return ProtocolResult::Special(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }

        match writer.output(Bytes::from(body), true) {
            Ok(()) => ProtocolResult::Done,
            Err(e) => {
                tracing::error!(error = %e, "Failed to send response body");
                ProtocolResult::Special(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
