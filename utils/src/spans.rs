//! Pre-built [`tracing::Span`] constructors for verification operations.
//!
//! Consistent span names and field sets make it easy to filter and correlate
//! traces for a single request across the HTTP layer and the service.

use std::fmt::Display;

use tracing::{info_span, Span};

/// Span covering one inbound HTTP request.
pub fn http_request_span(method: &str, path: &str) -> Span {
    info_span!("http_request", method = %method, path = %path)
}

/// Span covering a document submission by `user`.
pub fn submit_span(user: &dyn Display, role: &dyn Display) -> Span {
    info_span!("submit", user_id = %user, role = %role)
}

/// Span covering a reviewer decision.
pub fn review_span(
    request_id: &dyn Display,
    reviewer: &dyn Display,
    decision: &dyn Display,
) -> Span {
    info_span!(
        "review",
        request_id = %request_id,
        reviewer = %reviewer,
        decision = %decision
    )
}
