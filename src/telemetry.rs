//! Request correlation for log tracing.
//!
//! Every question gets a short correlation id that is attached to the
//! request span, so all stage logs for one question can be grouped.

use std::time::{Duration, Instant};
use tracing::Span;
use uuid::Uuid;

/// Generate a new correlation ID for request tracing.
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a short correlation ID (8 characters) for compact logging.
pub fn generate_short_correlation_id() -> String {
    generate_correlation_id()[..8].to_string()
}

/// Correlation information carried through one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request.
    pub correlation_id: String,
    /// When the request was received.
    pub start_time: Instant,
    /// Pipeline operation being served.
    pub operation: Option<String>,
}

impl RequestContext {
    /// Create a new request context with a generated correlation ID.
    pub fn new() -> Self {
        Self::with_correlation_id(generate_short_correlation_id())
    }

    /// Create a new request context with a specific correlation ID.
    pub fn with_correlation_id(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            start_time: Instant::now(),
            operation: None,
        }
    }

    /// Set the operation name.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Get the elapsed time since the request started.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Span carrying the correlation id; enter it for the request's lifetime.
    pub fn span(&self) -> Span {
        tracing::info_span!(
            "request",
            correlation_id = %self.correlation_id,
            operation = self.operation.as_deref().unwrap_or("unknown"),
        )
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_ids_are_unique() {
        let a = generate_short_correlation_id();
        let b = generate_short_correlation_id();
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
        assert_eq!(generate_correlation_id().len(), 36);
    }

    #[test]
    fn test_with_operation() {
        let ctx = RequestContext::with_correlation_id("abc12345").with_operation("query");
        assert_eq!(ctx.correlation_id, "abc12345");
        assert_eq!(ctx.operation.as_deref(), Some("query"));
    }

    #[test]
    fn test_elapsed_advances() {
        let ctx = RequestContext::new();
        std::thread::sleep(Duration::from_millis(2));
        assert!(ctx.elapsed() >= Duration::from_millis(2));
    }
}
