//! Per-call context threaded through every store and log sink call
//!
//! The core never decides a timeout itself. Callers attach a deadline and the
//! adapters honour it; dropping the future is how a call is cancelled.

use std::time::{Duration, Instant};

/// Deadline and operation label for one service call
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    operation: Option<String>,
}

impl Context {
    /// A context with no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().deadline_at(Instant::now() + timeout)
    }

    /// Set an absolute deadline
    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Label the operation, e.g. the CLI command, for log entries
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    /// Time left before the deadline, `None` when there is no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_never_expires() {
        let ctx = Context::background();
        assert!(!ctx.is_expired());
        assert!(ctx.remaining().is_none());
    }

    #[test]
    fn test_past_deadline_is_expired() {
        let ctx = Context::background().deadline_at(Instant::now() - Duration::from_millis(1));
        assert!(ctx.is_expired());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_timeout_in_future() {
        let ctx = Context::with_timeout(Duration::from_secs(60)).with_operation("create");
        assert!(!ctx.is_expired());
        assert!(ctx.remaining().unwrap() > Duration::from_secs(30));
        assert_eq!(ctx.operation(), Some("create"));
    }
}
