//! Log sink port - best-effort diagnostics for internal failures

use std::error::Error;

use crate::domain::Context;

/// Records the technical cause of a failure that callers only see as a
/// generic domain error
///
/// Implementations must not panic and have no way to fail the caller.
pub trait LogSink: Send + Sync {
    fn error(&self, ctx: &Context, err: &(dyn Error + 'static));
}
