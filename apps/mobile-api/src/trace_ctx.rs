//! Task-local trace id for the request being served.
//!
//! `RequestTrace` opens the scope; error rendering and security logging
//! read it without threading the id through every signature.

use std::future::Future;

use tokio::task_local;

/// Returned when no request scope is active.
pub const UNKNOWN_TRACE_ID: &str = "unknown";

task_local! {
    static TRACE_ID: String;
}

/// Trace id of the current request, or `"unknown"` outside a request.
pub fn trace_id() -> String {
    current().unwrap_or_else(|| UNKNOWN_TRACE_ID.to_string())
}

/// Trace id of the current request, if a scope is active.
pub fn current() -> Option<String> {
    TRACE_ID.try_with(|id| id.clone()).ok()
}

/// Run `future` with `trace_id` visible to [`trace_id`].
pub async fn with_trace_id<F, R>(trace_id: String, future: F) -> R
where
    F: Future<Output = R>,
{
    TRACE_ID.scope(trace_id, future).await
}
