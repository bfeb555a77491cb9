//! Per-request deadline for MCP calls.

use std::future::Future;
use std::time::Duration;

use crate::error::ProbeError;

/// Bound an MCP request by the session's `request_timeout`.
///
/// `McpSession` routes discovery and tool calls through this when a timeout
/// is configured; an elapsed deadline becomes [`ProbeError::Timeout`] in ms.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, ProbeError>>,
) -> Result<T, ProbeError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Timeout(duration.as_millis() as u64)),
    }
}
