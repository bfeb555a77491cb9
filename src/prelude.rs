//! Convenience re-exports for common use.

pub use crate::config::ProbeConfig;
pub use crate::error::{ErrorCategory, ProbeError, Result, ToolErrorKind};
pub use crate::health::{check_ready, HealthReport};
pub use crate::mcp::{
    McpSession, McpTransport, ResourceDescriptor, SessionState, StreamableHttpTransport,
    ToolCallResult, ToolDescriptor,
};
pub use crate::smoke::{Scenario, ScenarioOutcome, SmokeSuite, SuiteOptions, SuiteReport};
