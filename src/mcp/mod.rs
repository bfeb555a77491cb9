//! Model Context Protocol (MCP) session, discovery and tool results.

pub mod client;
pub mod result;
pub mod schema;
pub mod transport;

pub use client::{McpSession, ServerIdentity, SessionState};
pub use result::ToolCallResult;
pub use schema::{tools_with_prefix, ResourceDescriptor, ToolDescriptor};
pub use transport::{McpTransport, StreamableHttpTransport};
