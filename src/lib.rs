//! ncprobe: MCP client and smoke-test harness for Nextcloud MCP servers.
//!
//! Talks to a Nextcloud MCP server over streamable HTTP, lists what it
//! advertises, invokes tools, and runs an end-to-end smoke suite.
//!
//! # Quick Start
//!
//! ```no_run
//! use ncprobe::prelude::*;
//! use serde_json::json;
//!
//! # async fn example() -> ncprobe::error::Result<()> {
//! let config = ProbeConfig::builder().base_url("http://127.0.0.1:8001").build();
//! let mut session = McpSession::connect(&config).await?;
//! let tools = session.list_tools().await?;
//! println!("{} tools", tools.len());
//!
//! let result = session
//!     .call_tool("nc_webdav_list_directory", json!({"path": "/"}))
//!     .await?;
//! println!("{}", result.text());
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod health;
pub mod mcp;
pub mod prelude;
pub mod smoke;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
