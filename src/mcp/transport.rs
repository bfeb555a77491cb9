//! MCP transport layer.

use async_trait::async_trait;
use rmcp::model::ClientInfo;
use rmcp::service::{ClientInitializeError, DynService, RoleClient, RunningService, ServiceExt};
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use rmcp::transport::StreamableHttpClientTransport;

use crate::config::ProbeConfig;
use crate::error::Result;

pub type DynClientService = Box<dyn DynService<RoleClient>>;
pub type McpRunningService = RunningService<RoleClient, DynClientService>;

/// Opens handshake-negotiated rmcp services.
///
/// Each `connect` call performs a fresh `initialize` exchange.
#[async_trait]
pub trait McpTransport: Send {
    /// Create and initialize a new rmcp running service for this transport.
    async fn connect(
        &mut self,
        client_info: ClientInfo,
    ) -> std::result::Result<McpRunningService, ClientInitializeError>;

    /// Human-readable endpoint used in logs and errors.
    fn endpoint(&self) -> &str;
}

/// Streamable-HTTP transport for remote MCP servers.
pub struct StreamableHttpTransport {
    url: String,
    token: Option<String>,
}

impl StreamableHttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
        }
    }

    /// Build from a validated config, carrying its bearer token.
    pub fn from_config(config: &ProbeConfig) -> Result<Self> {
        let url = config.mcp_url()?;
        let transport = Self::new(url.as_str());
        Ok(match config.token.as_deref() {
            Some(token) => transport.bearer_token(token),
            None => transport,
        })
    }

    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

#[async_trait]
impl McpTransport for StreamableHttpTransport {
    async fn connect(
        &mut self,
        client_info: ClientInfo,
    ) -> std::result::Result<McpRunningService, ClientInitializeError> {
        let mut config = StreamableHttpClientTransportConfig::with_uri(self.url.clone());
        if let Some(token) = &self.token {
            config = config.auth_header(token.clone());
        }
        let transport = StreamableHttpClientTransport::from_config(config);

        tracing::debug!(url = %self.url, auth = self.token.is_some(), "opening MCP session");
        client_info.into_dyn().serve(transport).await
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
