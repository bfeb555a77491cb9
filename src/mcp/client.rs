//! MCP session for talking to a Nextcloud MCP server.

use std::collections::HashSet;
use std::time::Duration;

use rmcp::{
    model::{CallToolRequestParams, ClientInfo, JsonObject, ProtocolVersion},
    service::{ClientInitializeError, ServiceError},
};

use super::result::ToolCallResult;
use super::schema::{ResourceDescriptor, ToolDescriptor};
use super::transport::{McpRunningService, McpTransport, StreamableHttpTransport};
use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};
use crate::util::timeout::with_timeout;

const CLIENT_NAME: &str = "ncprobe";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    Closed,
}

/// Server identity negotiated during `initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    pub name: String,
    pub version: String,
    pub protocol_version: String,
    pub instructions: Option<String>,
}

/// A handshake-negotiated MCP session.
///
/// Only [`initialize`](Self::initialize) is valid before the handshake and
/// nothing is valid after [`close`](Self::close). Dropping an open session
/// cancels the underlying rmcp service.
pub struct McpSession {
    transport: Box<dyn McpTransport>,
    service: Option<McpRunningService>,
    state: SessionState,
    request_timeout: Option<Duration>,
}

impl std::fmt::Debug for McpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpSession")
            .field("state", &self.state)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl McpSession {
    /// Create an uninitialized session over the given transport.
    pub fn new(transport: Box<dyn McpTransport>) -> Self {
        Self {
            transport,
            service: None,
            state: SessionState::Uninitialized,
            request_timeout: None,
        }
    }

    /// Build a streamable-HTTP session from config (not yet initialized).
    pub fn from_config(config: &ProbeConfig) -> Result<Self> {
        let transport = StreamableHttpTransport::from_config(config)?;
        Ok(Self::new(Box::new(transport)).with_request_timeout(config.request_timeout()))
    }

    /// Build from config and complete the handshake.
    pub async fn connect(config: &ProbeConfig) -> Result<Self> {
        let mut session = Self::from_config(config)?;
        session.initialize().await?;
        Ok(session)
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == SessionState::Initialized
    }

    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    /// Perform the `initialize` handshake. Repeated calls are no-ops.
    pub async fn initialize(&mut self) -> Result<()> {
        match self.state {
            SessionState::Initialized => return Ok(()),
            SessionState::Closed => {
                return Err(ProbeError::InvalidState(
                    "cannot initialize a closed MCP session".into(),
                ))
            }
            SessionState::Uninitialized => {}
        }

        let service = self.connect_with_protocol_fallback().await?;
        if let Some(info) = service.peer_info() {
            tracing::debug!(
                endpoint = self.transport.endpoint(),
                server = %info.server_info.name,
                version = %info.server_info.version,
                "MCP session initialized"
            );
        }
        self.service = Some(service);
        self.state = SessionState::Initialized;
        Ok(())
    }

    /// Identity the server reported during the handshake.
    pub fn server_info(&self) -> Result<Option<ServerIdentity>> {
        let service = self.service_ref()?;
        Ok(service.peer_info().map(|info| ServerIdentity {
            name: info.server_info.name.clone(),
            version: info.server_info.version.clone(),
            protocol_version: serde_json::to_value(&info.protocol_version)
                .ok()
                .and_then(|value| value.as_str().map(str::to_string))
                .unwrap_or_default(),
            instructions: info.instructions.clone(),
        }))
    }

    /// List every tool the server advertises, in server order.
    pub async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>> {
        let timeout = self.request_timeout;
        let service = self.service_ref()?;

        let tools = run_request(timeout, "list_tools", async {
            match service.list_all_tools().await {
                Err(ServiceError::UnexpectedResponse) => {
                    service.list_tools(None).await.map(|page| page.tools)
                }
                other => other,
            }
        })
        .await?;

        let mut seen = HashSet::new();
        let mut descriptors = Vec::with_capacity(tools.len());
        for tool in tools {
            let descriptor = map_tool_descriptor(tool);
            if !seen.insert(descriptor.name.clone()) {
                tracing::warn!(tool = %descriptor.name, "server advertised duplicate tool name");
                continue;
            }
            descriptors.push(descriptor);
        }
        tracing::debug!(count = descriptors.len(), "listed MCP tools");
        Ok(descriptors)
    }

    /// List every resource the server exposes, in server order.
    pub async fn list_resources(&mut self) -> Result<Vec<ResourceDescriptor>> {
        let timeout = self.request_timeout;
        let service = self.service_ref()?;

        let resources = run_request(timeout, "list_resources", async {
            match service.list_all_resources().await {
                Err(ServiceError::UnexpectedResponse) => {
                    service.list_resources(None).await.map(|page| page.resources)
                }
                other => other,
            }
        })
        .await?;

        tracing::debug!(count = resources.len(), "listed MCP resources");
        Ok(resources
            .into_iter()
            .map(|resource| ResourceDescriptor {
                uri: resource.raw.uri,
                name: resource.raw.name,
                description: resource.raw.description,
                mime_type: resource.raw.mime_type,
            })
            .collect())
    }

    /// Invoke a tool and wait for its single response.
    ///
    /// A tool-level failure (`isError`) is returned as
    /// [`ToolCallResult::Error`]; `Err` means the exchange itself failed.
    pub async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolCallResult> {
        let timeout = self.request_timeout;
        let service = self.service_ref()?;
        let arguments = coerce_tool_arguments(arguments)?;

        tracing::debug!(tool = name, "calling MCP tool");
        let result = run_request(
            timeout,
            "call_tool",
            service.call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_owned().into(),
                arguments,
                task: None,
            }),
        )
        .await?;

        let result = ToolCallResult::from(result);
        if result.is_error() {
            tracing::debug!(tool = name, message = result.text(), "MCP tool returned an error");
        }
        Ok(result)
    }

    /// Release the connection. Idempotent.
    pub async fn close(&mut self) -> Result<()> {
        self.state = SessionState::Closed;
        let Some(service) = self.service.take() else {
            return Ok(());
        };

        match service.cancel().await {
            Ok(reason) => {
                tracing::debug!(endpoint = self.transport.endpoint(), ?reason, "MCP session closed");
                Ok(())
            }
            Err(error) => {
                tracing::warn!(error = %error, "MCP session did not shut down cleanly");
                Err(ProbeError::Connection(format!(
                    "MCP session shutdown failed: {error}"
                )))
            }
        }
    }

    fn service_ref(&self) -> Result<&McpRunningService> {
        match self.state {
            SessionState::Initialized => {}
            SessionState::Closed => {
                return Err(ProbeError::InvalidState("MCP session is closed".into()))
            }
            SessionState::Uninitialized => {
                return Err(ProbeError::InvalidState(
                    "MCP session must be initialized first".into(),
                ))
            }
        }
        self.service
            .as_ref()
            .ok_or_else(|| ProbeError::InvalidState("MCP session has no running service".into()))
    }

    async fn connect_with_protocol_fallback(&mut self) -> Result<McpRunningService> {
        match self.transport.connect(client_info(ProtocolVersion::LATEST)).await {
            Ok(service) => return Ok(service),
            Err(error) if should_retry_protocol_fallback(&error) => {
                tracing::debug!(error = %error, "retrying MCP handshake with 2024-11-05");
            }
            Err(error) => return Err(map_client_initialize_error(error)),
        }

        self.transport
            .connect(client_info(ProtocolVersion::V_2024_11_05))
            .await
            .map_err(map_client_initialize_error)
    }
}

fn client_info(protocol_version: ProtocolVersion) -> ClientInfo {
    let mut info = ClientInfo {
        protocol_version,
        ..Default::default()
    };
    info.client_info.name = CLIENT_NAME.into();
    info.client_info.version = env!("CARGO_PKG_VERSION").into();
    info
}

async fn run_request<T>(
    timeout: Option<Duration>,
    context: &'static str,
    request: impl std::future::Future<Output = std::result::Result<T, ServiceError>>,
) -> Result<T> {
    let request = async move { request.await.map_err(|e| map_service_error(context, e)) };
    match timeout {
        Some(duration) => with_timeout(duration, request).await,
        None => request.await,
    }
}

fn map_tool_descriptor(tool: rmcp::model::Tool) -> ToolDescriptor {
    ToolDescriptor {
        name: tool.name.to_string(),
        description: tool.description.map(|d| d.to_string()),
        input_schema: serde_json::Value::Object((*tool.input_schema).clone()),
    }
}

fn coerce_tool_arguments(value: serde_json::Value) -> Result<Option<JsonObject>> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(map) => Ok(Some(map)),
        serde_json::Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            let parsed: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| {
                ProbeError::InvalidArgument(format!("MCP tool arguments must be valid JSON: {e}"))
            })?;
            coerce_tool_arguments(parsed)
        }
        other => Err(ProbeError::InvalidArgument(format!(
            "MCP tool arguments must be a JSON object; got {other}"
        ))),
    }
}

fn should_retry_protocol_fallback(error: &ClientInitializeError) -> bool {
    match error {
        ClientInitializeError::JsonRpcError(error) => {
            let message = error.message.to_ascii_lowercase();
            message.contains("protocol") && message.contains("version")
        }
        _ => false,
    }
}

fn map_client_initialize_error(error: ClientInitializeError) -> ProbeError {
    match error {
        ClientInitializeError::ConnectionClosed(context) => {
            ProbeError::Connection(format!("MCP initialize connection closed: {context}"))
        }
        ClientInitializeError::TransportError { error, context } => {
            if is_connect_failure(&error) {
                ProbeError::Connection(format!(
                    "MCP initialize could not reach server ({context}): {error}"
                ))
            } else {
                ProbeError::Protocol(format!(
                    "MCP initialize got an unusable response ({context}): {error}"
                ))
            }
        }
        ClientInitializeError::JsonRpcError(error) => ProbeError::Protocol(format!(
            "MCP initialize JSON-RPC error {}: {}",
            error.code.0, error.message
        )),
        ClientInitializeError::Cancelled => {
            ProbeError::Connection("MCP initialize cancelled".into())
        }
        other => ProbeError::Protocol(format!("MCP initialize error: {other}")),
    }
}

/// Whether a transport error means the endpoint was never reached, as
/// opposed to a reply that could not be decoded.
fn is_connect_failure(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(http) = err.downcast_ref::<reqwest::Error>() {
            if http.is_connect() {
                return true;
            }
            if http.is_decode() || http.is_body() || http.is_status() {
                return false;
            }
        }
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::AddrNotAvailable
            ) {
                return true;
            }
        }
        current = err.source();
    }
    // rmcp may flatten the reqwest error into text.
    let rendered = error.to_string().to_ascii_lowercase();
    rendered.contains("error sending request") || rendered.contains("connection refused")
}

fn map_service_error(context: &str, error: ServiceError) -> ProbeError {
    match error {
        ServiceError::McpError(error) => ProbeError::Protocol(format!(
            "{context}: MCP error {}: {}",
            error.code.0, error.message
        )),
        ServiceError::TransportSend(error) => {
            ProbeError::Connection(format!("{context}: MCP transport send failed: {error}"))
        }
        ServiceError::TransportClosed => {
            ProbeError::Connection(format!("{context}: MCP transport closed"))
        }
        ServiceError::UnexpectedResponse => {
            ProbeError::Protocol(format!("{context}: unexpected MCP response"))
        }
        ServiceError::Cancelled { reason } => {
            let suffix = reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default();
            ProbeError::Connection(format!("{context}: MCP request cancelled{suffix}"))
        }
        ServiceError::Timeout { timeout } => ProbeError::Timeout(timeout.as_millis() as u64),
        other => ProbeError::Protocol(format!("{context}: MCP service error: {other}")),
    }
}
