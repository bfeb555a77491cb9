//! Tool call results.

use rmcp::model::{CallToolResult, Content, ResourceContents};
use serde_json::Value;

use crate::error::{classify_tool_error, ProbeError, ToolErrorKind};

/// Outcome of a single `tools/call` exchange.
///
/// A tool either succeeds with a JSON payload or fails with human-readable
/// text; there are no partial results.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCallResult {
    Success {
        /// Structured content, or the first text entry parsed as JSON.
        payload: Value,
        /// First text entry as sent by the server.
        text: Option<String>,
    },
    Error {
        /// First text entry; empty when the server sent no content.
        message: String,
    },
}

impl ToolCallResult {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Success { payload, .. } => Some(payload),
            Self::Error { .. } => None,
        }
    }

    /// The text the server sent: the error message or the success text.
    pub fn text(&self) -> &str {
        match self {
            Self::Success { text, .. } => text.as_deref().unwrap_or_default(),
            Self::Error { message } => message,
        }
    }

    /// Failure kind inferred from the error text; `None` on success.
    pub fn error_kind(&self) -> Option<ToolErrorKind> {
        match self {
            Self::Error { message } => Some(classify_tool_error(message)),
            Self::Success { .. } => None,
        }
    }

    /// Look up a top-level field of the success payload, e.g. a created `id`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload().and_then(|payload| payload.get(key))
    }

    /// Turn an error result into [`ProbeError::ToolExecution`].
    pub fn into_payload(self, tool_name: &str) -> Result<Value, ProbeError> {
        match self {
            Self::Success { payload, .. } => Ok(payload),
            Self::Error { message } => Err(ProbeError::ToolExecution {
                tool_name: tool_name.to_string(),
                message,
            }),
        }
    }
}

impl From<CallToolResult> for ToolCallResult {
    fn from(result: CallToolResult) -> Self {
        let text = first_text(&result.content);

        if result.is_error.unwrap_or(false) {
            return Self::Error {
                message: text.unwrap_or_default(),
            };
        }

        let payload = match (result.structured_content, text.as_deref()) {
            (Some(structured), _) => structured,
            (None, Some(raw)) => {
                serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
            }
            (None, None) => Value::Null,
        };

        Self::Success { payload, text }
    }
}

fn first_text(content: &[Content]) -> Option<String> {
    content.iter().find_map(|item| {
        if let Some(text) = item.as_text() {
            return Some(text.text.clone());
        }
        match &item.as_resource()?.resource {
            ResourceContents::TextResourceContents { text, .. } => Some(text.clone()),
            _ => None,
        }
    })
}
