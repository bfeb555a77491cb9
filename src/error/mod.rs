//! Error types for ncprobe.

pub mod classify;

pub use classify::{classify_tool_error, ErrorCategory, ToolErrorKind};

use thiserror::Error;

/// Primary error type for all ncprobe operations.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },
}

impl ProbeError {
    /// Create an API error from a status code and body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Connection(_) => ErrorCategory::Connection,
            Self::Network(e) if e.is_connect() => ErrorCategory::Connection,
            Self::Network(e) if e.is_timeout() => ErrorCategory::Timeout,
            Self::Network(_) => ErrorCategory::Network,
            Self::Protocol(_) => ErrorCategory::Protocol,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) | Self::ConfigFile(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::InvalidState(_) | Self::InvalidArgument(_) => ErrorCategory::Usage,
            Self::ToolExecution { .. } => ErrorCategory::ToolExecution,
            Self::Io(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether the server could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        self.category() == ErrorCategory::Connection
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_formats_status_and_message() {
        let err = ProbeError::api(503, "not ready");
        assert_eq!(err.to_string(), "API error (status 503): not ready");
        assert_eq!(err.category(), ErrorCategory::Server);
    }

    #[test]
    fn api_auth_statuses_map_to_authentication() {
        assert_eq!(
            ProbeError::api(401, "nope").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            ProbeError::api(403, "nope").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(ProbeError::api(404, "nope").category(), ErrorCategory::Api);
    }

    #[test]
    fn connection_errors_are_unreachable() {
        assert!(ProbeError::Connection("refused".into()).is_unreachable());
        assert!(!ProbeError::Protocol("bad handshake".into()).is_unreachable());
    }

    #[test]
    fn usage_errors_share_a_category() {
        assert_eq!(
            ProbeError::InvalidState("closed".into()).category(),
            ErrorCategory::Usage
        );
        assert_eq!(
            ProbeError::InvalidArgument("array".into()).category(),
            ErrorCategory::Usage
        );
    }

    #[test]
    fn serde_errors_convert_via_from() {
        let serde_error = serde_json::from_str::<serde_json::Value>("{not-json}").unwrap_err();
        let err: ProbeError = serde_error.into();
        assert_eq!(err.category(), ErrorCategory::Serialization);
    }
}
