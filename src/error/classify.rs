//! Error classification for reporting and tool failures.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Broad error category for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    Connection,
    Protocol,
    Network,
    Authentication,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    Usage,
    ToolExecution,
    Unknown,
}

/// Kind of failure reported by a tool through its error text.
///
/// The server only reports failures as free text, so this is inferred from
/// substrings. Replace with a structured code once the server exposes one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToolErrorKind {
    NotFound,
    MissingArgument,
    Generic,
    Unclassified,
}

/// Infer a [`ToolErrorKind`] from tool error text. Matching is case-insensitive.
///
/// More specific phrases win over the bare word "error", so
/// `"Error: note not found"` is [`ToolErrorKind::NotFound`].
pub fn classify_tool_error(text: &str) -> ToolErrorKind {
    let lower = text.to_lowercase();
    if lower.contains("not found") {
        ToolErrorKind::NotFound
    } else if lower.contains("required") || lower.contains("missing") {
        ToolErrorKind::MissingArgument
    } else if lower.contains("error") {
        ToolErrorKind::Generic
    } else {
        ToolErrorKind::Unclassified
    }
}

/// Case-insensitive check for any of `needles` in `text`.
pub fn mentions_any(text: &str, needles: &[&str]) -> bool {
    let lower = text.to_lowercase();
    needles
        .iter()
        .any(|needle| lower.contains(&needle.to_lowercase()))
}
