//! Descriptors for what an MCP server advertises.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A tool advertised by the server. Names follow `<app-prefix>_<action>`,
/// e.g. `nc_notes_create_note`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: serde_json::Value,
}

/// Known Nextcloud app prefixes.
const APP_PREFIXES: [&str; 4] = ["nc_calendar", "nc_contacts", "nc_notes", "nc_webdav"];

fn tool_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z][a-z0-9]*(_[a-z0-9]+)+$").expect("tool name pattern is valid")
    })
}

impl ToolDescriptor {
    /// The app namespace of this tool.
    ///
    /// Known Nextcloud apps resolve to their full prefix (`nc_notes`); other
    /// names fall back to everything before the last `_`.
    pub fn app_prefix(&self) -> Option<&str> {
        if let Some(prefix) = APP_PREFIXES.iter().find(|prefix| {
            self.name
                .strip_prefix(**prefix)
                .is_some_and(|rest| rest.starts_with('_'))
        }) {
            return Some(*prefix);
        }
        self.name.rsplit_once('_').map(|(prefix, _)| prefix)
    }

    pub fn follows_naming_convention(&self) -> bool {
        tool_name_pattern().is_match(&self.name)
    }

    /// Argument names listed under `required` in the input schema.
    pub fn required_arguments(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(|value| value.as_array())
            .map(|items| items.iter().filter_map(|item| item.as_str()).collect())
            .unwrap_or_default()
    }
}

/// A read-only, URI-addressable item exposed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: Option<String>,
    pub mime_type: Option<String>,
}

/// Keep tools whose name starts with `prefix`, e.g. `nc_webdav`.
pub fn tools_with_prefix<'a>(tools: &'a [ToolDescriptor], prefix: &str) -> Vec<&'a ToolDescriptor> {
    tools
        .iter()
        .filter(|tool| tool.name.starts_with(prefix))
        .collect()
}
