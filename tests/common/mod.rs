//! Shared test helpers: a wiremock stand-in for a Nextcloud MCP server.

#![allow(dead_code)]

use std::collections::HashSet;

use ncprobe::config::ProbeConfig;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const CREATED_NOTE_ID: u64 = 42;

/// How the mock answers tool calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotesBehavior {
    /// Notes app installed: create returns an id, lookups of unknown ids fail.
    Installed,
    /// Every notes call fails as if the app were missing.
    Missing,
    /// Create succeeds without returning an id.
    NoId,
    /// Create succeeds but delete reports an error.
    DeleteFails,
    /// Delete claims success but the note stays readable.
    Sticky,
}

pub struct MockNextcloud {
    pub tool_count: usize,
    pub resources: usize,
    pub notes: NotesBehavior,
}

impl Default for MockNextcloud {
    fn default() -> Self {
        Self {
            tool_count: 60,
            resources: 2,
            notes: NotesBehavior::Installed,
        }
    }
}

const NAMED_TOOLS: [&str; 9] = [
    "nc_notes_search_notes",
    "nc_notes_create_note",
    "nc_notes_get_note",
    "nc_notes_delete_note",
    "nc_calendar_list_calendars",
    "nc_calendar_get_upcoming_events",
    "nc_contacts_list_addressbooks",
    "nc_webdav_list_directory",
    "nc_webdav_read_file",
];

impl MockNextcloud {
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = NAMED_TOOLS.iter().map(|n| n.to_string()).collect();
        let mut i = 0;
        while names.len() < self.tool_count {
            names.push(format!("nc_tables_action_{i}"));
            i += 1;
        }
        names.truncate(self.tool_count);
        names
    }

    /// Start a server with `/mcp` and `/health/ready` mounted.
    pub async fn start(self) -> MockServer {
        let server = MockServer::start().await;
        self.mount(&server).await;
        Mock::given(method("GET"))
            .and(path("/health/ready"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ready",
                "checks": { "nextcloud_reachable": "ok" }
            })))
            .mount(&server)
            .await;
        server
    }

    pub async fn mount(self, server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/mcp"))
            .respond_with(ResponseTemplate::new(405))
            .mount(server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/mcp"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/mcp"))
            .respond_with(self.handler())
            .mount(server)
            .await;
    }

    fn handler(self) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync {
        let tools = self.tool_names();
        let resources = self.resources;
        let notes = self.notes;

        move |request: &Request| {
            let body: Value = request.body_json().unwrap_or_else(|_| json!({}));
            let rpc_method = body.get("method").and_then(Value::as_str).unwrap_or_default();
            let id = body.get("id").cloned().unwrap_or_else(|| json!(1));

            let result = match rpc_method {
                "initialize" => json!({
                    "protocolVersion": "2025-03-26",
                    "capabilities": {
                        "tools": { "listChanged": false },
                        "resources": { "listChanged": false }
                    },
                    "serverInfo": { "name": "Nextcloud MCP", "version": "0.9.0" }
                }),
                "notifications/initialized" => return ResponseTemplate::new(202),
                "tools/list" => json!({
                    "tools": tools
                        .iter()
                        .map(|name| json!({
                            "name": name,
                            "description": format!("{name} tool"),
                            "inputSchema": { "type": "object", "properties": {} }
                        }))
                        .collect::<Vec<_>>()
                }),
                "resources/list" => json!({
                    "resources": (0..resources)
                        .map(|i| json!({
                            "uri": format!("nc://notes/{i}"),
                            "name": format!("note-{i}"),
                            "mimeType": "application/json"
                        }))
                        .collect::<Vec<_>>()
                }),
                "tools/call" => {
                    let params = body.get("params").cloned().unwrap_or_else(|| json!({}));
                    let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
                    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
                    call_tool(notes, name, &arguments)
                }
                _ => Value::Null,
            };

            ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": result
            }))
        }
    }
}

fn text_result(text: String, is_error: bool) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error
    })
}

fn call_tool(notes: NotesBehavior, name: &str, arguments: &Value) -> Value {
    if name.starts_with("nc_notes_") && notes == NotesBehavior::Missing {
        return text_result("Error: Notes app is not enabled".into(), true);
    }

    match name {
        "nc_notes_create_note" => {
            if arguments.get("title").is_none() {
                return text_result("Error: title is required".into(), true);
            }
            if notes == NotesBehavior::NoId {
                return text_result(json!({"title": arguments["title"]}).to_string(), false);
            }
            text_result(
                json!({"id": CREATED_NOTE_ID, "title": arguments["title"], "etag": "abc"}).to_string(),
                false,
            )
        }
        "nc_notes_delete_note" if notes == NotesBehavior::DeleteFails => {
            text_result("Error: note is locked".into(), true)
        }
        "nc_notes_get_note"
            if notes == NotesBehavior::Sticky
                && arguments.get("note_id") == Some(&json!(CREATED_NOTE_ID)) =>
        {
            text_result(
                json!({"id": CREATED_NOTE_ID, "title": "Test Note from MCP"}).to_string(),
                false,
            )
        }
        "nc_notes_delete_note" => text_result(
            json!({"status_code": 200, "message": "Note deleted"}).to_string(),
            false,
        ),
        "nc_notes_get_note" => {
            let note_id = arguments.get("note_id").cloned().unwrap_or(Value::Null);
            text_result(format!("Error: Note {note_id} not found"), true)
        }
        "nc_notes_search_notes" => text_result(json!({"results": []}).to_string(), false),
        "nc_webdav_list_directory" => text_result(
            json!({"path": arguments.get("path"), "files": [{"name": "Documents"}]}).to_string(),
            false,
        ),
        other if other.starts_with("nc_") => text_result(json!({"items": []}).to_string(), false),
        other => text_result(format!("Error: unknown tool {other}"), true),
    }
}

pub fn config_for(server: &MockServer) -> ProbeConfig {
    ProbeConfig::builder()
        .base_url(server.uri())
        .timeout_secs(5)
        .build()
}

/// A base URL nothing listens on.
pub fn unreachable_config() -> ProbeConfig {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    ProbeConfig::builder()
        .base_url(format!("http://127.0.0.1:{port}"))
        .timeout_secs(2)
        .build()
}

pub fn request_methods(requests: &[Request]) -> Vec<String> {
    requests
        .iter()
        .filter_map(|request| {
            request
                .body_json::<Value>()
                .ok()
                .and_then(|body| body.get("method").and_then(Value::as_str).map(str::to_string))
        })
        .collect()
}

pub fn called_tools(requests: &[Request]) -> Vec<String> {
    requests
        .iter()
        .filter_map(|request| request.body_json::<Value>().ok())
        .filter(|body| body.get("method").and_then(Value::as_str) == Some("tools/call"))
        .filter_map(|body| body["params"]["name"].as_str().map(str::to_string))
        .collect()
}

pub fn distinct(items: &[String]) -> HashSet<&str> {
    items.iter().map(String::as_str).collect()
}
