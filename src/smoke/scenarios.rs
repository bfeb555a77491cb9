//! The scenario catalogue run against a live Nextcloud MCP server.

use serde_json::json;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use super::{ScenarioOutcome, SuiteOptions};
use crate::config::ProbeConfig;
use crate::error::classify::mentions_any;
use crate::error::Result;
use crate::health::{self, NEXTCLOUD_REACHABLE};
use crate::mcp::{McpSession, ToolCallResult};

/// Note id that no server is expected to hold.
pub const MISSING_NOTE_ID: u64 = 999_999_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Scenario {
    HealthReady,
    ListTools,
    ListResources,
    NotesSearchNotes,
    NotesCreateAndDeleteNote,
    CalendarListCalendars,
    CalendarGetUpcomingEvents,
    ContactsListAddressbooks,
    WebdavListDirectory,
    InvalidNoteId,
    MissingRequiredParameter,
}

impl Scenario {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Whether the scenario talks MCP (and so needs its own session).
    pub fn needs_session(self) -> bool {
        !matches!(self, Self::HealthReady)
    }

    pub(super) async fn run_health(config: &ProbeConfig) -> Result<ScenarioOutcome> {
        let report = health::check_ready(config).await?;
        if report.status != "ready" {
            return Ok(ScenarioOutcome::failed(format!(
                "status is '{}', expected 'ready'",
                report.status
            )));
        }
        match report.check(NEXTCLOUD_REACHABLE) {
            Some("ok") => Ok(ScenarioOutcome::passed()),
            Some(other) => Ok(ScenarioOutcome::failed(format!(
                "{NEXTCLOUD_REACHABLE} is '{other}'"
            ))),
            None => Ok(ScenarioOutcome::failed(format!(
                "{NEXTCLOUD_REACHABLE} check missing"
            ))),
        }
    }

    pub(super) async fn run_in_session(
        self,
        session: &mut McpSession,
        options: &SuiteOptions,
    ) -> Result<ScenarioOutcome> {
        match self {
            Self::HealthReady => Ok(ScenarioOutcome::skipped("health check runs without a session")),
            Self::ListTools => {
                let tools = session.list_tools().await?;
                if tools.len() > options.min_tools {
                    Ok(ScenarioOutcome::passed_with(format!("{} tools", tools.len())))
                } else {
                    Ok(ScenarioOutcome::failed(format!(
                        "expected more than {} tools, got {}",
                        options.min_tools,
                        tools.len()
                    )))
                }
            }
            Self::ListResources => {
                let resources = session.list_resources().await?;
                if resources.is_empty() {
                    Ok(ScenarioOutcome::failed("server exposes no resources"))
                } else {
                    Ok(ScenarioOutcome::passed_with(format!(
                        "{} resources",
                        resources.len()
                    )))
                }
            }
            Self::NotesSearchNotes => {
                answered(session, "nc_notes_search_notes", json!({"query": "test"})).await
            }
            Self::NotesCreateAndDeleteNote => create_and_delete_note(session).await,
            Self::CalendarListCalendars => {
                answered(session, "nc_calendar_list_calendars", json!({})).await
            }
            Self::CalendarGetUpcomingEvents => {
                answered(session, "nc_calendar_get_upcoming_events", json!({"limit": 5})).await
            }
            Self::ContactsListAddressbooks => {
                answered(session, "nc_contacts_list_addressbooks", json!({})).await
            }
            Self::WebdavListDirectory => {
                answered(session, "nc_webdav_list_directory", json!({"path": "/"})).await
            }
            Self::InvalidNoteId => {
                let result = session
                    .call_tool("nc_notes_get_note", json!({"note_id": MISSING_NOTE_ID}))
                    .await?;
                Ok(expect_text(&result, &["error", "not found"]))
            }
            Self::MissingRequiredParameter => {
                let result = session
                    .call_tool("nc_notes_create_note", json!({"content": "No title provided"}))
                    .await?;
                if !result.is_error() {
                    return Ok(ScenarioOutcome::failed(
                        "create without a title was accepted",
                    ));
                }
                Ok(expect_text(&result, &["error", "required"]))
            }
        }
    }
}

/// Passes as long as the server answered, noting a tool-level error.
async fn answered(
    session: &mut McpSession,
    tool: &str,
    arguments: serde_json::Value,
) -> Result<ScenarioOutcome> {
    let result = session.call_tool(tool, arguments).await?;
    Ok(match result {
        ToolCallResult::Error { message } => {
            ScenarioOutcome::passed_with(format!("tool reported: {message}"))
        }
        ToolCallResult::Success { .. } => ScenarioOutcome::passed(),
    })
}

fn expect_text(result: &ToolCallResult, needles: &[&str]) -> ScenarioOutcome {
    let text = result.text();
    if mentions_any(text, needles) {
        ScenarioOutcome::passed()
    } else {
        ScenarioOutcome::failed(format!(
            "expected text mentioning {}, got '{text}'",
            needles.join(" or ")
        ))
    }
}

async fn create_and_delete_note(session: &mut McpSession) -> Result<ScenarioOutcome> {
    let title = format!("Test Note from MCP {}", Uuid::new_v4().simple());
    let created = session
        .call_tool(
            "nc_notes_create_note",
            json!({
                "title": title,
                "content": "This is a test note created by MCP integration tests.",
                "category": "Test",
            }),
        )
        .await?;

    if let ToolCallResult::Error { message } = &created {
        return Ok(ScenarioOutcome::skipped(format!(
            "Notes app may not be installed: {message}"
        )));
    }

    let Some(note_id) = created.field("id").filter(|id| !id.is_null()).cloned() else {
        return Ok(ScenarioOutcome::failed(format!(
            "expected note id in response: {}",
            created.text()
        )));
    };

    let deleted = session
        .call_tool("nc_notes_delete_note", json!({"note_id": note_id}))
        .await?;
    if let ToolCallResult::Error { message } = deleted {
        return Ok(ScenarioOutcome::failed(format!(
            "note {note_id} was created but not deleted: {message}"
        )));
    }

    let lookup = session
        .call_tool("nc_notes_get_note", json!({"note_id": note_id}))
        .await?;
    if !lookup.is_error() {
        return Ok(ScenarioOutcome::failed(format!(
            "note {note_id} is still readable after delete"
        )));
    }

    Ok(ScenarioOutcome::passed_with(format!("note {note_id}")))
}
