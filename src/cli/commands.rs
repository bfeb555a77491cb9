//! Handlers for the ncprobe subcommands.
//!
//! Each handler returns `Ok(true)` when the command succeeded, `Ok(false)`
//! when it ran but the server reported a failure.

use serde_json::Value;

use super::{CallArgs, SmokeArgs, ToolsArgs};
use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};
use crate::health;
use crate::mcp::{McpSession, ToolDescriptor};
use crate::smoke::{SmokeSuite, SuiteOptions};

/// Handle `ncprobe health`.
pub async fn handle_health(config: &ProbeConfig) -> Result<bool> {
    let report = health::check_ready(config).await?;
    println!("status: {}", report.status);
    for (name, value) in &report.checks {
        println!("  {name}: {value}");
    }
    Ok(report.is_ready())
}

/// Handle `ncprobe tools [--filter]`.
pub async fn handle_tools(config: &ProbeConfig, args: &ToolsArgs) -> Result<bool> {
    let mut session = McpSession::connect(config).await?;
    let listed = session.list_tools().await;
    close_quietly(&mut session).await;

    let tools = listed?;
    let mut shown = 0;
    for tool in tools
        .iter()
        .filter(|tool| args.filter.as_deref().map_or(true, |f| tool.name.contains(f)))
    {
        let marker = if tool.follows_naming_convention() { "" } else { " [!]" };
        match tool.description.as_deref() {
            Some(description) => println!("{}{marker}  {}", tool.name, first_line(description)),
            None => println!("{}{marker}", tool.name),
        }
        shown += 1;
    }
    let off_convention = off_convention(&tools);
    eprintln!("{shown} of {} tools", tools.len());
    if !off_convention.is_empty() {
        eprintln!(
            "[!] {} tool names do not follow <app>_<action>: {}",
            off_convention.len(),
            off_convention.join(", ")
        );
    }
    Ok(true)
}

/// Handle `ncprobe resources`.
pub async fn handle_resources(config: &ProbeConfig) -> Result<bool> {
    let mut session = McpSession::connect(config).await?;
    let listed = session.list_resources().await;
    close_quietly(&mut session).await;

    let resources = listed?;
    for resource in &resources {
        println!("{}  {}", resource.uri, resource.name);
    }
    eprintln!("{} resources", resources.len());
    Ok(true)
}

/// Handle `ncprobe call <TOOL> [--args JSON]`.
pub async fn handle_call(config: &ProbeConfig, args: &CallArgs) -> Result<bool> {
    let arguments = parse_arguments(&args.args)?;

    let mut session = McpSession::connect(config).await?;
    let called = session.call_tool(&args.tool, arguments).await;
    close_quietly(&mut session).await;

    let payload = called?.into_payload(&args.tool)?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(true)
}

/// Handle `ncprobe smoke`.
pub async fn handle_smoke(config: &ProbeConfig, args: &SmokeArgs) -> Result<bool> {
    let options = SuiteOptions {
        only: args.only.clone(),
        min_tools: args.min_tools,
    };
    let report = SmokeSuite::new(config.clone(), options).run().await;

    for record in &report.records {
        let detail = record
            .outcome
            .detail()
            .map(|d| format!(" ({d})"))
            .unwrap_or_default();
        println!(
            "{} {} [{}ms]{detail}",
            record.outcome.label(),
            record.name,
            record.elapsed.as_millis()
        );
    }
    println!("{report}");
    Ok(report.is_success())
}

fn parse_arguments(raw: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ProbeError::InvalidArgument(format!("--args is not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(ProbeError::InvalidArgument(
            "--args must be a JSON object".into(),
        ));
    }
    Ok(value)
}

async fn close_quietly(session: &mut McpSession) {
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "failed to close MCP session");
    }
}

/// Names that break the `<app-prefix>_<action>` convention.
fn off_convention(tools: &[ToolDescriptor]) -> Vec<&str> {
    tools
        .iter()
        .filter(|tool| !tool.follows_naming_convention())
        .map(|tool| tool.name.as_str())
        .collect()
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default().trim()
}
