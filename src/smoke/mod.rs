//! End-to-end smoke suite against a running Nextcloud MCP server.
//!
//! Every scenario gets a fresh [`McpSession`] from a [`SessionFactory`] and
//! the session is closed afterwards, whatever the outcome. Scenarios run one
//! after another; a failing scenario never stops the suite.

mod scenarios;

pub use scenarios::{Scenario, MISSING_NOTE_ID};

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::config::ProbeConfig;
use crate::error::{ErrorCategory, Result};
use crate::mcp::McpSession;

/// Default lower bound (exclusive) on the advertised tool count.
pub const DEFAULT_MIN_TOOLS: usize = 50;

/// Opens initialized sessions for scenarios.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<McpSession>;
}

/// Connects over streamable HTTP using a [`ProbeConfig`].
#[derive(Debug, Clone)]
pub struct ConfigSessionFactory {
    config: ProbeConfig,
}

impl ConfigSessionFactory {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for ConfigSessionFactory {
    async fn open(&self) -> Result<McpSession> {
        McpSession::connect(&self.config).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteOptions {
    /// Run only scenarios whose name contains this substring.
    pub only: Option<String>,
    pub min_tools: usize,
}

impl Default for SuiteOptions {
    fn default() -> Self {
        Self {
            only: None,
            min_tools: DEFAULT_MIN_TOOLS,
        }
    }
}

impl SuiteOptions {
    pub fn selects(&self, scenario: Scenario) -> bool {
        self.only
            .as_deref()
            .map_or(true, |needle| scenario.name().contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScenarioOutcome {
    Passed { note: Option<String> },
    Failed { reason: String },
    Skipped { reason: String },
}

impl ScenarioOutcome {
    pub fn passed() -> Self {
        Self::Passed { note: None }
    }

    pub fn passed_with(note: impl Into<String>) -> Self {
        Self::Passed {
            note: Some(note.into()),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Passed { .. } => "PASS",
            Self::Failed { .. } => "FAIL",
            Self::Skipped { .. } => "SKIP",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Passed { note } => note.as_deref(),
            Self::Failed { reason } | Self::Skipped { reason } => Some(reason),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRecord {
    pub name: &'static str,
    #[serde(flatten)]
    pub outcome: ScenarioOutcome,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub started_at: DateTime<Utc>,
    pub records: Vec<ScenarioRecord>,
}

impl SuiteReport {
    fn count(&self, predicate: impl Fn(&ScenarioOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| predicate(&r.outcome)).count()
    }

    pub fn passed(&self) -> usize {
        self.count(ScenarioOutcome::is_passed)
    }

    pub fn failed(&self) -> usize {
        self.count(ScenarioOutcome::is_failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ScenarioOutcome::Skipped { .. }))
    }

    /// No scenario failed. An empty selection counts as success.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn get(&self, name: &str) -> Option<&ScenarioRecord> {
        self.records.iter().find(|r| r.name == name)
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} skipped",
            self.passed(),
            self.failed(),
            self.skipped()
        )
    }
}

pub struct SmokeSuite {
    config: ProbeConfig,
    factory: Box<dyn SessionFactory>,
    options: SuiteOptions,
}

impl SmokeSuite {
    pub fn new(config: ProbeConfig, options: SuiteOptions) -> Self {
        let factory = Box::new(ConfigSessionFactory::new(config.clone()));
        Self {
            config,
            factory,
            options,
        }
    }

    pub fn with_factory(mut self, factory: Box<dyn SessionFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn selected(&self) -> Vec<Scenario> {
        Scenario::iter().filter(|s| self.options.selects(*s)).collect()
    }

    pub async fn run(&self) -> SuiteReport {
        let started_at = Utc::now();
        let mut records = Vec::new();

        for scenario in self.selected() {
            let start = Instant::now();
            let outcome = self.run_scenario(scenario).await;
            let elapsed = start.elapsed();

            match &outcome {
                ScenarioOutcome::Failed { reason } => {
                    tracing::warn!(scenario = scenario.name(), reason = %reason, "scenario failed")
                }
                other => tracing::info!(
                    scenario = scenario.name(),
                    outcome = other.label(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "scenario finished"
                ),
            }

            records.push(ScenarioRecord {
                name: scenario.name(),
                outcome,
                elapsed,
            });
        }

        SuiteReport {
            started_at,
            records,
        }
    }

    async fn run_scenario(&self, scenario: Scenario) -> ScenarioOutcome {
        if !scenario.needs_session() {
            return Scenario::run_health(&self.config)
                .await
                .unwrap_or_else(|e| failure(scenario, &e));
        }

        let mut session = match self.factory.open().await {
            Ok(session) => session,
            Err(e) => return failure(scenario, &e),
        };

        let outcome = scenario
            .run_in_session(&mut session, &self.options)
            .await
            .unwrap_or_else(|e| failure(scenario, &e));

        if let Err(e) = session.close().await {
            tracing::warn!(scenario = scenario.name(), error = %e, "failed to close session");
        }
        outcome
    }
}

fn failure(scenario: Scenario, error: &crate::error::ProbeError) -> ScenarioOutcome {
    tracing::debug!(scenario = scenario.name(), category = %error.category(), "scenario errored");
    match error.category() {
        ErrorCategory::Connection | ErrorCategory::Network => {
            ScenarioOutcome::failed(format!("server unreachable: {error}"))
        }
        _ => ScenarioOutcome::failed(error.to_string()),
    }
}
