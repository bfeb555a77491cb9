//! Readiness check against the server's plain HTTP health endpoint.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};

/// Check key reporting whether the backing Nextcloud instance answers.
pub const NEXTCLOUD_REACHABLE: &str = "nextcloud_reachable";

const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Body of `GET /health/ready`, e.g.
/// `{"status": "ready", "checks": {"nextcloud_reachable": "ok"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub checks: BTreeMap<String, String>,
}

impl HealthReport {
    /// `status == "ready"` and every check reports `"ok"`.
    pub fn is_ready(&self) -> bool {
        self.status == "ready" && self.checks.values().all(|value| value == "ok")
    }

    pub fn check(&self, name: &str) -> Option<&str> {
        self.checks.get(name).map(String::as_str)
    }

    /// Names of checks that did not report `"ok"`.
    pub fn failing_checks(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|(_, value)| value.as_str() != "ok")
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Fetch the readiness report.
///
/// A non-2xx status is an [`ProbeError::Api`] carrying the body; a refused
/// connection is [`ProbeError::Connection`].
pub async fn check_ready(config: &ProbeConfig) -> Result<HealthReport> {
    let url = config.health_url()?;
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout().unwrap_or(DEFAULT_HEALTH_TIMEOUT))
        .build()?;

    tracing::debug!(url = %url, "checking server readiness");
    let response = client.get(url.clone()).send().await.map_err(|e| {
        if e.is_connect() {
            ProbeError::Connection(format!("cannot reach {url}: {e}"))
        } else {
            ProbeError::Network(e)
        }
    })?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ProbeError::api(status.as_u16(), body));
    }

    let report: HealthReport = serde_json::from_str(&body)?;
    if !report.is_ready() {
        tracing::warn!(status = %report.status, failing = ?report.failing_checks(), "server not ready");
    }
    Ok(report)
}
