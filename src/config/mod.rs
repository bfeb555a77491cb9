//! Configuration system (layered: defaults > config file > env > CLI flags).

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bon::Builder;
use reqwest::Url;
use serde::Deserialize;

use crate::error::{ProbeError, Result};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8001";
pub const DEFAULT_MCP_PATH: &str = "/mcp";
pub const DEFAULT_HEALTH_PATH: &str = "/health/ready";

const ENV_URL: &str = "NCPROBE_URL";
const ENV_MCP_PATH: &str = "NCPROBE_MCP_PATH";
const ENV_HEALTH_PATH: &str = "NCPROBE_HEALTH_PATH";
const ENV_TOKEN: &str = "NCPROBE_TOKEN";
const ENV_TIMEOUT_SECS: &str = "NCPROBE_TIMEOUT_SECS";

/// Environment variables read by [`ProbeConfig::from_env`].
pub const ENV_VARS: [&str; 5] = [
    ENV_URL,
    ENV_MCP_PATH,
    ENV_HEALTH_PATH,
    ENV_TOKEN,
    ENV_TIMEOUT_SECS,
];

/// Where and how to reach the MCP server under test.
///
/// ```
/// use ncprobe::config::ProbeConfig;
///
/// let config = ProbeConfig::builder()
///     .base_url("http://localhost:8001")
///     .timeout_secs(30)
///     .build();
/// assert_eq!(config.mcp_url().unwrap().as_str(), "http://localhost:8001/mcp");
/// ```
#[derive(Clone, Builder, PartialEq, Eq)]
pub struct ProbeConfig {
    #[builder(into, default = DEFAULT_BASE_URL.to_string())]
    pub base_url: String,
    #[builder(into, default = DEFAULT_MCP_PATH.to_string())]
    pub mcp_path: String,
    #[builder(into, default = DEFAULT_HEALTH_PATH.to_string())]
    pub health_path: String,
    /// Bearer token sent with every MCP request.
    #[builder(into)]
    pub token: Option<String>,
    /// Per-request timeout; the transport default applies when unset.
    pub timeout_secs: Option<u64>,
}

impl fmt::Debug for ProbeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeConfig")
            .field("base_url", &self.base_url)
            .field("mcp_path", &self.mcp_path)
            .field("health_path", &self.health_path)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// On-disk TOML layer. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub mcp_path: Option<String>,
    pub health_path: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ConfigFile {
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&raw)
    }
}

impl ProbeConfig {
    /// Resolve the full layered configuration.
    ///
    /// `path` wins over the per-user default file; a missing default file is
    /// not an error, a missing explicit one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = Self::load_layers(path)?;
        config.validate()?;
        Ok(config)
    }

    /// File and environment layers without validation, for callers that
    /// overlay further settings (CLI flags) before validating.
    pub fn load_layers(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let file = match path {
            Some(path) => Some(ConfigFile::read(path)?),
            None => match default_config_path() {
                Some(path) if path.is_file() => Some(ConfigFile::read(&path)?),
                _ => None,
            },
        };
        if let Some(file) = file {
            config.merge_file(file);
        }

        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Defaults overlaid with environment variables only.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn merge_file(&mut self, file: ConfigFile) {
        if let Some(base_url) = file.base_url {
            self.base_url = base_url;
        }
        if let Some(mcp_path) = file.mcp_path {
            self.mcp_path = mcp_path;
        }
        if let Some(health_path) = file.health_path {
            self.health_path = health_path;
        }
        if file.token.is_some() {
            self.token = file.token;
        }
        if file.timeout_secs.is_some() {
            self.timeout_secs = file.timeout_secs;
        }
    }

    /// Overlay values from a variable lookup. Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = get(ENV_URL) {
            self.base_url = url;
        }
        if let Some(path) = get(ENV_MCP_PATH) {
            self.mcp_path = path;
        }
        if let Some(path) = get(ENV_HEALTH_PATH) {
            self.health_path = path;
        }
        if let Some(token) = get(ENV_TOKEN) {
            self.token = Some(token);
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                ProbeError::Configuration(format!(
                    "{ENV_TIMEOUT_SECS} must be a whole number of seconds, got '{raw}'"
                ))
            })?;
            self.timeout_secs = Some(secs);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.mcp_url()?;
        self.health_url()?;
        if self.timeout_secs == Some(0) {
            return Err(ProbeError::Configuration(
                "timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Streamable-HTTP endpoint, e.g. `http://127.0.0.1:8001/mcp`.
    pub fn mcp_url(&self) -> Result<Url> {
        join_endpoint(&self.base_url, &self.mcp_path)
    }

    /// Readiness endpoint, e.g. `http://127.0.0.1:8001/health/ready`.
    pub fn health_url(&self) -> Result<Url> {
        join_endpoint(&self.base_url, &self.health_path)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// `~/.config/ncprobe/config.toml` or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "ncprobe")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn join_endpoint(base: &str, path: &str) -> Result<Url> {
    let base = base.trim().trim_end_matches('/');
    let path = path.trim();
    let joined = if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{}", path.trim_start_matches('/'))
    };

    let url = Url::parse(&joined)
        .map_err(|e| ProbeError::Configuration(format!("invalid server URL '{joined}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ProbeError::Configuration(format!(
            "unsupported URL scheme '{other}' in '{joined}'"
        ))),
    }
}
