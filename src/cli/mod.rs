//! CLI entry point for ncprobe.

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ProbeConfig;
use crate::error::Result;
use crate::smoke::DEFAULT_MIN_TOOLS;

/// Probe and smoke-test a Nextcloud MCP server
#[derive(Parser, Debug)]
#[command(name = "ncprobe", version, about = "MCP client and smoke tests for Nextcloud MCP servers")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection flags shared by every subcommand. They override file and env settings.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Server base URL, e.g. http://127.0.0.1:8001
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Path of the MCP endpoint
    #[arg(long, global = true)]
    pub mcp_path: Option<String>,

    /// Bearer token for the MCP endpoint
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

impl GlobalArgs {
    /// Load layered config, apply these flags on top, then validate once.
    pub fn resolve(&self) -> Result<ProbeConfig> {
        let mut config = ProbeConfig::load_layers(self.config.as_deref())?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut ProbeConfig) {
        if let Some(url) = &self.url {
            config.base_url = url.clone();
        }
        if let Some(path) = &self.mcp_path {
            config.mcp_path = path.clone();
        }
        if let Some(token) = &self.token {
            config.token = Some(token.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = Some(secs);
        }
    }
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Query the readiness endpoint
    Health,
    /// List advertised tools
    Tools(ToolsArgs),
    /// List advertised resources
    Resources,
    /// Invoke a single tool
    Call(CallArgs),
    /// Run the smoke suite
    Smoke(SmokeArgs),
}

#[derive(Parser, Debug)]
pub struct ToolsArgs {
    /// Only show tools whose name contains this substring (e.g. nc_webdav)
    #[arg(short, long)]
    pub filter: Option<String>,
}

#[derive(Parser, Debug)]
pub struct CallArgs {
    /// Tool name, e.g. nc_notes_search_notes
    pub tool: String,

    /// Arguments as a JSON object
    #[arg(short, long, default_value = "{}")]
    pub args: String,
}

#[derive(Parser, Debug)]
pub struct SmokeArgs {
    /// Only run scenarios whose name contains this substring
    #[arg(long)]
    pub only: Option<String>,

    /// Tool count the server must exceed
    #[arg(long, default_value_t = DEFAULT_MIN_TOOLS)]
    pub min_tools: usize,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
