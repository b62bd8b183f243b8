//! Command-line interface: run the HTTP server or group a request file once.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::api::GroupTabsRequest;
use crate::app_config::build_grouper;

#[derive(Parser, Debug)]
#[command(name = "tabgroup-server", version, about = "Group browser tabs into named workspaces")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server (default)
    Serve {
        /// Bind address, overrides HOST
        #[arg(long)]
        host: Option<String>,
        /// Listen port, overrides PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Group the tabs of a request JSON file and print the result
    Group {
        /// File holding `{"tabs": [...], "settings": {...}}`
        file: PathBuf,
        /// Pretty-print the result
        #[arg(long)]
        pretty: bool,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Serve { host: None, port: None }
    }
}

/// Read a grouping request from `path`, run it once and print the result
/// JSON to stdout.
pub async fn group_file(config: tabgroup_core::Config, path: &Path, pretty: bool) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let request: GroupTabsRequest = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", path.display()))?;

    let grouper = build_grouper(&config.embedding).with_context(|| {
        format!("embedding provider '{}' is not configured", config.embedding.provider)
    })?;

    info!(tabs = request.tabs.len(), embedder = grouper.embedder_name(), "grouping {}", path.display());
    let result = grouper.group_tabs(&request.tabs, &request.settings).await?;

    let out = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{out}");
    Ok(())
}
