mod api;
mod app_config;
mod cli;
mod router;
mod state;

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app_config::{build_state, load_config};
use crate::cli::{Cli, Command};

async fn serve(config: tabgroup_core::Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(build_state(config));
    if state.grouper.is_none() {
        tracing::warn!("No embedder configured; /group-tabs will answer 503");
    }

    let app = router::build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let mut config = load_config();
    config.log_summary();

    match cli.command.unwrap_or_default() {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await?;
        }
        Command::Group { file, pretty } => {
            cli::group_file(config, &file, pretty).await?;
        }
    }

    Ok(())
}
