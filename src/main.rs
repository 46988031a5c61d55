use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mcpdemo::transport::{self, StdioTransport};
use mcpdemo::{Config, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_logging(&config)?;

    if let Err(e) = run(&config).await {
        tracing::error!("server stopped: {:#}", e);
        return Err(e);
    }
    Ok(())
}

/// stdout carries the protocol, so logs go to stderr.
fn init_logging(config: &Config) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log level")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))
}

async fn run(config: &Config) -> anyhow::Result<()> {
    let server = Arc::new(config.build_server().context("failed to build server")?);

    tracing::info!(
        name = %server.info().name,
        version = %server.info().version,
        variant = ?config.variant,
        tools = server.list_tools().count(),
        resources = server.list_resources().count(),
        prompts = server.list_prompts().count(),
        "MCP server running on stdio"
    );

    let mut stdio = StdioTransport::stdio();
    transport::serve(server, &mut stdio)
        .await
        .context("stdio session failed")?;

    tracing::info!("session closed");
    Ok(())
}
