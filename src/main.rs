//! Maquette - Command templates for AI-driven 3D content creation
//!
//! Usage:
//!   maquette mcp                 Start MCP server on stdio
//!   maquette list                List stored templates
//!   maquette apply <name>        Execute a template against the host
//!   maquette tool get_scene_info Invoke one host command directly
//!   maquette stub-host           Run a development stand-in host
//!   maquette --help              Show all commands

use anyhow::Result;
use clap::Parser;

use maquette::bridge::BridgeConfig;
use maquette::cli::output::OutputMode;
use maquette::cli::{Cli, Commands};
use maquette::init::AppContext;
use maquette::mcp::server::run_mcp_server;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Tracing to stderr (safe for MCP stdio transport)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("maquette=info".parse()?),
        )
        .init();

    let mode = OutputMode::from_json_flag(cli.json);
    let bridge_config = BridgeConfig {
        host: cli.host.clone(),
        port: cli.port,
        ..BridgeConfig::default()
    };

    match &cli.command {
        Commands::Mcp => {
            let ctx = AppContext::new(
                cli.templates_dir.clone(),
                bridge_config,
                !cli.no_history,
            )?;
            run_mcp_server(ctx).await?;
        }
        cmd => {
            let ctx = AppContext::new(
                cli.templates_dir.clone(),
                bridge_config,
                !cli.no_history,
            )?;
            maquette::cli::execute(cmd, &ctx, mode).await?;
        }
    }

    Ok(())
}
