//! CLI interface for maquette.

pub mod handlers;
pub mod output;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use crate::bridge::{DEFAULT_HOST, DEFAULT_PORT};
use output::OutputMode;

/// Maquette - Command templates for AI-driven 3D content creation
#[derive(Parser)]
#[command(name = "maquette", version, about, long_about = None)]
pub struct Cli {
    /// Override templates directory (default: ~/.maquette/templates)
    #[arg(long, env = "MAQUETTE_TEMPLATES_DIR", global = true)]
    pub templates_dir: Option<PathBuf>,

    /// Host application address
    #[arg(long, env = "MAQUETTE_HOST", default_value = DEFAULT_HOST, global = true)]
    pub host: String,

    /// Host application command port
    #[arg(long, env = "MAQUETTE_PORT", default_value_t = DEFAULT_PORT, global = true)]
    pub port: u16,

    /// Disable the version archive for this invocation
    #[arg(long, global = true)]
    pub no_history: bool,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start MCP server (stdio transport for controller integration)
    Mcp,

    /// List stored templates
    List {
        /// Attach archived revision history per template
        #[arg(long)]
        versions: bool,
    },

    /// Show one template document
    Show {
        /// Template name
        name: String,
        /// Show an archived revision instead of the current document
        #[arg(long)]
        revision: Option<u32>,
    },

    /// Execute a stored template against the host
    Apply {
        /// Template name
        name: String,
        /// Override document as inline JSON
        #[arg(long)]
        overrides: Option<String>,
        /// Per-action timeout in seconds
        #[arg(long, default_value = "15")]
        timeout: u64,
    },

    /// Find templates by tag
    Search {
        /// Tags to match (a template qualifies when it shares at least one)
        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// Usage counters recorded by apply
    Stats {
        /// Restrict to one template
        name: Option<String>,
    },

    /// Delete a stored template
    Delete {
        /// Template name
        name: String,
    },

    /// Invoke one host command directly
    Tool {
        /// Host tool name (e.g. create_object)
        name: String,
        /// Parameters as inline JSON object
        #[arg(long)]
        params: Option<String>,
    },

    /// Run a stub host listener that echoes commands (for development)
    StubHost {
        /// Listen address
        #[arg(long, default_value = "127.0.0.1:9876")]
        bind: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, elvish, powershell)
        shell: clap_complete::Shell,
    },
}

/// Execute a CLI command, dispatching to the appropriate handler.
pub async fn execute(
    command: &Commands,
    ctx: &crate::init::AppContext,
    mode: OutputMode,
) -> anyhow::Result<()> {
    match command {
        Commands::Mcp => unreachable!("MCP handled in main"),

        Commands::List { versions } => {
            handlers::templates::handle_list(ctx, *versions, mode).await?
        }

        Commands::Show { name, revision } => {
            handlers::templates::handle_show(ctx, name, *revision, mode).await?
        }

        Commands::Apply {
            name,
            overrides,
            timeout,
        } => handlers::apply::handle_apply(ctx, name, overrides.as_deref(), *timeout, mode).await?,

        Commands::Search { tags } => handlers::templates::handle_search(ctx, tags, mode).await?,

        Commands::Stats { name } => {
            handlers::templates::handle_stats(ctx, name.as_deref(), mode).await?
        }

        Commands::Delete { name } => handlers::templates::handle_delete(ctx, name, mode).await?,

        Commands::Tool { name, params } => {
            handlers::host::handle_tool(ctx, name, params.as_deref(), mode).await?
        }

        Commands::StubHost { bind } => handlers::host::handle_stub_host(bind).await?,

        Commands::Completions { shell } => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "maquette",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}
