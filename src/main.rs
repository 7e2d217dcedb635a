use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use std::path::PathBuf;

mod cmd;
mod config;
mod server;
mod studio;
mod utils;

use cmd::ToolsArgs;
use config::{Overrides, StudioConfig};
use server::StudioServer;

/// Studio MCP - exposes the WordPress Studio CLI as MCP tools over stdio.
///
/// Usage:
///   studio-mcp [serve]            Run the MCP server on stdin/stdout (default)
///   studio-mcp tools [--json]     Print the registered tools and exit
///
/// Global flags / env:
///   -v / -vv                      Increase verbosity (logs go to stderr)
///   -q / --quiet                  Errors only
///   --config <PATH>               JSON/YAML config file   (STUDIO_MCP_CONFIG)
///   --studio-cli <CMD>            Studio command line     (STUDIO_CLI, default "studio")
///   --sites-dir <DIR>             Where sites live        (STUDIO_SITES_DIR, default ~/Studio)
///   --timeout <SECS>              Per-call limit, 0 = off (STUDIO_CLI_TIMEOUT)
///
/// Example MCP client entry:
///   { "mcpServers": { "studio": { "command": "studio-mcp" } } }
#[derive(Parser, Debug)]
#[command(
    name = "studio-mcp",
    version,
    author,
    about = "Studio MCP - manage local WordPress Studio sites from an AI assistant",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error log output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file (JSON or YAML)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Studio CLI command line, e.g. "studio" or "node /opt/studio/cli.js"
    #[arg(long = "studio-cli", global = true, value_name = "CMD")]
    studio_cli: Option<String>,

    /// Directory where Studio sites are stored
    #[arg(long = "sites-dir", global = true, value_name = "DIR")]
    sites_dir: Option<String>,

    /// Timeout in seconds for each studio invocation (0 disables)
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the MCP server over stdio (default)
    Serve,

    /// List the tools this server exposes
    Tools(ToolsArgs),
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            config_path: self.config.clone(),
            command: self.studio_cli.clone(),
            sites_dir: self.sites_dir.clone(),
            timeout_secs: self.timeout,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    if let Err(e) = run(cli).await {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config =
        StudioConfig::resolve(&cli.overrides()).context("Failed to resolve configuration")?;

    match cli.command {
        Some(Commands::Tools(args)) => cmd::execute_tools(args, config),
        Some(Commands::Serve) | None => serve(config).await,
    }
}

async fn serve(config: StudioConfig) -> Result<()> {
    tracing::info!(
        command = %config.command,
        sites_dir = %config.sites_dir.display(),
        timeout_secs = config.timeout.map(|t| t.as_secs()),
        "starting studio MCP server"
    );

    let service = StudioServer::new(config)
        .serve(stdio())
        .await
        .context("Failed to start MCP service on stdio")?;

    tracing::info!("studio MCP server started");
    service.waiting().await.context("MCP service stopped abnormally")?;
    tracing::info!("studio MCP server shut down");
    Ok(())
}
