//! MyTaskly MCP Server
//!
//! Serves the MyTaskly tools over MCP stdio (default) or HTTP.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mytaskly_mcp_server::config::Config;
use mytaskly_mcp_server::http::{self, AppState};
use mytaskly_mcp_server::mcp::server::McpServer;
use mytaskly_mcp_server::mcp::tools::ToolHandler;

/// MyTaskly MCP Server
#[derive(Parser)]
#[command(name = "mytaskly-mcp-server")]
#[command(author, version, about = "MyTaskly MCP Server - A Model Context Protocol server for MyTaskly")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the tools as HTTP endpoints
    Serve {
        #[arg(long, env = "HTTP_HOST", default_value = "0.0.0.0")]
        host: IpAddr,

        #[arg(long, env = "HTTP_PORT", default_value_t = 8000)]
        port: u16,
    },

    /// Print the effective configuration with secrets redacted
    CheckConfig,

    /// Mint a token for local testing (development environment only)
    #[cfg(feature = "dev-tokens")]
    MintToken {
        /// Caller id placed in `sub`
        #[arg(long)]
        sub: String,

        #[arg(long, default_value_t = 30)]
        ttl_minutes: i64,

        /// Scope to grant; repeat for several
        #[arg(long = "scope")]
        scopes: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env().context("failed to load configuration")?;

    // Initialize logging; stdout belongs to the MCP transport
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        None => run_stdio(config).await,
        Some(Commands::Serve { host, port }) => run_http(config, SocketAddr::new(host, port)).await,
        Some(Commands::CheckConfig) => {
            println!("{:#?}", config);
            Ok(())
        }
        #[cfg(feature = "dev-tokens")]
        Some(Commands::MintToken {
            sub,
            ttl_minutes,
            scopes,
        }) => mint(&config, &sub, ttl_minutes, &scopes),
    }
}

async fn run_stdio(config: Config) -> anyhow::Result<()> {
    let tools = Arc::new(ToolHandler::from_config(&config)?);
    tracing::info!(
        server = %config.server_name,
        upstream = %config.upstream.base_url,
        environment = config.environment.as_str(),
        "starting MCP server on stdio"
    );

    let server = Arc::new(McpServer::new(tools, config.server_name, config.server_version));
    server.run_stdio().await?;
    Ok(())
}

async fn run_http(config: Config, addr: SocketAddr) -> anyhow::Result<()> {
    let tools = Arc::new(ToolHandler::from_config(&config)?);
    tracing::info!(
        server = %config.server_name,
        upstream = %config.upstream.base_url,
        environment = config.environment.as_str(),
        "starting HTTP server"
    );

    let state = AppState::new(tools, config.server_name, config.server_version);
    http::serve(addr, state)
        .await
        .with_context(|| format!("HTTP server on {} failed", addr))
}

#[cfg(feature = "dev-tokens")]
fn mint(config: &Config, subject: &str, ttl_minutes: i64, scopes: &[String]) -> anyhow::Result<()> {
    use mytaskly_mcp_server::auth::dev::mint_dev_token;

    let scopes: Vec<&str> = scopes.iter().map(String::as_str).collect();
    let token = mint_dev_token(config, subject, ttl_minutes, &scopes)?;
    println!("{}", token);
    Ok(())
}
