//! MCP server for a data-catalog platform.
//!
//! Run with `catalog-mcp --base-url https://tenant.example.com --api-key <KEY>`,
//! or set `CATALOG_BASE_URL` / `CATALOG_API_KEY` in the environment.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod client;
mod config;
mod convert;
mod error;
mod fields;
mod query;
mod server;
mod session;
mod tools;
mod typedefs;

use client::CatalogClient;
use config::Settings;
use server::McpServer;
use session::CatalogSession;
use tools::ToolRegistry;

/// MCP server for a data-catalog platform.
///
/// Exposes catalog asset search, lineage and metadata operations as MCP tools
/// for AI agents. Communicates via JSON-RPC 2.0 over stdin/stdout.
#[derive(Parser)]
#[command(name = "catalog-mcp")]
#[command(version, about, long_about = None)]
struct Args {
    /// Base URL of the catalog instance.
    #[arg(long, env = "CATALOG_BASE_URL", value_name = "URL")]
    base_url: String,

    /// API key used to authenticate against the catalog.
    #[arg(long, env = "CATALOG_API_KEY", value_name = "KEY", hide_env_values = true)]
    api_key: String,

    /// Agent identifier reported to the catalog with every request.
    #[arg(long, env = "CATALOG_AGENT_ID", value_name = "ID")]
    agent_id: Option<String>,

    /// Comma-separated allowlist of tool names to expose.
    /// All tools are exposed when unset.
    #[arg(long, env = "CATALOG_TOOLS", value_name = "NAMES")]
    tools: Option<String>,

    /// Enable debug logging to stderr.
    #[arg(long, short)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    // Set up logging; stdout carries the protocol, so logs go to stderr
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("catalog_mcp=debug".parse().unwrap()))
            .with_writer(std::io::stderr)
            .init();
    }

    let settings = Settings::new(&args.base_url, &args.api_key).with_agent_id(args.agent_id);

    let client = match CatalogClient::new(&settings) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: Failed to create catalog client: {}", e);
            std::process::exit(1);
        }
    };

    let registry = match args.tools.as_deref().and_then(config::parse_tool_allowlist) {
        Some(allowed) => ToolRegistry::with_allowlist(&allowed),
        None => ToolRegistry::new(),
    };

    if registry.tools().is_empty() {
        eprintln!("Error: Tool allowlist excludes every tool");
        std::process::exit(1);
    }

    // Create session and server
    let session = CatalogSession::new(client);
    let mut server = McpServer::new(session, registry);

    // Run the server
    if let Err(e) = server.run() {
        eprintln!("Error: Server error: {}", e);
        std::process::exit(1);
    }
}
