//! # catalog-mcp
//!
//! MCP (Model Context Protocol) server for a data-catalog platform.
//!
//! This crate provides an MCP server that exposes catalog operations (asset
//! search, lineage traversal, metadata updates and glossary creation) as
//! tools for AI agents. It implements the MCP protocol over stdin/stdout
//! using JSON-RPC 2.0 and talks to the catalog's REST API over HTTP.
//!
//! ## Features
//!
//! - **Condition-driven asset search**: loosely-typed condition dictionaries
//!   (standard attributes, dotted custom-metadata names, tag and date-range
//!   filters, some-of-N groups) compiled into the catalog's search DSL
//! - **Raw DSL passthrough** for callers that already hold a structured query
//! - **Lineage traversal**, **asset updates** and **glossary creation**
//! - **Tool restriction**: an optional allowlist trims the exposed tool set
//!
//! ## Usage
//!
//! The server is typically run as an executable and configured in AI tools
//! like Claude Desktop:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "catalog": {
//!       "command": "/path/to/catalog-mcp",
//!       "env": {
//!         "CATALOG_BASE_URL": "https://tenant.example.com",
//!         "CATALOG_API_KEY": "..."
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! ## Library Usage
//!
//! For testing or embedding, you can use the library API:
//!
//! ```no_run
//! use catalog_mcp::{CatalogClient, CatalogSession, McpServer, Settings, ToolRegistry};
//!
//! let settings = Settings::new("https://tenant.example.com", "api-key");
//! let client = CatalogClient::new(&settings).expect("Failed to create client");
//! let session = CatalogSession::new(client);
//! let mut server = McpServer::new(session, ToolRegistry::new());
//!
//! // Run the server (reads from stdin, writes to stdout)
//! // server.run().expect("Server error");
//! ```

#![warn(missing_docs)]

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

pub use client::{CatalogClient, SearchResponse};
pub use config::{parse_tool_allowlist, Settings};
pub use error::{McpError, Result};
pub use fields::{AttributeResolver, FieldDescriptor};
pub use query::{Operator, SearchBuilder, SearchRequest, SortOrder};
pub use server::{JsonRpcRequest, JsonRpcResponse, McpServer};
pub use session::CatalogSession;
pub use tools::{ToolDef, ToolRegistry};
pub use typedefs::TypeDirectory;
