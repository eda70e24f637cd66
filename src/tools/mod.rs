//! Tool registry and category definitions.
//!
//! Provides the infrastructure for registering, restricting and dispatching
//! MCP tools.

pub mod assets;
pub mod dsl;
pub mod glossary;
pub mod lineage;
pub mod metadata;
pub mod search;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};
use crate::session::CatalogSession;

/// A tool definition for the MCP tools/list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    /// Tool name (e.g., "catalog_search_assets")
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonValue,
}

impl ToolDef {
    /// Create a new tool definition.
    pub fn new(name: &str, description: &str, input_schema: JsonValue) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// Registry of all available tools.
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    /// Create a new registry with all tools registered.
    pub fn new() -> Self {
        let mut tools = Vec::new();

        // Register all tool categories
        tools.extend(search::tools());
        tools.extend(dsl::tools());
        tools.extend(lineage::tools());
        tools.extend(assets::tools());
        tools.extend(glossary::tools());
        tools.extend(metadata::tools());

        Self { tools }
    }

    /// Create a registry restricted to an allowlist of tool names.
    ///
    /// Tools outside the list are absent from tools/list and rejected on
    /// dispatch. Allowlist entries that match no tool are logged and ignored.
    pub fn with_allowlist(allowed: &[String]) -> Self {
        let all = Self::new();
        for name in allowed {
            if !all.tools.iter().any(|t| &t.name == name) {
                tracing::warn!(tool = %name, "allowlist names an unknown tool");
            }
        }

        let tools = all
            .tools
            .into_iter()
            .filter(|t| allowed.contains(&t.name))
            .collect();
        Self { tools }
    }

    /// Get all tool definitions.
    pub fn tools(&self) -> &[ToolDef] {
        &self.tools
    }

    /// Dispatch a tool call to the appropriate handler.
    ///
    /// Tools filtered out of this registry dispatch as unknown.
    pub fn dispatch(
        &self,
        session: &CatalogSession,
        name: &str,
        args: Map<String, JsonValue>,
    ) -> Result<JsonValue> {
        if !self.tools.iter().any(|t| t.name == name) {
            return Err(McpError::UnknownTool(name.to_string()));
        }

        match name {
            "catalog_search_assets" => search::dispatch(session, name, args),
            "catalog_get_assets_by_dsl" => dsl::dispatch(session, name, args),
            "catalog_traverse_lineage" => lineage::dispatch(session, name, args),
            "catalog_update_assets" => assets::dispatch(session, name, args),
            "catalog_custom_metadata_context" => metadata::dispatch(session, name, args),
            n if n.starts_with("catalog_create_glossary") => {
                glossary::dispatch(session, name, args)
            }
            _ => Err(McpError::UnknownTool(name.to_string())),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_registers_all_tools() {
        let registry = ToolRegistry::new();
        let names: Vec<&str> = registry.tools().iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"catalog_search_assets"));
        assert!(names.contains(&"catalog_get_assets_by_dsl"));
        assert!(names.contains(&"catalog_traverse_lineage"));
        assert!(names.contains(&"catalog_update_assets"));
        assert!(names.contains(&"catalog_create_glossary"));
        assert!(names.contains(&"catalog_create_glossary_category"));
        assert!(names.contains(&"catalog_create_glossary_term"));
        assert!(names.contains(&"catalog_custom_metadata_context"));
    }

    #[test]
    fn test_allowlist_restricts_tools() {
        let registry = ToolRegistry::with_allowlist(&[
            "catalog_search_assets".to_string(),
            "no_such_tool".to_string(),
        ]);
        let names: Vec<&str> = registry.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["catalog_search_assets"]);
    }
}
