//! Lineage traversal tool.
//!
//! Tools: catalog_traverse_lineage

use serde_json::{json, Map, Value as JsonValue};

use crate::convert::{
    get_optional_bool, get_optional_u64, get_string_arg, string_list_param,
};
use crate::error::{McpError, Result};
use crate::fields::lookup_standard;
use crate::session::CatalogSession;
use crate::tools::ToolDef;

const DEFAULT_DEPTH: u64 = 1_000_000;
const DEFAULT_SIZE: u64 = 10;

/// Attributes requested on every lineage result, before caller additions.
const DEFAULT_ATTRIBUTES: &[&str] = &[
    "name",
    "display_name",
    "description",
    "qualified_name",
    "user_description",
    "certificate_status",
    "owner_users",
    "owner_groups",
    "connector_name",
    "has_lineage",
    "source_created_at",
    "source_updated_at",
    "asset_tags",
    "announcement_title",
    "announcement_message",
    "announcement_type",
];

/// Get all lineage tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![ToolDef::new(
        "catalog_traverse_lineage",
        "Traverse asset lineage from a starting GUID in one direction (UPSTREAM or \
         DOWNSTREAM). Returns the assets reached with a default attribute set; pass \
         include_attributes to request more. One call returns one page of results.",
        json!({
            "type": "object",
            "properties": {
                "guid": {
                    "description": "GUID of the starting asset",
                    "type": "string"
                },
                "direction": {
                    "type": "string",
                    "enum": ["UPSTREAM", "DOWNSTREAM"]
                },
                "depth": {
                    "description": "Maximum traversal depth (default 1000000)",
                    "type": "integer"
                },
                "size": {
                    "description": "Maximum number of results (default 10)",
                    "type": "integer"
                },
                "immediate_neighbors": {
                    "description": "Only return immediate neighbors (default false)",
                    "type": "boolean"
                },
                "include_attributes": {
                    "description": "Additional attribute names to include, array or JSON string",
                    "type": ["array", "string"],
                    "items": { "type": "string" }
                }
            },
            "required": ["guid", "direction"]
        }),
    )]
}

/// Dispatch a lineage tool call.
pub fn dispatch(
    session: &CatalogSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "catalog_traverse_lineage" => Ok(traverse_lineage(session, &args)),
        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}

fn traverse_lineage(session: &CatalogSession, args: &Map<String, JsonValue>) -> JsonValue {
    match run_traversal(session, args) {
        Ok(assets) => json!({"assets": assets, "error": null}),
        Err(e) => {
            tracing::error!(error = %e, "lineage traversal failed");
            json!({"assets": [], "error": e.to_string()})
        }
    }
}

fn run_traversal(
    session: &CatalogSession,
    args: &Map<String, JsonValue>,
) -> Result<Vec<JsonValue>> {
    let guid = get_string_arg(args, "guid")?;
    let direction = get_string_arg(args, "direction")?.to_uppercase();
    if direction != "UPSTREAM" && direction != "DOWNSTREAM" {
        return Err(McpError::InvalidArg {
            name: "direction".to_string(),
            reason: format!("must be UPSTREAM or DOWNSTREAM, got {}", direction),
        });
    }

    let depth = get_optional_u64(args, "depth").unwrap_or(DEFAULT_DEPTH);
    let size = get_optional_u64(args, "size").unwrap_or(DEFAULT_SIZE);
    let immediate_neighbors = get_optional_bool(args, "immediate_neighbors").unwrap_or(false);

    fn push_attribute(name: &str, attributes: &mut Vec<String>) {
        match lookup_standard(name) {
            Some(field) => {
                let attr = field.attr_name.to_string();
                if !attributes.contains(&attr) {
                    attributes.push(attr);
                }
            }
            None => tracing::warn!(attribute = %name, "unknown attribute for inclusion, skipping"),
        }
    }

    let mut attributes: Vec<String> = Vec::new();
    for name in DEFAULT_ATTRIBUTES {
        push_attribute(name, &mut attributes);
    }
    if let Some(extra) = string_list_param(args, "include_attributes")? {
        for name in &extra {
            push_attribute(name, &mut attributes);
        }
    }

    let request = json!({
        "guid": guid,
        "direction": direction,
        "depth": depth,
        "size": size,
        "immediateNeighbors": immediate_neighbors,
        "attributes": attributes
    });

    tracing::debug!(%guid, %direction, depth, size, "executing lineage request");
    let response = session.client().lineage(&request)?;

    let assets = response
        .get("entities")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    tracing::debug!(count = assets.len(), "lineage traversal completed");
    Ok(assets)
}
