//! Custom-metadata context tool.
//!
//! Tools: catalog_custom_metadata_context
//!
//! Surfaces the custom-metadata set definitions the search tool resolves
//! dotted attribute names against, including enum value lists, so agents can
//! construct valid `Set Name.property` conditions.

use serde_json::{json, Map, Value as JsonValue};

use crate::convert::get_optional_bool;
use crate::error::{McpError, Result};
use crate::session::CatalogSession;
use crate::tools::ToolDef;

/// Get all custom-metadata tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![ToolDef::new(
        "catalog_custom_metadata_context",
        "List the catalog's custom-metadata sets and their properties, including allowed \
         enum values. Use these with catalog_search_assets via dotted attribute names, e.g. \
         'Data Classification.sensitivity_level'. Pass refresh=true to re-fetch the \
         definitions from the catalog.",
        json!({
            "type": "object",
            "properties": {
                "refresh": {
                    "description": "Re-fetch definitions instead of using the cached directory",
                    "type": "boolean"
                }
            },
            "required": []
        }),
    )]
}

/// Dispatch a custom-metadata tool call.
pub fn dispatch(
    session: &CatalogSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "catalog_custom_metadata_context" => Ok(context(session, &args)),
        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}

fn context(session: &CatalogSession, args: &Map<String, JsonValue>) -> JsonValue {
    let directory = if get_optional_bool(args, "refresh").unwrap_or(false) {
        match session.refresh_type_directory() {
            Ok(directory) => directory,
            Err(e) => {
                tracing::error!(error = %e, "custom-metadata refresh failed");
                return json!({"sets": [], "error": e.to_string()});
            }
        }
    } else {
        session.type_directory()
    };

    let sets: Vec<JsonValue> = directory
        .sets()
        .iter()
        .map(|set| {
            let attributes: Vec<JsonValue> = set
                .attributes
                .iter()
                .map(|attr| {
                    json!({
                        "name": attr.name,
                        "display_name": attr.display_name,
                        "data_type": attr.type_name,
                        "enum_values": attr.enum_values
                    })
                })
                .collect();
            json!({
                "name": set.name,
                "display_name": set.display_name,
                "attributes": attributes
            })
        })
        .collect();

    json!({"sets": sets, "error": null})
}
