//! DSL passthrough tool.
//!
//! Tools: catalog_get_assets_by_dsl
//!
//! Forwards an already-structured query document to the search endpoint
//! verbatim: no attribute resolution, no operator translation. For callers
//! that know the catalog's native query DSL.

use serde_json::{json, Map, Value as JsonValue};

use crate::convert::json_param;
use crate::error::{McpError, Result};
use crate::query::SearchRequest;
use crate::session::CatalogSession;
use crate::tools::ToolDef;

/// Get all DSL tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![ToolDef::new(
        "catalog_get_assets_by_dsl",
        "Execute a raw search-DSL query document against the catalog. The document is \
         forwarded unmodified; pass it as a native object or a JSON-encoded string. Returns \
         matching records and any aggregation buckets the catalog computed.",
        json!({
            "type": "object",
            "properties": {
                "dsl_query": {
                    "description": "The query DSL document, object or JSON string",
                    "type": ["object", "string"]
                }
            },
            "required": ["dsl_query"]
        }),
    )]
}

/// Dispatch a DSL tool call.
pub fn dispatch(
    session: &CatalogSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "catalog_get_assets_by_dsl" => Ok(get_assets_by_dsl(session, &args)),
        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}

fn get_assets_by_dsl(session: &CatalogSession, args: &Map<String, JsonValue>) -> JsonValue {
    let dsl = match json_param(args, "dsl_query") {
        Ok(Some(dsl)) => dsl,
        Ok(None) => return error_response("missing required argument: dsl_query"),
        Err(e) => {
            tracing::error!(error = %e, "invalid DSL query document");
            return error_response(&format!("Invalid JSON in DSL query: {}", e));
        }
    };

    let request = SearchRequest::from_dsl(dsl);
    match session.client().search(&request) {
        Ok(response) => {
            tracing::debug!(count = response.entities.len(), "DSL search completed");
            json!({
                "results": response.entities,
                "aggregations": response.aggregations
            })
        }
        Err(e) => {
            tracing::error!(error = %e, "DSL search failed");
            error_response(&e.to_string())
        }
    }
}

fn error_response(message: &str) -> JsonValue {
    json!({"results": [], "aggregations": {}, "error": message})
}
