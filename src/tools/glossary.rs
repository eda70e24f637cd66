//! Glossary creation tools.
//!
//! Tools: catalog_create_glossary, catalog_create_glossary_category,
//!        catalog_create_glossary_term
//!
//! Categories and terms anchor to an existing glossary by GUID. List-like
//! parameters tolerate JSON-encoded string input, matching the other tools.

use serde_json::{json, Map, Value as JsonValue};

use crate::convert::{get_optional_string, get_string_arg, string_list_param};
use crate::error::{McpError, Result};
use crate::session::CatalogSession;
use crate::tools::assets::CERTIFICATE_STATUSES;
use crate::tools::ToolDef;

/// Get all glossary tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "catalog_create_glossary",
            "Create a new glossary. Returns the GUID of the created glossary; anchor \
             categories and terms to it with the companion tools.",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "description": { "type": "string" },
                    "long_description": { "type": "string" },
                    "certificate_status": {
                        "type": "string",
                        "enum": ["VERIFIED", "DRAFT", "DEPRECATED"]
                    },
                    "owner_users": { "type": ["array", "string"], "items": { "type": "string" } },
                    "owner_groups": { "type": ["array", "string"], "items": { "type": "string" } }
                },
                "required": ["name"]
            }),
        ),
        ToolDef::new(
            "catalog_create_glossary_category",
            "Create a category inside an existing glossary, identified by glossary_guid.",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "glossary_guid": { "type": "string" },
                    "description": { "type": "string" },
                    "long_description": { "type": "string" },
                    "certificate_status": {
                        "type": "string",
                        "enum": ["VERIFIED", "DRAFT", "DEPRECATED"]
                    },
                    "owner_users": { "type": ["array", "string"], "items": { "type": "string" } },
                    "owner_groups": { "type": ["array", "string"], "items": { "type": "string" } }
                },
                "required": ["name", "glossary_guid"]
            }),
        ),
        ToolDef::new(
            "catalog_create_glossary_term",
            "Create a term inside an existing glossary, identified by glossary_guid. \
             Optionally place it in categories by GUID.",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "glossary_guid": { "type": "string" },
                    "description": { "type": "string" },
                    "long_description": { "type": "string" },
                    "certificate_status": {
                        "type": "string",
                        "enum": ["VERIFIED", "DRAFT", "DEPRECATED"]
                    },
                    "category_guids": { "type": ["array", "string"], "items": { "type": "string" } },
                    "owner_users": { "type": ["array", "string"], "items": { "type": "string" } },
                    "owner_groups": { "type": ["array", "string"], "items": { "type": "string" } }
                },
                "required": ["name", "glossary_guid"]
            }),
        ),
    ]
}

/// Dispatch a glossary tool call.
pub fn dispatch(
    session: &CatalogSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    let result = match name {
        "catalog_create_glossary" => create(session, &args, "AtlasGlossary", false),
        "catalog_create_glossary_category" => {
            create(session, &args, "AtlasGlossaryCategory", true)
        }
        "catalog_create_glossary_term" => create(session, &args, "AtlasGlossaryTerm", true),
        _ => return Err(McpError::UnknownTool(name.to_string())),
    };

    Ok(match result {
        Ok(guid) => json!({"guid": guid, "error": null}),
        Err(e) => {
            tracing::error!(error = %e, tool = %name, "glossary creation failed");
            json!({"guid": null, "error": e.to_string()})
        }
    })
}

fn create(
    session: &CatalogSession,
    args: &Map<String, JsonValue>,
    type_name: &str,
    anchored: bool,
) -> Result<Option<String>> {
    let name = get_string_arg(args, "name")?;
    let mut attributes = serde_json::Map::new();
    attributes.insert("name".to_string(), json!(name));
    attributes.insert("qualifiedName".to_string(), json!(name));

    if let Some(description) = get_optional_string(args, "description") {
        attributes.insert("shortDescription".to_string(), json!(description));
    }
    if let Some(long_description) = get_optional_string(args, "long_description") {
        attributes.insert("longDescription".to_string(), json!(long_description));
    }
    if let Some(status) = get_optional_string(args, "certificate_status") {
        if !CERTIFICATE_STATUSES.contains(&status.as_str()) {
            return Err(McpError::InvalidArg {
                name: "certificate_status".to_string(),
                reason: format!("invalid certificate status: {}", status),
            });
        }
        attributes.insert("certificateStatus".to_string(), json!(status));
    }
    if let Some(owner_users) = string_list_param(args, "owner_users")? {
        attributes.insert("ownerUsers".to_string(), json!(owner_users));
    }
    if let Some(owner_groups) = string_list_param(args, "owner_groups")? {
        attributes.insert("ownerGroups".to_string(), json!(owner_groups));
    }

    let mut entity = json!({
        "typeName": type_name,
        "attributes": attributes
    });

    if anchored {
        let glossary_guid = get_string_arg(args, "glossary_guid")?;
        let mut relationships = serde_json::Map::new();
        relationships.insert(
            "anchor".to_string(),
            json!({"typeName": "AtlasGlossary", "guid": glossary_guid}),
        );
        if let Some(category_guids) = string_list_param(args, "category_guids")? {
            if !category_guids.is_empty() {
                let categories: Vec<JsonValue> = category_guids
                    .iter()
                    .map(|guid| json!({"typeName": "AtlasGlossaryCategory", "guid": guid}))
                    .collect();
                relationships.insert("categories".to_string(), JsonValue::Array(categories));
            }
        }
        entity["relationshipAttributes"] = JsonValue::Object(relationships);
    }

    tracing::info!(%type_name, %name, "creating glossary entity");
    let response = session.client().save_entities(vec![entity])?;

    // The catalog assigns the real GUID; surface the first assignment
    let guid = response
        .get("guidAssignments")
        .and_then(|v| v.as_object())
        .and_then(|m| m.values().next())
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    Ok(guid)
}
