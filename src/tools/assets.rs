//! Asset update tool.
//!
//! Tools: catalog_update_assets

use serde::Deserialize;
use serde_json::{json, Map, Value as JsonValue};

use crate::convert::{get_string_arg, json_param};
use crate::error::{McpError, Result};
use crate::session::CatalogSession;
use crate::tools::ToolDef;

/// Certificate statuses accepted by the catalog.
pub(crate) const CERTIFICATE_STATUSES: &[&str] = &["VERIFIED", "DRAFT", "DEPRECATED"];

/// Attributes that may be updated through this tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdatableAttribute {
    UserDescription,
    CertificateStatus,
}

impl UpdatableAttribute {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "user_description" => Some(UpdatableAttribute::UserDescription),
            "certificate_status" => Some(UpdatableAttribute::CertificateStatus),
            _ => None,
        }
    }

    fn api_name(self) -> &'static str {
        match self {
            UpdatableAttribute::UserDescription => "userDescription",
            UpdatableAttribute::CertificateStatus => "certificateStatus",
        }
    }
}

/// Identity of an asset to update.
#[derive(Debug, Deserialize)]
struct UpdatableAsset {
    guid: String,
    name: String,
    qualified_name: String,
    type_name: String,
}

/// Get all asset update tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![ToolDef::new(
        "catalog_update_assets",
        "Update one attribute across one or more assets. Supported attributes: \
         user_description, certificate_status (values VERIFIED, DRAFT or DEPRECATED). \
         Pass one attribute value per asset, in the same order. Each asset needs guid, \
         name, qualified_name and type_name.",
        json!({
            "type": "object",
            "properties": {
                "assets": {
                    "description": "Asset identity or list of identities, object/array or JSON string",
                    "type": ["object", "array", "string"]
                },
                "attribute_name": {
                    "type": "string",
                    "enum": ["user_description", "certificate_status"]
                },
                "attribute_values": {
                    "description": "One value per asset, array or JSON string",
                    "type": ["array", "string"],
                    "items": { "type": "string" }
                }
            },
            "required": ["assets", "attribute_name", "attribute_values"]
        }),
    )]
}

/// Dispatch an asset update tool call.
pub fn dispatch(
    session: &CatalogSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "catalog_update_assets" => Ok(update_assets(session, &args)),
        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}

fn update_assets(session: &CatalogSession, args: &Map<String, JsonValue>) -> JsonValue {
    match run_update(session, args) {
        Ok(updated_count) => json!({"updated_count": updated_count, "errors": []}),
        Err(e) => {
            tracing::error!(error = %e, "asset update failed");
            json!({"updated_count": 0, "errors": [e.to_string()]})
        }
    }
}

fn run_update(session: &CatalogSession, args: &Map<String, JsonValue>) -> Result<u64> {
    let attribute_name = get_string_arg(args, "attribute_name")?;
    let attribute =
        UpdatableAttribute::parse(&attribute_name).ok_or_else(|| McpError::InvalidArg {
            name: "attribute_name".to_string(),
            reason: format!(
                "only user_description and certificate_status can be updated, got {}",
                attribute_name
            ),
        })?;

    let assets = parse_assets(args)?;
    let values = parse_values(args)?;

    if assets.len() != values.len() {
        return Err(McpError::InvalidArg {
            name: "attribute_values".to_string(),
            reason: "number of assets must match number of attribute values".to_string(),
        });
    }

    if attribute == UpdatableAttribute::CertificateStatus {
        for value in &values {
            if !CERTIFICATE_STATUSES.contains(&value.as_str()) {
                return Err(McpError::InvalidArg {
                    name: "attribute_values".to_string(),
                    reason: format!("invalid certificate status: {}", value),
                });
            }
        }
    }

    tracing::info!(
        count = assets.len(),
        attribute = %attribute_name,
        "updating assets"
    );

    let api_name = attribute.api_name();
    let entities: Vec<JsonValue> = assets
        .iter()
        .zip(&values)
        .map(|(asset, value)| {
            json!({
                "typeName": asset.type_name,
                "guid": asset.guid,
                "attributes": {
                    "qualifiedName": asset.qualified_name,
                    "name": asset.name,
                    api_name: value
                }
            })
        })
        .collect();

    let response = session.client().save_entities(entities)?;
    let updated = response
        .get("guidAssignments")
        .and_then(|v| v.as_object())
        .map(|m| m.len() as u64)
        .unwrap_or(0);

    tracing::info!(updated, "asset update completed");
    Ok(updated)
}

fn parse_assets(args: &Map<String, JsonValue>) -> Result<Vec<UpdatableAsset>> {
    let raw = json_param(args, "assets")?
        .ok_or_else(|| McpError::MissingArg("assets".to_string()))?;

    let items = match raw {
        JsonValue::Array(items) => items,
        obj @ JsonValue::Object(_) => vec![obj],
        other => {
            return Err(McpError::InvalidArg {
                name: "assets".to_string(),
                reason: format!("expected an object or list of objects, got {}", other),
            })
        }
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item).map_err(|e| McpError::InvalidArg {
                name: "assets".to_string(),
                reason: format!(
                    "each asset needs guid, name, qualified_name and type_name: {}",
                    e
                ),
            })
        })
        .collect()
}

fn parse_values(args: &Map<String, JsonValue>) -> Result<Vec<String>> {
    let raw = json_param(args, "attribute_values")?
        .ok_or_else(|| McpError::MissingArg("attribute_values".to_string()))?;

    match raw {
        JsonValue::Array(items) => items
            .into_iter()
            .map(|v| match v {
                JsonValue::String(s) => Ok(s),
                other => Err(McpError::InvalidArg {
                    name: "attribute_values".to_string(),
                    reason: format!("expected string values, got {}", other),
                }),
            })
            .collect(),
        JsonValue::String(s) => Ok(vec![s]),
        other => Err(McpError::InvalidArg {
            name: "attribute_values".to_string(),
            reason: format!("expected a list of strings, got {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_updatable_attribute() {
        assert_eq!(
            UpdatableAttribute::parse("user_description"),
            Some(UpdatableAttribute::UserDescription)
        );
        assert_eq!(
            UpdatableAttribute::parse("certificate_status"),
            Some(UpdatableAttribute::CertificateStatus)
        );
        assert_eq!(UpdatableAttribute::parse("owner_users"), None);
    }

    #[test]
    fn test_parse_assets_accepts_single_object_and_list() {
        let single = json!({
            "assets": {
                "guid": "g1",
                "name": "orders",
                "qualified_name": "default/db/orders",
                "type_name": "Table"
            }
        });
        let args = match single {
            JsonValue::Object(map) => map,
            _ => unreachable!(),
        };
        let parsed = parse_assets(&args).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].type_name, "Table");

        let missing_fields = json!({"assets": {"guid": "g1"}});
        let args = match missing_fields {
            JsonValue::Object(map) => map,
            _ => unreachable!(),
        };
        assert!(parse_assets(&args).is_err());
    }

    #[test]
    fn test_parse_values_from_json_string() {
        let args = match json!({"attribute_values": "[\"VERIFIED\", \"DRAFT\"]"}) {
            JsonValue::Object(map) => map,
            _ => unreachable!(),
        };
        assert_eq!(
            parse_values(&args).unwrap(),
            vec!["VERIFIED".to_string(), "DRAFT".to_string()]
        );
    }
}
