//! Custom-metadata type directory.
//!
//! Parses the catalog's live typedef responses (business-metadata sets and
//! enums) into the lookup structure the attribute resolver queries. The
//! directory is advisory metadata: it is cached per session and refreshed on
//! demand.

use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// One property within a custom-metadata set.
#[derive(Debug, Clone)]
pub struct CustomMetadataAttribute {
    /// Internal property name.
    pub name: String,
    /// Human-facing display name, if different.
    pub display_name: Option<String>,
    /// Declared type name (`string`, `int`, an enum type, ...).
    pub type_name: Option<String>,
    /// Allowed values for enum-typed properties, from the enum typedefs.
    pub enum_values: Option<Vec<String>>,
}

/// A named custom-metadata set and its properties.
#[derive(Debug, Clone)]
pub struct CustomMetadataSet {
    /// Internal set name.
    pub name: String,
    /// Human-facing display name, if different.
    pub display_name: Option<String>,
    /// Properties declared on the set.
    pub attributes: Vec<CustomMetadataAttribute>,
}

impl CustomMetadataSet {
    /// Look up a property by internal or display name, case-insensitively.
    pub fn find_attribute(&self, name: &str) -> Option<&CustomMetadataAttribute> {
        let wanted = name.trim();
        self.attributes.iter().find(|attr| {
            attr.name.eq_ignore_ascii_case(wanted)
                || attr
                    .display_name
                    .as_deref()
                    .is_some_and(|d| d.eq_ignore_ascii_case(wanted))
        })
    }
}

/// Directory of all custom-metadata sets known to the catalog.
#[derive(Debug, Clone, Default)]
pub struct TypeDirectory {
    sets: Vec<CustomMetadataSet>,
}

impl TypeDirectory {
    /// An empty directory. Used before the first successful fetch.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a directory from the raw typedef responses.
    ///
    /// `business_metadata` is the `type=BUSINESS_METADATA` response and
    /// `enums` the `type=ENUM` response. Malformed entries are skipped.
    pub fn from_typedefs(business_metadata: &JsonValue, enums: &JsonValue) -> Self {
        let enum_lookup = parse_enum_values(enums);

        let mut sets = Vec::new();
        let defs = business_metadata
            .get("businessMetadataDefs")
            .and_then(|v| v.as_array())
            .map(|a| a.as_slice())
            .unwrap_or(&[]);

        for def in defs {
            let Some(name) = def.get("name").and_then(|v| v.as_str()) else {
                tracing::warn!("skipping business-metadata def without a name");
                continue;
            };

            let attributes = def
                .get("attributeDefs")
                .and_then(|v| v.as_array())
                .map(|a| a.as_slice())
                .unwrap_or(&[])
                .iter()
                .filter_map(|attr| parse_attribute(attr, &enum_lookup))
                .collect();

            sets.push(CustomMetadataSet {
                name: name.to_string(),
                display_name: def
                    .get("displayName")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string()),
                attributes,
            });
        }

        tracing::debug!(set_count = sets.len(), "parsed custom-metadata directory");
        Self { sets }
    }

    /// All known sets.
    pub fn sets(&self) -> &[CustomMetadataSet] {
        &self.sets
    }

    /// Look up a set by internal or display name, case-insensitively.
    pub fn find_set(&self, name: &str) -> Option<&CustomMetadataSet> {
        let wanted = name.trim();
        self.sets.iter().find(|set| {
            set.name.eq_ignore_ascii_case(wanted)
                || set
                    .display_name
                    .as_deref()
                    .is_some_and(|d| d.eq_ignore_ascii_case(wanted))
        })
    }
}

/// Extract `enum name -> allowed values` from the ENUM typedef response.
fn parse_enum_values(enums: &JsonValue) -> HashMap<String, Vec<String>> {
    let mut lookup = HashMap::new();
    let defs = enums
        .get("enumDefs")
        .and_then(|v| v.as_array())
        .map(|a| a.as_slice())
        .unwrap_or(&[]);

    for def in defs {
        let Some(name) = def.get("name").and_then(|v| v.as_str()) else {
            continue;
        };
        let values: Vec<String> = def
            .get("elementDefs")
            .and_then(|v| v.as_array())
            .map(|a| a.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(|e| e.get("value").and_then(|v| v.as_str()))
            .map(|s| s.to_string())
            .collect();
        lookup.insert(name.to_string(), values);
    }
    lookup
}

fn parse_attribute(
    attr: &JsonValue,
    enum_lookup: &HashMap<String, Vec<String>>,
) -> Option<CustomMetadataAttribute> {
    let name = attr.get("name").and_then(|v| v.as_str())?;

    // Enum-typed properties declare isEnum/enumType in their options map
    let options = attr.get("options");
    let is_enum = options
        .and_then(|o| o.get("isEnum"))
        .and_then(|v| v.as_str())
        .is_some_and(|v| v == "true");
    let enum_values = if is_enum {
        options
            .and_then(|o| o.get("enumType"))
            .and_then(|v| v.as_str())
            .and_then(|enum_type| enum_lookup.get(enum_type))
            .cloned()
    } else {
        None
    };

    Some(CustomMetadataAttribute {
        name: name.to_string(),
        display_name: attr
            .get("displayName")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        type_name: attr
            .get("typeName")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        enum_values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_directory() -> TypeDirectory {
        let business_metadata = json!({
            "businessMetadataDefs": [
                {
                    "name": "dataClassification",
                    "displayName": "Data Classification",
                    "attributeDefs": [
                        {
                            "name": "sensitivity_level",
                            "displayName": "Sensitivity Level",
                            "typeName": "SensitivityEnum",
                            "options": {"isEnum": "true", "enumType": "SensitivityEnum"}
                        },
                        {"name": "reviewed_by", "typeName": "string"}
                    ]
                },
                {"name": "Quality", "attributeDefs": []}
            ]
        });
        let enums = json!({
            "enumDefs": [
                {
                    "name": "SensitivityEnum",
                    "elementDefs": [
                        {"value": "public"},
                        {"value": "internal"},
                        {"value": "sensitive"}
                    ]
                }
            ]
        });
        TypeDirectory::from_typedefs(&business_metadata, &enums)
    }

    #[test]
    fn test_parses_sets_and_attributes() {
        let directory = sample_directory();
        assert_eq!(directory.sets().len(), 2);

        let set = directory.find_set("dataClassification").unwrap();
        assert_eq!(set.attributes.len(), 2);
        let attr = set.find_attribute("sensitivity_level").unwrap();
        assert_eq!(
            attr.enum_values.as_deref(),
            Some(&["public".to_string(), "internal".to_string(), "sensitive".to_string()][..])
        );
    }

    #[test]
    fn test_set_lookup_by_display_name_case_insensitive() {
        let directory = sample_directory();
        assert!(directory.find_set("data classification").is_some());
        assert!(directory.find_set("DATACLASSIFICATION").is_some());
        assert!(directory.find_set("unknown").is_none());
    }

    #[test]
    fn test_attribute_lookup_by_display_name() {
        let directory = sample_directory();
        let set = directory.find_set("Data Classification").unwrap();
        assert!(set.find_attribute("Sensitivity Level").is_some());
        assert!(set.find_attribute("nope").is_none());
    }

    #[test]
    fn test_malformed_defs_are_skipped() {
        let directory = TypeDirectory::from_typedefs(
            &json!({"businessMetadataDefs": [{"displayName": "no internal name"}]}),
            &json!({}),
        );
        assert!(directory.sets().is_empty());
    }
}
