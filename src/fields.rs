//! Attribute resolution.
//!
//! Maps human-readable attribute names to queryable field handles. Undotted
//! names resolve against a fixed table of standard asset attributes; dotted
//! names (`Set Name.property`) resolve against the live custom-metadata type
//! directory. Successful custom-metadata resolutions are recorded so the
//! result shaper can auto-include the referenced sets.

use std::collections::BTreeSet;

use crate::typedefs::TypeDirectory;

/// A standard attribute of the asset schema.
#[derive(Debug)]
pub struct StandardField {
    /// Canonical snake_case name.
    pub name: &'static str,
    /// Attribute name used when requesting the field on results.
    pub attr_name: &'static str,
    /// Indexed field used for exact and range predicates.
    pub search_field: &'static str,
    /// Analyzed field used for full-text `match`, when one exists.
    pub text_field: Option<&'static str>,
}

/// A property of a custom-metadata set, carrying its originating set name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomMetadataField {
    /// Internal name of the owning set.
    pub set_name: String,
    /// Internal property name within the set.
    pub property: String,
}

/// A resolved, queryable field handle.
#[derive(Debug, Clone)]
pub enum FieldDescriptor {
    /// A static attribute of the asset schema.
    Standard(&'static StandardField),
    /// A property of a custom-metadata set.
    CustomMetadata(CustomMetadataField),
}

impl FieldDescriptor {
    /// Field path used for exact, range and membership predicates.
    pub fn search_field(&self) -> String {
        match self {
            FieldDescriptor::Standard(field) => field.search_field.to_string(),
            FieldDescriptor::CustomMetadata(cm) => format!("{}.{}", cm.set_name, cm.property),
        }
    }

    /// Field path used for full-text `match` predicates.
    pub fn text_field(&self) -> String {
        match self {
            FieldDescriptor::Standard(field) => field
                .text_field
                .unwrap_or(field.search_field)
                .to_string(),
            FieldDescriptor::CustomMetadata(cm) => format!("{}.{}", cm.set_name, cm.property),
        }
    }
}

/// Standard attributes of the asset schema.
///
/// `search_field` paths follow the catalog's search index: system-managed
/// fields are double-underscore prefixed, text fields expose a `.keyword`
/// subfield for exact matching.
pub static STANDARD_FIELDS: &[StandardField] = &[
    StandardField { name: "name", attr_name: "name", search_field: "name.keyword", text_field: Some("name") },
    StandardField { name: "display_name", attr_name: "displayName", search_field: "displayName.keyword", text_field: Some("displayName") },
    StandardField { name: "description", attr_name: "description", search_field: "description.keyword", text_field: Some("description") },
    StandardField { name: "user_description", attr_name: "userDescription", search_field: "userDescription.keyword", text_field: Some("userDescription") },
    StandardField { name: "qualified_name", attr_name: "qualifiedName", search_field: "qualifiedName", text_field: None },
    StandardField { name: "type_name", attr_name: "__typeName", search_field: "__typeName.keyword", text_field: Some("__typeName") },
    StandardField { name: "guid", attr_name: "__guid", search_field: "__guid", text_field: None },
    StandardField { name: "state", attr_name: "__state", search_field: "__state", text_field: None },
    StandardField { name: "certificate_status", attr_name: "certificateStatus", search_field: "certificateStatus", text_field: None },
    StandardField { name: "connector_name", attr_name: "connectorName", search_field: "connectorName", text_field: None },
    StandardField { name: "connection_qualified_name", attr_name: "connectionQualifiedName", search_field: "connectionQualifiedName", text_field: None },
    StandardField { name: "owner_users", attr_name: "ownerUsers", search_field: "ownerUsers", text_field: None },
    StandardField { name: "owner_groups", attr_name: "ownerGroups", search_field: "ownerGroups", text_field: None },
    StandardField { name: "admin_users", attr_name: "adminUsers", search_field: "adminUsers", text_field: None },
    StandardField { name: "admin_groups", attr_name: "adminGroups", search_field: "adminGroups", text_field: None },
    StandardField { name: "created_by", attr_name: "__createdBy", search_field: "__createdBy", text_field: None },
    StandardField { name: "updated_by", attr_name: "__modifiedBy", search_field: "__modifiedBy", text_field: None },
    StandardField { name: "create_time", attr_name: "__timestamp", search_field: "__timestamp", text_field: None },
    StandardField { name: "update_time", attr_name: "__modificationTimestamp", search_field: "__modificationTimestamp", text_field: None },
    StandardField { name: "source_created_at", attr_name: "sourceCreatedAt", search_field: "sourceCreatedAt", text_field: None },
    StandardField { name: "source_updated_at", attr_name: "sourceUpdatedAt", search_field: "sourceUpdatedAt", text_field: None },
    StandardField { name: "has_lineage", attr_name: "__hasLineage", search_field: "__hasLineage", text_field: None },
    StandardField { name: "asset_tags", attr_name: "assetTags", search_field: "assetTags", text_field: None },
    StandardField { name: "announcement_title", attr_name: "announcementTitle", search_field: "announcementTitle", text_field: Some("announcementTitle") },
    StandardField { name: "announcement_message", attr_name: "announcementMessage", search_field: "announcementMessage", text_field: Some("announcementMessage") },
    StandardField { name: "announcement_type", attr_name: "announcementType", search_field: "announcementType", text_field: None },
    StandardField { name: "popularity_score", attr_name: "popularityScore", search_field: "popularityScore", text_field: None },
    StandardField { name: "starred_by", attr_name: "starredBy", search_field: "starredBy", text_field: None },
    StandardField { name: "starred_count", attr_name: "starredCount", search_field: "starredCount", text_field: None },
    StandardField { name: "domain_guids", attr_name: "domainGUIDs", search_field: "domainGUIDs", text_field: None },
    StandardField { name: "asset_policy_guids", attr_name: "assetPolicyGUIDs", search_field: "assetPolicyGUIDs", text_field: None },
    StandardField { name: "term_type", attr_name: "termType", search_field: "termType", text_field: None },
];

/// Normalize an attribute name for table lookup.
///
/// Accepts snake_case, SCREAMING_SNAKE, camelCase and space-separated forms:
/// `certificateStatus`, `CERTIFICATE_STATUS` and `Certificate Status` all
/// normalize to `certificate_status`.
pub fn normalize_attribute_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.trim().chars() {
        if ch == ' ' || ch == '-' {
            if !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        } else if ch.is_ascii_uppercase() {
            if prev_lower && !out.ends_with('_') {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else {
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
            out.push(ch);
        }
    }
    out
}

/// Look up a standard attribute by any accepted spelling.
pub fn lookup_standard(name: &str) -> Option<&'static StandardField> {
    let normalized = normalize_attribute_name(name);
    STANDARD_FIELDS.iter().find(|f| f.name == normalized)
}

/// Per-invocation attribute resolver.
///
/// Holds the referenced custom-metadata set accumulator; its lifetime is one
/// search invocation.
pub struct AttributeResolver<'a> {
    directory: &'a TypeDirectory,
    referenced_sets: BTreeSet<String>,
}

impl<'a> AttributeResolver<'a> {
    /// Create a resolver over the given type directory.
    pub fn new(directory: &'a TypeDirectory) -> Self {
        Self {
            directory,
            referenced_sets: BTreeSet::new(),
        }
    }

    /// Resolve an attribute name to a field handle.
    ///
    /// Dotted names resolve as `SetName.property` custom metadata; on success
    /// the set name is recorded for later result auto-inclusion. Returns
    /// `None` when either segment (or an undotted name) is unknown.
    pub fn resolve(&mut self, name: &str) -> Option<FieldDescriptor> {
        if let Some((set_part, property_part)) = name.split_once('.') {
            let set = self.directory.find_set(set_part)?;
            let attribute = set.find_attribute(property_part)?;
            let field = CustomMetadataField {
                set_name: set.name.clone(),
                property: attribute.name.clone(),
            };
            self.referenced_sets.insert(set.name.clone());
            return Some(FieldDescriptor::CustomMetadata(field));
        }

        lookup_standard(name).map(FieldDescriptor::Standard)
    }

    /// Resolve a standard attribute only, without touching the accumulator.
    ///
    /// Used for sort attributes: custom metadata is not sortable.
    pub fn resolve_standard(&self, name: &str) -> Option<&'static StandardField> {
        if name.contains('.') {
            return None;
        }
        lookup_standard(name)
    }

    /// Custom-metadata sets referenced so far, in deterministic order.
    pub fn referenced_sets(&self) -> &BTreeSet<String> {
        &self.referenced_sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn directory() -> TypeDirectory {
        TypeDirectory::from_typedefs(
            &json!({
                "businessMetadataDefs": [{
                    "name": "dataClassification",
                    "displayName": "Data Classification",
                    "attributeDefs": [
                        {"name": "sensitivity_level", "typeName": "string"},
                        {"name": "reviewed_by", "typeName": "string"}
                    ]
                }]
            }),
            &json!({}),
        )
    }

    #[test]
    fn test_normalize_attribute_name() {
        assert_eq!(normalize_attribute_name("certificate_status"), "certificate_status");
        assert_eq!(normalize_attribute_name("certificateStatus"), "certificate_status");
        assert_eq!(normalize_attribute_name("CERTIFICATE_STATUS"), "certificate_status");
        assert_eq!(normalize_attribute_name("Popularity Score"), "popularity_score");
    }

    #[test]
    fn test_resolve_standard_attribute() {
        let dir = TypeDirectory::empty();
        let mut resolver = AttributeResolver::new(&dir);

        let field = resolver.resolve("certificateStatus").unwrap();
        assert_eq!(field.search_field(), "certificateStatus");
        assert!(resolver.referenced_sets().is_empty());
    }

    #[test]
    fn test_resolve_unknown_attribute() {
        let dir = TypeDirectory::empty();
        let mut resolver = AttributeResolver::new(&dir);
        assert!(resolver.resolve("no_such_attribute").is_none());
    }

    #[test]
    fn test_resolve_custom_metadata_records_set() {
        let dir = directory();
        let mut resolver = AttributeResolver::new(&dir);

        let field = resolver
            .resolve("Data Classification.sensitivity_level")
            .unwrap();
        assert_eq!(field.search_field(), "dataClassification.sensitivity_level");
        assert_eq!(
            resolver.referenced_sets().iter().collect::<Vec<_>>(),
            vec!["dataClassification"]
        );
    }

    #[test]
    fn test_resolve_custom_metadata_unknown_segment() {
        let dir = directory();
        let mut resolver = AttributeResolver::new(&dir);

        assert!(resolver.resolve("No Such Set.sensitivity_level").is_none());
        assert!(resolver.resolve("Data Classification.no_such_property").is_none());
        assert!(resolver.referenced_sets().is_empty());
    }

    #[test]
    fn test_sort_resolution_is_standard_only() {
        let dir = directory();
        let resolver = AttributeResolver::new(&dir);

        assert!(resolver.resolve_standard("popularityScore").is_some());
        assert!(resolver
            .resolve_standard("Data Classification.sensitivity_level")
            .is_none());
    }

    #[test]
    fn test_text_field_falls_back_to_search_field() {
        let field = lookup_standard("certificate_status").unwrap();
        let descriptor = FieldDescriptor::Standard(field);
        assert_eq!(descriptor.text_field(), "certificateStatus");

        let name = FieldDescriptor::Standard(lookup_standard("name").unwrap());
        assert_eq!(name.text_field(), "name");
        assert_eq!(name.search_field(), "name.keyword");
    }
}
