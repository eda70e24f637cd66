//! Asset search tool.
//!
//! Tools: catalog_search_assets
//!
//! Compiles the caller's loosely-typed condition dictionaries into one
//! structured search request, executes it, and shapes the first page of
//! results. Unresolvable attributes and unknown operators drop their
//! condition with a warning; malformed input and remote failures are
//! returned to the caller as data (`error` field), never raised across the
//! tool boundary.

use serde_json::{json, Map, Value as JsonValue};

use crate::convert::{
    get_optional_bool, get_optional_string, get_optional_u64, object_param, string_list_param,
};
use crate::error::{McpError, Result};
use crate::fields::AttributeResolver;
use crate::query::{self, compound, Operator, SearchBuilder, SearchRequest, SortOrder};
use crate::session::CatalogSession;
use crate::tools::ToolDef;
use crate::typedefs::TypeDirectory;

/// Get all search tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![ToolDef::new(
        "catalog_search_assets",
        "Search catalog assets with flexible conditions. Dictionary parameters accept native \
         objects or JSON-encoded strings. Conditions map attribute names (snake_case or \
         camelCase; 'Set Name.property' addresses custom metadata) to a value, a list of \
         values, or {\"operator\": op, \"value\": v}. Operators: eq, neq, gt, gte, lt, lte, \
         startswith, contains, match, has_any_value, between, within. Returns one page of \
         results plus aggregations; errors are reported in the 'error' field.",
        json!({
            "type": "object",
            "properties": {
                "conditions": {
                    "description": "Attribute conditions to require (AND), object or JSON string",
                    "type": ["object", "string"]
                },
                "negative_conditions": {
                    "description": "Attribute conditions to exclude (AND NOT), object or JSON string",
                    "type": ["object", "string"]
                },
                "some_conditions": {
                    "description": "Conditions of which at least min_somes must match, object or JSON string",
                    "type": ["object", "string"]
                },
                "min_somes": {
                    "description": "Minimum number of some_conditions members that must match (default 1)",
                    "type": "integer"
                },
                "include_attributes": {
                    "description": "Attribute names to include on results, array or JSON string",
                    "type": ["array", "string"],
                    "items": { "type": "string" }
                },
                "asset_type": {
                    "description": "Exact asset type name, e.g. Table, Column, View",
                    "type": "string"
                },
                "include_archived": { "type": "boolean" },
                "limit": { "type": "integer" },
                "offset": { "type": "integer" },
                "sort_by": { "type": "string" },
                "sort_order": { "type": "string", "enum": ["ASC", "DESC"] },
                "connection_qualified_name": { "type": "string" },
                "tags": {
                    "description": "Match assets carrying at least one of these tags",
                    "type": ["array", "string"],
                    "items": { "type": "string" }
                },
                "directly_tagged": {
                    "description": "Restrict tag matches to direct (non-propagated) assignments (default true)",
                    "type": "boolean"
                },
                "domain_guids": {
                    "type": ["array", "string"],
                    "items": { "type": "string" }
                },
                "date_range": {
                    "description": "Per-attribute date bounds, e.g. {\"create_time\": {\"gte\": 1700000000000}}",
                    "type": ["object", "string"]
                },
                "guids": {
                    "type": ["array", "string"],
                    "items": { "type": "string" }
                }
            },
            "required": []
        }),
    )]
}

/// Dispatch a search tool call.
pub fn dispatch(
    session: &CatalogSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "catalog_search_assets" => Ok(search_assets(session, &args)),
        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}

/// Run a search, converting every failure into an error-as-data response.
///
/// The consumer is an LLM agent; an empty result with an error message is
/// actionable where a raised protocol error is not.
fn search_assets(session: &CatalogSession, args: &Map<String, JsonValue>) -> JsonValue {
    match run_search(session, args) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "asset search failed");
            json!({"results": [], "aggregations": {}, "error": e.to_string()})
        }
    }
}

fn run_search(session: &CatalogSession, args: &Map<String, JsonValue>) -> Result<JsonValue> {
    let directory = session.type_directory();
    let request = compile_request(&directory, args)?;

    tracing::debug!(request = %serde_json::to_string(&request).unwrap_or_default(), "executing search");
    let response = session.client().search(&request)?;
    tracing::debug!(
        count = response.entities.len(),
        total = response.approximate_count,
        "search completed"
    );

    Ok(json!({
        "results": response.entities,
        "aggregations": response.aggregations,
        "error": null
    }))
}

/// Compile the caller's parameters into a search request.
///
/// Predicate composition follows a fixed order so compiled requests are
/// deterministic: asset type, active filter, connection prefix, tags, domain
/// GUIDs, positive conditions, negative conditions, some-of-N conditions,
/// date ranges, GUID membership.
fn compile_request(
    directory: &TypeDirectory,
    args: &Map<String, JsonValue>,
) -> Result<SearchRequest> {
    let mut resolver = AttributeResolver::new(directory);
    let mut builder = SearchBuilder::new();

    if let Some(asset_type) = get_optional_string(args, "asset_type") {
        builder.filter(compound::asset_type(&asset_type));
    }

    if !get_optional_bool(args, "include_archived").unwrap_or(false) {
        builder.filter(compound::active_assets());
    }

    if let Some(connection) = get_optional_string(args, "connection_qualified_name") {
        builder.filter(compound::qualified_name_prefix(&connection));
    }

    if let Some(tags) = string_list_param(args, "tags")? {
        if !tags.is_empty() {
            let directly = get_optional_bool(args, "directly_tagged").unwrap_or(true);
            builder.filter(compound::tagged(&tags, directly));
        }
    }

    // Each domain GUID becomes its own required predicate. Multiple GUIDs
    // therefore AND together; kept as-is for compatibility with existing
    // callers even though it usually yields zero matches.
    if let Some(domain_guids) = string_list_param(args, "domain_guids")? {
        for guid in &domain_guids {
            if let Some(field) = resolver.resolve("domain_guids") {
                builder.filter(query::predicate(
                    &field,
                    Operator::Eq,
                    &json!(guid),
                    false,
                )?);
            }
        }
    }

    if let Some(conditions) = object_param(args, "conditions")? {
        apply_conditions(&mut builder, &mut resolver, &conditions, Polarity::Include)?;
    }

    if let Some(conditions) = object_param(args, "negative_conditions")? {
        apply_conditions(&mut builder, &mut resolver, &conditions, Polarity::Exclude)?;
    }

    if let Some(conditions) = object_param(args, "some_conditions")? {
        let applied = apply_some_conditions(&mut builder, &mut resolver, &conditions)?;
        if applied > 0 {
            builder.min_somes(get_optional_u64(args, "min_somes").unwrap_or(1));
        }
    }

    if let Some(ranges) = object_param(args, "date_range")? {
        apply_date_range(&mut builder, &mut resolver, &ranges)?;
    }

    if let Some(guids) = string_list_param(args, "guids")? {
        if !guids.is_empty() {
            if let Some(field) = resolver.resolve("guid") {
                builder.filter(query::predicate(
                    &field,
                    Operator::Within,
                    &json!(guids),
                    false,
                )?);
            }
        }
    }

    if let Some(names) = string_list_param(args, "include_attributes")? {
        for name in &names {
            match resolver.resolve_standard(name) {
                Some(field) => {
                    builder.include_attribute(field.attr_name);
                }
                None => tracing::warn!(attribute = %name, "unknown attribute for inclusion, skipping"),
            }
        }
    }

    // Searching on a custom-metadata field implies wanting it back: every set
    // referenced during condition compilation is included wholesale.
    for set_name in resolver.referenced_sets() {
        if let Some(set) = directory.find_set(set_name) {
            for attribute in &set.attributes {
                builder.include_attribute(&format!("{}.{}", set.name, attribute.name));
            }
        }
    }

    builder.page_size(get_optional_u64(args, "limit").unwrap_or(query::DEFAULT_PAGE_SIZE));
    if let Some(offset) = get_optional_u64(args, "offset") {
        builder.from_offset(offset);
    }

    if let Some(sort_by) = get_optional_string(args, "sort_by") {
        let order = SortOrder::parse(&get_optional_string(args, "sort_order").unwrap_or_default());
        match resolver.resolve_standard(&sort_by) {
            Some(field) => {
                builder.sort_by(field.search_field, order);
            }
            None => tracing::warn!(attribute = %sort_by, "unknown attribute for sorting, skipping sort"),
        }
    }

    Ok(builder.to_request())
}

#[derive(Clone, Copy, PartialEq)]
enum Polarity {
    Include,
    Exclude,
}

/// Fold one condition dictionary into the builder.
///
/// A condition value may be an `{operator, value, case_insensitive}` object,
/// a list (OR of per-element equality), the bare string `has_any_value`
/// under exclusion, or a scalar (equality).
fn apply_conditions(
    builder: &mut SearchBuilder,
    resolver: &mut AttributeResolver<'_>,
    conditions: &Map<String, JsonValue>,
    polarity: Polarity,
) -> Result<()> {
    let mut applied = 0usize;
    for (attr_name, condition) in conditions {
        let Some(field) = resolver.resolve(attr_name) else {
            tracing::warn!(attribute = %attr_name, "unknown attribute, skipping condition");
            continue;
        };

        let clause = match condition {
            JsonValue::Object(spec) => {
                let operator_name = spec
                    .get("operator")
                    .and_then(|v| v.as_str())
                    .unwrap_or("eq");
                let Some(operator) = Operator::parse(operator_name) else {
                    tracing::warn!(
                        attribute = %attr_name,
                        operator = %operator_name,
                        "unknown operator, skipping condition"
                    );
                    continue;
                };
                let value = spec.get("value").cloned().unwrap_or(JsonValue::Null);
                let case_insensitive = spec
                    .get("case_insensitive")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                query::predicate(&field, operator, &value, case_insensitive)?
            }
            JsonValue::Array(values) => query::or_of_eq(&field, values),
            JsonValue::String(s) if s == "has_any_value" && polarity == Polarity::Exclude => {
                // Bare-string form: exclude assets where the field is populated
                query::exists(&field.search_field())
            }
            scalar => query::predicate(&field, Operator::Eq, scalar, false)?,
        };

        match polarity {
            Polarity::Include => builder.filter(clause),
            Polarity::Exclude => builder.exclude(clause),
        };
        applied += 1;
    }
    let excluded = polarity == Polarity::Exclude;
    tracing::debug!(count = applied, excluded, "applied conditions");
    Ok(())
}

/// Fold the some-of-N condition dictionary into the builder's OR group.
///
/// List values expand into one group member per element, each counted
/// independently toward the minimum. Returns the number of members added.
fn apply_some_conditions(
    builder: &mut SearchBuilder,
    resolver: &mut AttributeResolver<'_>,
    conditions: &Map<String, JsonValue>,
) -> Result<usize> {
    let mut applied = 0usize;
    for (attr_name, condition) in conditions {
        let Some(field) = resolver.resolve(attr_name) else {
            tracing::warn!(attribute = %attr_name, "unknown attribute, skipping 'some' condition");
            continue;
        };

        match condition {
            JsonValue::Array(values) => {
                for value in values {
                    builder.some(query::predicate(&field, Operator::Eq, value, false)?);
                    applied += 1;
                }
            }
            JsonValue::Object(spec) => {
                let operator_name = spec
                    .get("operator")
                    .and_then(|v| v.as_str())
                    .unwrap_or("eq");
                let Some(operator) = Operator::parse(operator_name) else {
                    tracing::warn!(
                        attribute = %attr_name,
                        operator = %operator_name,
                        "unknown operator, skipping 'some' condition"
                    );
                    continue;
                };
                let value = spec.get("value").cloned().unwrap_or(JsonValue::Null);
                let case_insensitive = spec
                    .get("case_insensitive")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                builder.some(query::predicate(&field, operator, &value, case_insensitive)?);
                applied += 1;
            }
            scalar => {
                builder.some(query::predicate(&field, Operator::Eq, scalar, false)?);
                applied += 1;
            }
        }
    }
    Ok(applied)
}

/// Fold date-range bounds into the builder as independent AND predicates.
fn apply_date_range(
    builder: &mut SearchBuilder,
    resolver: &mut AttributeResolver<'_>,
    ranges: &Map<String, JsonValue>,
) -> Result<()> {
    for (attr_name, bounds) in ranges {
        let Some(field) = resolver.resolve(attr_name) else {
            tracing::warn!(attribute = %attr_name, "unknown attribute for date range, skipping");
            continue;
        };
        let Some(bounds) = bounds.as_object() else {
            tracing::warn!(attribute = %attr_name, "date range bounds must be an object, skipping");
            continue;
        };

        for (bound_name, value) in bounds {
            let operator = match Operator::parse(bound_name) {
                Some(op @ (Operator::Gte | Operator::Lte | Operator::Gt | Operator::Lt)) => op,
                _ => {
                    tracing::warn!(
                        attribute = %attr_name,
                        operator = %bound_name,
                        "unsupported operator for date range, skipping"
                    );
                    continue;
                }
            };
            builder.filter(query::predicate(&field, operator, value, false)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn compile(args: JsonValue) -> Result<SearchRequest> {
        let directory = directory();
        let map = match args {
            JsonValue::Object(map) => map,
            _ => unreachable!(),
        };
        compile_request(&directory, &map)
    }

    fn filters(request: &SearchRequest) -> Vec<JsonValue> {
        request.dsl["query"]["bool"]["filter"]
            .as_array()
            .cloned()
            .unwrap_or_default()
    }

    #[test]
    fn test_absent_and_empty_condition_dicts_compile_identically() {
        let bare = compile(json!({"asset_type": "Table"})).unwrap();
        let explicit = compile(json!({
            "asset_type": "Table",
            "conditions": {},
            "negative_conditions": {},
            "some_conditions": {}
        }))
        .unwrap();
        assert_eq!(bare, explicit);
    }

    #[test]
    fn test_asset_type_and_active_filters() {
        let request = compile(json!({"asset_type": "Table"})).unwrap();
        let active_filters = filters(&request);
        assert_eq!(
            active_filters[0],
            json!({"term": {"__typeName.keyword": {"value": "Table"}}})
        );
        assert_eq!(active_filters[1], json!({"term": {"__state": {"value": "ACTIVE"}}}));

        let archived = compile(json!({"asset_type": "Table", "include_archived": true})).unwrap();
        assert_eq!(filters(&archived).len(), 1);
    }

    #[test]
    fn test_conditions_accept_json_string_form() {
        let native = compile(json!({
            "conditions": {"certificate_status": "VERIFIED"}
        }))
        .unwrap();
        let stringly = compile(json!({
            "conditions": "{\"certificate_status\": \"VERIFIED\"}"
        }))
        .unwrap();
        assert_eq!(native, stringly);
        assert!(filters(&native)
            .contains(&json!({"term": {"certificateStatus": {"value": "VERIFIED"}}})));
    }

    #[test]
    fn test_malformed_conditions_json_is_an_error() {
        let err = compile(json!({"conditions": "{bad json"})).unwrap_err();
        assert!(matches!(err, McpError::InvalidArg { .. }));
    }

    #[test]
    fn test_unknown_attribute_and_operator_are_skipped() {
        let request = compile(json!({
            "conditions": {
                "certificate_status": "VERIFIED",
                "no_such_attribute": "x",
                "name": {"operator": "frobnicate", "value": "y"}
            }
        }))
        .unwrap();
        // Only the certificate_status condition survives alongside the active filter
        assert_eq!(filters(&request).len(), 2);
    }

    #[test]
    fn test_malformed_between_is_an_error_not_a_skip() {
        let err = compile(json!({
            "conditions": {"create_time": {"operator": "between", "value": [1]}}
        }))
        .unwrap_err();
        assert!(matches!(err, McpError::InvalidArg { .. }));
    }

    #[test]
    fn test_list_value_compiles_to_or_of_eq() {
        let request = compile(json!({
            "conditions": {"owner_users": ["alice", "bob"]}
        }))
        .unwrap();
        assert!(filters(&request).contains(&json!({
            "bool": {
                "should": [
                    {"term": {"ownerUsers": {"value": "alice"}}},
                    {"term": {"ownerUsers": {"value": "bob"}}}
                ],
                "minimum_should_match": 1
            }
        })));
    }

    #[test]
    fn test_negative_has_any_value_excludes_populated_fields() {
        let request = compile(json!({
            "negative_conditions": {"description": "has_any_value"}
        }))
        .unwrap();
        assert_eq!(
            request.dsl["query"]["bool"]["must_not"],
            json!([{"exists": {"field": "description.keyword"}}])
        );
    }

    #[test]
    fn test_negative_operator_form_matches_bare_string_form() {
        let bare = compile(json!({
            "negative_conditions": {"description": "has_any_value"}
        }))
        .unwrap();
        let spelled = compile(json!({
            "negative_conditions": {"description": {"operator": "has_any_value"}}
        }))
        .unwrap();
        assert_eq!(bare, spelled);
    }

    #[test]
    fn test_some_conditions_expand_lists_and_set_minimum() {
        let request = compile(json!({
            "some_conditions": {"certificate_status": ["DRAFT", "VERIFIED"]},
            "min_somes": 1
        }))
        .unwrap();
        let query = &request.dsl["query"]["bool"];
        assert_eq!(
            query["should"],
            json!([
                {"term": {"certificateStatus": {"value": "DRAFT"}}},
                {"term": {"certificateStatus": {"value": "VERIFIED"}}}
            ])
        );
        assert_eq!(query["minimum_should_match"], json!(1));
    }

    #[test]
    fn test_domain_guids_combine_with_and_semantics() {
        let request = compile(json!({"domain_guids": ["g1", "g2"]})).unwrap();
        let filters = filters(&request);
        assert!(filters.contains(&json!({"term": {"domainGUIDs": {"value": "g1"}}})));
        assert!(filters.contains(&json!({"term": {"domainGUIDs": {"value": "g2"}}})));
    }

    #[test]
    fn test_connection_and_tag_filters() {
        let request = compile(json!({
            "connection_qualified_name": "default/snowflake/prod",
            "tags": ["PII"],
            "directly_tagged": true
        }))
        .unwrap();
        let filters = filters(&request);
        assert!(filters
            .contains(&json!({"prefix": {"qualifiedName": {"value": "default/snowflake/prod"}}})));
        assert!(filters.contains(&json!({"terms": {"__traitNames": ["PII"]}})));
    }

    #[test]
    fn test_date_range_bounds_become_independent_filters() {
        let request = compile(json!({
            "date_range": {"create_time": {"gte": 100, "lte": 200, "bogus": 1}}
        }))
        .unwrap();
        let filters = filters(&request);
        assert!(filters.contains(&json!({"range": {"__timestamp": {"gte": 100}}})));
        assert!(filters.contains(&json!({"range": {"__timestamp": {"lte": 200}}})));
        // active filter + two range bounds; the bogus sub-key is skipped
        assert_eq!(filters.len(), 3);
    }

    #[test]
    fn test_guids_filter_uses_membership() {
        let request = compile(json!({"guids": ["g1", "g2"]})).unwrap();
        assert!(filters(&request).contains(&json!({"terms": {"__guid": ["g1", "g2"]}})));
    }

    #[test]
    fn test_referenced_custom_metadata_sets_are_auto_included() {
        let request = compile(json!({
            "conditions": {"Data Classification.sensitivity_level": "sensitive"}
        }))
        .unwrap();

        assert!(filters(&request).contains(
            &json!({"term": {"dataClassification.sensitivity_level": {"value": "sensitive"}}})
        ));
        // The whole referenced set is requested even though include_attributes is absent
        assert!(request
            .attributes
            .contains(&"dataClassification.sensitivity_level".to_string()));
        assert!(request
            .attributes
            .contains(&"dataClassification.reviewed_by".to_string()));
    }

    #[test]
    fn test_include_attributes_resolve_and_skip_unknown() {
        let request = compile(json!({
            "include_attributes": ["name", "certificateStatus", "no_such"]
        }))
        .unwrap();
        assert_eq!(
            request.attributes,
            vec![
                "qualifiedName".to_string(),
                "name".to_string(),
                "certificateStatus".to_string()
            ]
        );
    }

    #[test]
    fn test_pagination_and_sorting() {
        let request = compile(json!({
            "limit": 50,
            "offset": 100,
            "sort_by": "popularityScore",
            "sort_order": "DESC"
        }))
        .unwrap();
        assert_eq!(request.dsl["size"], json!(50));
        assert_eq!(request.dsl["from"], json!(100));
        assert_eq!(
            request.dsl["sort"],
            json!([{"popularityScore": {"order": "desc"}}])
        );
    }

    #[test]
    fn test_unresolvable_sort_attribute_skips_sorting() {
        let request = compile(json!({
            "sort_by": "Data Classification.sensitivity_level",
            "sort_order": "DESC"
        }))
        .unwrap();
        assert_eq!(request.dsl.get("sort"), None);
    }
}
