//! Query construction.
//!
//! Translates resolved field handles, operators and values into boolean
//! clauses of the catalog's search DSL, and accumulates them in a
//! [`SearchBuilder`]: required predicates (AND), excluded predicates
//! (AND NOT) and a some-of-N group with a minimum match count. The builder is
//! append-only; [`SearchBuilder::to_request`] finalizes it into the request
//! document submitted to the search endpoint.

use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use crate::error::{McpError, Result};
use crate::fields::FieldDescriptor;

/// Condition operators, closed set.
///
/// Operator names on the wire are case-sensitive; anything unparseable is
/// skipped by the caller rather than failing the whole search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Exact equality.
    Eq,
    /// Inequality.
    Neq,
    /// Strictly greater.
    Gt,
    /// Greater or equal.
    Gte,
    /// Strictly less.
    Lt,
    /// Less or equal.
    Lte,
    /// String prefix match.
    StartsWith,
    /// Substring match.
    Contains,
    /// Full-text match.
    Match,
    /// Field is populated; the condition value is ignored.
    HasAnyValue,
    /// Inclusive `[min, max]` range.
    Between,
    /// Membership in a list of values.
    Within,
}

impl Operator {
    /// Parse a wire operator name. Case-sensitive.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "eq" => Some(Operator::Eq),
            "neq" => Some(Operator::Neq),
            "gt" => Some(Operator::Gt),
            "gte" => Some(Operator::Gte),
            "lt" => Some(Operator::Lt),
            "lte" => Some(Operator::Lte),
            "startswith" => Some(Operator::StartsWith),
            "contains" => Some(Operator::Contains),
            "match" => Some(Operator::Match),
            "has_any_value" => Some(Operator::HasAnyValue),
            "between" => Some(Operator::Between),
            "within" => Some(Operator::Within),
            _ => None,
        }
    }
}

/// Build a single boolean clause for `field <operator> value`.
///
/// The returned clause is the positive form; exclusion is handled by the
/// builder placing it in the `must_not` group. Malformed `between`/`within`
/// value shapes are errors, not skips.
pub fn predicate(
    field: &FieldDescriptor,
    operator: Operator,
    value: &JsonValue,
    case_insensitive: bool,
) -> Result<JsonValue> {
    let search_field = field.search_field();
    match operator {
        Operator::Eq => Ok(term(&search_field, value, case_insensitive)),
        Operator::Neq => Ok(json!({
            "bool": {"must_not": [term(&search_field, value, case_insensitive)]}
        })),
        Operator::Gt => Ok(range(&search_field, "gt", value)),
        Operator::Gte => Ok(range(&search_field, "gte", value)),
        Operator::Lt => Ok(range(&search_field, "lt", value)),
        Operator::Lte => Ok(range(&search_field, "lte", value)),
        Operator::StartsWith => {
            let text = string_value(value, "startswith")?;
            let mut body = json!({"value": text});
            if case_insensitive {
                body["case_insensitive"] = json!(true);
            }
            Ok(json!({"prefix": {search_field: body}}))
        }
        Operator::Contains => {
            let text = string_value(value, "contains")?;
            let mut body = json!({"value": format!("*{}*", text)});
            if case_insensitive {
                body["case_insensitive"] = json!(true);
            }
            Ok(json!({"wildcard": {search_field: body}}))
        }
        Operator::Match => {
            let text_field = field.text_field();
            Ok(json!({"match": {text_field: value}}))
        }
        Operator::HasAnyValue => Ok(exists(&search_field)),
        Operator::Between => {
            let bounds = value.as_array().filter(|a| a.len() == 2).ok_or_else(|| {
                McpError::InvalidArg {
                    name: "between".to_string(),
                    reason: format!("expected a [min, max] pair, got {}", value),
                }
            })?;
            // Inclusive on both ends
            Ok(json!({"range": {search_field: {"gte": bounds[0], "lte": bounds[1]}}}))
        }
        Operator::Within => {
            let values = value.as_array().ok_or_else(|| McpError::InvalidArg {
                name: "within".to_string(),
                reason: format!("expected a list of values, got {}", value),
            })?;
            Ok(json!({"terms": {search_field: values}}))
        }
    }
}

/// OR of N separate equality predicates over the list elements.
///
/// Kept distinct from `within` for compatibility: a list value without an
/// explicit operator compiles to this shape.
pub fn or_of_eq(field: &FieldDescriptor, values: &[JsonValue]) -> JsonValue {
    let search_field = field.search_field();
    let terms: Vec<JsonValue> = values.iter().map(|v| term(&search_field, v, false)).collect();
    json!({"bool": {"should": terms, "minimum_should_match": 1}})
}

/// `field is populated` clause.
pub fn exists(search_field: &str) -> JsonValue {
    json!({"exists": {"field": search_field}})
}

fn term(search_field: &str, value: &JsonValue, case_insensitive: bool) -> JsonValue {
    let mut body = json!({"value": value});
    if case_insensitive {
        body["case_insensitive"] = json!(true);
    }
    json!({"term": {search_field: body}})
}

fn range(search_field: &str, bound: &str, value: &JsonValue) -> JsonValue {
    json!({"range": {search_field: {bound: value}}})
}

fn string_value<'v>(value: &'v JsonValue, operator: &str) -> Result<&'v str> {
    value.as_str().ok_or_else(|| McpError::InvalidArg {
        name: operator.to_string(),
        reason: format!("expected a string value, got {}", value),
    })
}

/// Compound clauses over whole assets rather than single fields.
pub mod compound {
    use super::*;

    /// Restrict to a single asset type by exact type name.
    pub fn asset_type(type_name: &str) -> JsonValue {
        json!({"term": {"__typeName.keyword": {"value": type_name}}})
    }

    /// Restrict to active (non-archived) assets.
    pub fn active_assets() -> JsonValue {
        json!({"term": {"__state": {"value": "ACTIVE"}}})
    }

    /// Assets whose qualified name starts with the given prefix.
    ///
    /// Used for connection scoping: connection qualified names prefix the
    /// qualified names of every asset under them.
    pub fn qualified_name_prefix(prefix: &str) -> JsonValue {
        json!({"prefix": {"qualifiedName": {"value": prefix}}})
    }

    /// Assets carrying at least one of the given tags.
    ///
    /// `directly` narrows the match to direct (non-propagated) assignments.
    pub fn tagged(tags: &[String], directly: bool) -> JsonValue {
        if directly {
            json!({"terms": {"__traitNames": tags}})
        } else {
            json!({
                "bool": {
                    "should": [
                        {"terms": {"__traitNames": tags}},
                        {"terms": {"__propagatedTraitNames": tags}}
                    ],
                    "minimum_should_match": 1
                }
            })
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// Parse `ASC`/`DESC` (any case); anything else defaults to ascending.
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("DESC") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// The request document submitted to the search endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchRequest {
    /// The query DSL document.
    pub dsl: JsonValue,
    /// Attribute names to materialize on each returned record.
    pub attributes: Vec<String>,
    /// Suppress request logging on the catalog side.
    #[serde(rename = "suppressLogs")]
    pub suppress_logs: bool,
    /// Include the relevance score on each record.
    #[serde(rename = "showSearchScore")]
    pub show_search_score: bool,
}

impl SearchRequest {
    /// Wrap an already-structured DSL document, bypassing compilation.
    pub fn from_dsl(dsl: JsonValue) -> Self {
        Self {
            dsl,
            attributes: Vec::new(),
            suppress_logs: true,
            show_search_score: true,
        }
    }
}

/// Default page size when the caller does not set one.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Accumulates predicates and result-shaping directives for one search.
///
/// Append-only; finalized exactly once via [`SearchBuilder::to_request`].
#[derive(Debug, Default)]
pub struct SearchBuilder {
    filters: Vec<JsonValue>,
    must_nots: Vec<JsonValue>,
    shoulds: Vec<JsonValue>,
    min_somes: Option<u64>,
    limit: Option<u64>,
    offset: Option<u64>,
    sort: Vec<JsonValue>,
    attributes: Vec<String>,
}

impl SearchBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required predicate (AND).
    pub fn filter(&mut self, clause: JsonValue) -> &mut Self {
        self.filters.push(clause);
        self
    }

    /// Add an excluded predicate (AND NOT).
    pub fn exclude(&mut self, clause: JsonValue) -> &mut Self {
        self.must_nots.push(clause);
        self
    }

    /// Add a member to the some-of-N group.
    pub fn some(&mut self, clause: JsonValue) -> &mut Self {
        self.shoulds.push(clause);
        self
    }

    /// Minimum number of some-group members that must match.
    pub fn min_somes(&mut self, count: u64) -> &mut Self {
        self.min_somes = Some(count);
        self
    }

    /// Page size.
    pub fn page_size(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// Page start offset.
    pub fn from_offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    /// Append a sort key.
    pub fn sort_by(&mut self, search_field: &str, order: SortOrder) -> &mut Self {
        self.sort
            .push(json!({search_field: {"order": order.as_str()}}));
        self
    }

    /// Request an attribute on returned records. Duplicates are dropped.
    pub fn include_attribute(&mut self, attr_name: &str) -> &mut Self {
        if !self.attributes.iter().any(|a| a == attr_name) {
            self.attributes.push(attr_name.to_string());
        }
        self
    }

    /// Finalize into the request document.
    ///
    /// The qualified-name attribute is always requested so that every
    /// returned record carries its identity regardless of the inclusion list.
    pub fn to_request(&self) -> SearchRequest {
        let mut query = serde_json::Map::new();
        if !self.filters.is_empty() {
            query.insert("filter".to_string(), JsonValue::Array(self.filters.clone()));
        }
        if !self.must_nots.is_empty() {
            query.insert(
                "must_not".to_string(),
                JsonValue::Array(self.must_nots.clone()),
            );
        }
        if !self.shoulds.is_empty() {
            query.insert("should".to_string(), JsonValue::Array(self.shoulds.clone()));
            query.insert(
                "minimum_should_match".to_string(),
                json!(self.min_somes.unwrap_or(1)),
            );
        }

        let mut dsl = serde_json::Map::new();
        if let Some(offset) = self.offset.filter(|o| *o > 0) {
            dsl.insert("from".to_string(), json!(offset));
        }
        dsl.insert(
            "size".to_string(),
            json!(self.limit.unwrap_or(DEFAULT_PAGE_SIZE)),
        );
        dsl.insert("query".to_string(), json!({ "bool": query }));
        if !self.sort.is_empty() {
            dsl.insert("sort".to_string(), JsonValue::Array(self.sort.clone()));
        }
        dsl.insert("track_total_hits".to_string(), json!(true));

        let mut attributes = vec!["qualifiedName".to_string()];
        attributes.extend(
            self.attributes
                .iter()
                .filter(|a| a.as_str() != "qualifiedName")
                .cloned(),
        );

        SearchRequest {
            dsl: JsonValue::Object(dsl),
            attributes,
            suppress_logs: true,
            show_search_score: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::lookup_standard;

    fn field(name: &str) -> FieldDescriptor {
        FieldDescriptor::Standard(lookup_standard(name).unwrap())
    }

    #[test]
    fn test_parse_operator_is_case_sensitive() {
        assert_eq!(Operator::parse("eq"), Some(Operator::Eq));
        assert_eq!(Operator::parse("EQ"), None);
        assert_eq!(Operator::parse("starts_with"), None);
        assert_eq!(Operator::parse("has_any_value"), Some(Operator::HasAnyValue));
    }

    #[test]
    fn test_eq_predicate() {
        let clause = predicate(
            &field("certificate_status"),
            Operator::Eq,
            &json!("VERIFIED"),
            false,
        )
        .unwrap();
        assert_eq!(
            clause,
            json!({"term": {"certificateStatus": {"value": "VERIFIED"}}})
        );
    }

    #[test]
    fn test_eq_predicate_case_insensitive() {
        let clause = predicate(&field("name"), Operator::Eq, &json!("orders"), true).unwrap();
        assert_eq!(
            clause,
            json!({"term": {"name.keyword": {"value": "orders", "case_insensitive": true}}})
        );
    }

    #[test]
    fn test_neq_predicate_negates_term() {
        let clause = predicate(
            &field("certificate_status"),
            Operator::Neq,
            &json!("DRAFT"),
            false,
        )
        .unwrap();
        assert_eq!(
            clause,
            json!({"bool": {"must_not": [{"term": {"certificateStatus": {"value": "DRAFT"}}}]}})
        );
    }

    #[test]
    fn test_ordering_predicates() {
        for (op, key) in [
            (Operator::Gt, "gt"),
            (Operator::Gte, "gte"),
            (Operator::Lt, "lt"),
            (Operator::Lte, "lte"),
        ] {
            let clause = predicate(&field("create_time"), op, &json!(1700000000000u64), false)
                .unwrap();
            assert_eq!(
                clause,
                json!({"range": {"__timestamp": {key: 1700000000000u64}}})
            );
        }
    }

    #[test]
    fn test_startswith_and_contains() {
        let prefix = predicate(
            &field("qualified_name"),
            Operator::StartsWith,
            &json!("default/snowflake"),
            false,
        )
        .unwrap();
        assert_eq!(
            prefix,
            json!({"prefix": {"qualifiedName": {"value": "default/snowflake"}}})
        );

        let contains =
            predicate(&field("name"), Operator::Contains, &json!("orders"), true).unwrap();
        assert_eq!(
            contains,
            json!({"wildcard": {"name.keyword": {"value": "*orders*", "case_insensitive": true}}})
        );
    }

    #[test]
    fn test_contains_requires_string() {
        let err = predicate(&field("name"), Operator::Contains, &json!(7), false).unwrap_err();
        assert!(matches!(err, McpError::InvalidArg { .. }));
    }

    #[test]
    fn test_match_uses_text_field() {
        let clause = predicate(&field("name"), Operator::Match, &json!("daily orders"), false)
            .unwrap();
        assert_eq!(clause, json!({"match": {"name": "daily orders"}}));
    }

    #[test]
    fn test_has_any_value_ignores_value() {
        let clause = predicate(
            &field("description"),
            Operator::HasAnyValue,
            &json!("ignored"),
            false,
        )
        .unwrap();
        assert_eq!(clause, json!({"exists": {"field": "description.keyword"}}));
    }

    #[test]
    fn test_between_is_inclusive() {
        let clause = predicate(
            &field("create_time"),
            Operator::Between,
            &json!([100, 200]),
            false,
        )
        .unwrap();
        assert_eq!(
            clause,
            json!({"range": {"__timestamp": {"gte": 100, "lte": 200}}})
        );
    }

    #[test]
    fn test_between_rejects_malformed_value() {
        for bad in [json!([100]), json!([1, 2, 3]), json!("100-200"), json!(null)] {
            let err =
                predicate(&field("create_time"), Operator::Between, &bad, false).unwrap_err();
            assert!(matches!(err, McpError::InvalidArg { .. }), "value: {}", bad);
        }
    }

    #[test]
    fn test_within_membership() {
        let clause = predicate(
            &field("guid"),
            Operator::Within,
            &json!(["g1", "g2"]),
            false,
        )
        .unwrap();
        assert_eq!(clause, json!({"terms": {"__guid": ["g1", "g2"]}}));

        let err = predicate(&field("guid"), Operator::Within, &json!("g1"), false).unwrap_err();
        assert!(matches!(err, McpError::InvalidArg { .. }));
    }

    #[test]
    fn test_or_of_eq_is_separate_terms_not_terms_clause() {
        let clause = or_of_eq(&field("owner_users"), &[json!("alice"), json!("bob")]);
        assert_eq!(
            clause,
            json!({
                "bool": {
                    "should": [
                        {"term": {"ownerUsers": {"value": "alice"}}},
                        {"term": {"ownerUsers": {"value": "bob"}}}
                    ],
                    "minimum_should_match": 1
                }
            })
        );
    }

    #[test]
    fn test_builder_groups_and_min_somes() {
        let mut builder = SearchBuilder::new();
        builder
            .filter(compound::asset_type("Table"))
            .exclude(exists("description.keyword"))
            .some(json!({"term": {"certificateStatus": {"value": "DRAFT"}}}))
            .some(json!({"term": {"certificateStatus": {"value": "VERIFIED"}}}))
            .min_somes(1)
            .page_size(5);

        let request = builder.to_request();
        let query = &request.dsl["query"]["bool"];
        assert_eq!(query["filter"].as_array().unwrap().len(), 1);
        assert_eq!(query["must_not"].as_array().unwrap().len(), 1);
        assert_eq!(query["should"].as_array().unwrap().len(), 2);
        assert_eq!(query["minimum_should_match"], json!(1));
        assert_eq!(request.dsl["size"], json!(5));
        assert_eq!(request.dsl["from"], JsonValue::Null);
    }

    #[test]
    fn test_builder_offset_only_when_positive() {
        let mut builder = SearchBuilder::new();
        builder.from_offset(0);
        assert_eq!(builder.to_request().dsl.get("from"), None);

        let mut builder = SearchBuilder::new();
        builder.from_offset(40).page_size(20);
        let dsl = builder.to_request().dsl;
        assert_eq!(dsl["from"], json!(40));
        assert_eq!(dsl["size"], json!(20));
    }

    #[test]
    fn test_builder_always_requests_qualified_name() {
        let request = SearchBuilder::new().to_request();
        assert_eq!(request.attributes, vec!["qualifiedName".to_string()]);

        let mut builder = SearchBuilder::new();
        builder
            .include_attribute("name")
            .include_attribute("qualifiedName")
            .include_attribute("name");
        let request = builder.to_request();
        assert_eq!(
            request.attributes,
            vec!["qualifiedName".to_string(), "name".to_string()]
        );
    }

    #[test]
    fn test_builder_sort_order() {
        let mut builder = SearchBuilder::new();
        builder.sort_by("popularityScore", SortOrder::parse("DESC"));
        let dsl = builder.to_request().dsl;
        assert_eq!(dsl["sort"], json!([{"popularityScore": {"order": "desc"}}]));
    }
}
