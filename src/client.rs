//! HTTP client for the catalog API.
//!
//! Thin blocking wrapper over the catalog's REST endpoints: index search,
//! lineage traversal, bulk entity save and typedef retrieval. Authentication
//! is a bearer API key plus agent identification headers, applied to every
//! request. No retries are performed here; transient failures surface as
//! errors to the tool boundary.

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use std::time::Duration;

use crate::config::Settings;
use crate::error::{McpError, Result};
use crate::query::SearchRequest;

const SEARCH_PATH: &str = "/api/meta/search/indexsearch";
const LINEAGE_PATH: &str = "/api/meta/lineage/list";
const ENTITY_BULK_PATH: &str = "/api/meta/entity/bulk";
const TYPEDEFS_PATH: &str = "/api/meta/types/typedefs";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One page of search results from the catalog.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    /// Matched asset records.
    #[serde(default)]
    pub entities: Vec<JsonValue>,
    /// Aggregation buckets, when the query requested any.
    #[serde(default)]
    pub aggregations: Map<String, JsonValue>,
    /// Approximate total match count.
    #[serde(default, rename = "approximateCount")]
    pub approximate_count: Option<u64>,
}

/// Authenticated catalog API client.
pub struct CatalogClient {
    http: Client,
    base_url: String,
}

impl CatalogClient {
    /// Build a client from settings.
    ///
    /// Fails if the API key cannot be carried in a header or the underlying
    /// HTTP client cannot be constructed.
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", settings.api_key);
        let mut auth = HeaderValue::from_str(&bearer).map_err(|_| McpError::InvalidArg {
            name: "api_key".to_string(),
            reason: "contains characters not allowed in a header".to_string(),
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let agent = HeaderValue::from_str(&settings.agent_name).map_err(|_| {
            McpError::InvalidArg {
                name: "agent_name".to_string(),
                reason: "contains characters not allowed in a header".to_string(),
            }
        })?;
        headers.insert("x-catalog-agent", agent);

        if let Some(agent_id) = &settings.agent_id {
            let value = HeaderValue::from_str(agent_id).map_err(|_| McpError::InvalidArg {
                name: "agent_id".to_string(),
                reason: "contains characters not allowed in a header".to_string(),
            })?;
            headers.insert("x-catalog-agent-id", value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
        })
    }

    /// Submit a structured search request and parse one page of results.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let raw = self.post_json(SEARCH_PATH, request)?;
        match serde_json::from_value::<SearchResponse>(raw) {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::warn!(error = %e, "unexpected search response shape, treating as empty");
                Ok(SearchResponse::default())
            }
        }
    }

    /// Submit a lineage-list request.
    pub fn lineage(&self, request: &JsonValue) -> Result<JsonValue> {
        self.post_json(LINEAGE_PATH, request)
    }

    /// Create or update entities in bulk. Returns the raw mutation response.
    pub fn save_entities(&self, entities: Vec<JsonValue>) -> Result<JsonValue> {
        self.post_json(ENTITY_BULK_PATH, &json!({ "entities": entities }))
    }

    /// Fetch typedefs of one kind (`BUSINESS_METADATA`, `ENUM`, ...).
    pub fn typedefs(&self, kind: &str) -> Result<JsonValue> {
        let url = format!("{}{}?type={}", self.base_url, TYPEDEFS_PATH, kind);
        tracing::debug!(%url, "catalog GET");
        let response = self.http.get(&url).send()?;
        read_json(response)
    }

    fn post_json(&self, path: &str, body: &impl Serialize) -> Result<JsonValue> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "catalog POST");
        let response = self.http.post(&url).json(body).send()?;
        read_json(response)
    }
}

fn read_json(response: Response) -> Result<JsonValue> {
    let status = response.status();
    let text = response.text()?;

    if !status.is_success() {
        return Err(McpError::Catalog {
            status: status.as_u16(),
            message: truncated(&text),
        });
    }

    if text.trim().is_empty() {
        return Ok(JsonValue::Null);
    }
    serde_json::from_str(&text).map_err(|e| McpError::Catalog {
        status: status.as_u16(),
        message: format!("response body is not valid JSON: {}", e),
    })
}

/// Keep error messages bounded; remote error bodies can be large.
fn truncated(text: &str) -> String {
    const LIMIT: usize = 500;
    let trimmed = text.trim();
    if trimmed.len() <= LIMIT {
        trimmed.to_string()
    } else {
        let mut end = LIMIT;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_bounds_long_bodies() {
        let long = "x".repeat(2000);
        let out = truncated(&long);
        assert_eq!(out.len(), 503);
        assert!(out.ends_with("..."));
        assert_eq!(truncated("short"), "short");
    }

    #[test]
    fn test_search_response_defaults() {
        let response: SearchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.entities.is_empty());
        assert!(response.aggregations.is_empty());
        assert_eq!(response.approximate_count, None);

        let response: SearchResponse = serde_json::from_value(json!({
            "entities": [{"guid": "g1"}],
            "aggregations": {"by_type": {}},
            "approximateCount": 42
        }))
        .unwrap();
        assert_eq!(response.entities.len(), 1);
        assert_eq!(response.approximate_count, Some(42));
    }
}
