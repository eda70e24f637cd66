//! Server configuration.
//!
//! Settings are assembled once at startup from CLI flags and environment
//! variables, then handed to the catalog client.

/// Connection settings for the catalog service.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the catalog instance, e.g. `https://tenant.example.com`.
    pub base_url: String,
    /// API key used as a bearer token.
    pub api_key: String,
    /// Identifier reported in agent headers, if configured.
    pub agent_id: Option<String>,
    /// Agent name reported in agent headers.
    pub agent_name: String,
}

impl Settings {
    /// Create settings with the default agent name.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            // Trailing slashes would double up when joining endpoint paths
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            agent_id: None,
            agent_name: "catalog-mcp".to_string(),
        }
    }

    /// Set the agent identifier sent with every request.
    pub fn with_agent_id(mut self, agent_id: Option<String>) -> Self {
        self.agent_id = agent_id;
        self
    }
}

/// Parse a comma-separated tool allowlist into tool names.
///
/// Empty segments are dropped; an empty or all-whitespace input yields `None`,
/// meaning no restriction.
pub fn parse_tool_allowlist(raw: &str) -> Option<Vec<String>> {
    let names: Vec<String> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let settings = Settings::new("https://tenant.example.com/", "key");
        assert_eq!(settings.base_url, "https://tenant.example.com");
    }

    #[test]
    fn test_parse_tool_allowlist() {
        assert_eq!(
            parse_tool_allowlist("catalog_search_assets, catalog_traverse_lineage"),
            Some(vec![
                "catalog_search_assets".to_string(),
                "catalog_traverse_lineage".to_string()
            ])
        );
        assert_eq!(parse_tool_allowlist(""), None);
        assert_eq!(parse_tool_allowlist(" , "), None);
    }
}
