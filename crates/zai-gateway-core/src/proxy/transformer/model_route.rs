//! Model alias routing.

use zai_gateway_types::models::ModelConfig;

/// MCP capability injected for the search alias.
pub const SEARCH_MCP_SERVER: &str = "deep-web-search";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelVariant {
    Primary,
    Thinking,
    Search,
    Air,
    /// Not one of the four aliases; routed to the full model
    Unlisted,
}

/// Where a public alias goes upstream and which features it switches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRoute {
    pub alias: String,
    pub upstream_id: String,
    pub variant: ModelVariant,
    pub enable_thinking: bool,
    pub web_search: bool,
    pub mcp_servers: Vec<String>,
}

impl ModelRoute {
    pub fn is_thinking(&self) -> bool {
        self.enable_thinking
    }
}

/// Resolve an alias. An explicit `reasoning: true` turns on thinking for any alias.
pub fn resolve_route(models: &ModelConfig, alias: &str, reasoning: Option<bool>) -> ModelRoute {
    let variant = if alias == models.thinking {
        ModelVariant::Thinking
    } else if alias == models.search {
        ModelVariant::Search
    } else if alias == models.air {
        ModelVariant::Air
    } else if alias == models.primary {
        ModelVariant::Primary
    } else {
        ModelVariant::Unlisted
    };

    let upstream_id = match variant {
        ModelVariant::Air => models.air_upstream_id.clone(),
        _ => models.full_upstream_id.clone(),
    };
    let web_search = variant == ModelVariant::Search;
    let mcp_servers = if web_search { vec![SEARCH_MCP_SERVER.to_string()] } else { Vec::new() };

    ModelRoute {
        alias: alias.to_string(),
        upstream_id,
        variant,
        enable_thinking: variant == ModelVariant::Thinking || reasoning == Some(true),
        web_search,
        mcp_servers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_table() {
        let models = ModelConfig::default();

        let primary = resolve_route(&models, "GLM-4.5", None);
        assert_eq!(primary.upstream_id, "0727-360B-API");
        assert!(!primary.enable_thinking && !primary.web_search);
        assert!(primary.mcp_servers.is_empty());

        let air = resolve_route(&models, "GLM-4.5-Air", None);
        assert_eq!(air.upstream_id, "0727-106B-API");
        assert_eq!(air.variant, ModelVariant::Air);

        let thinking = resolve_route(&models, "GLM-4.5-Thinking", None);
        assert!(thinking.enable_thinking);
        assert!(thinking.mcp_servers.is_empty());
    }

    #[test]
    fn test_search_injects_mcp_server() {
        let route = resolve_route(&ModelConfig::default(), "GLM-4.5-Search", None);
        assert!(route.web_search);
        assert_eq!(route.mcp_servers, vec![SEARCH_MCP_SERVER.to_string()]);
        assert!(!route.enable_thinking);
    }

    #[test]
    fn test_unknown_alias_falls_back_to_full_model() {
        let route = resolve_route(&ModelConfig::default(), "gpt-4o", None);
        assert_eq!(route.variant, ModelVariant::Unlisted);
        assert_eq!(route.upstream_id, "0727-360B-API");
    }

    #[test]
    fn test_reasoning_flag_enables_thinking() {
        let route = resolve_route(&ModelConfig::default(), "GLM-4.5-Air", Some(true));
        assert!(route.enable_thinking);
        assert_eq!(route.upstream_id, "0727-106B-API");
    }
}
