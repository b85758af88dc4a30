//! Gateway configuration models.

mod enums;
mod pool;
mod server;
mod upstream;

pub use enums::ThinkingMode;
pub use pool::{NetworkConfig, PoolConfig};
pub use server::{FeatureConfig, ServerConfig};
pub use upstream::{ModelConfig, UpstreamConfig};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ConfigError;

/// Full gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct GatewayConfig {
    #[serde(default)]
    #[validate(nested)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    #[validate(nested)]
    pub models: ModelConfig,
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    #[validate(nested)]
    pub pool: PoolConfig,
    #[serde(default)]
    #[validate(nested)]
    pub network: NetworkConfig,
    /// Verbose logging
    #[serde(default)]
    pub debug_logging: bool,
}

impl GatewayConfig {
    /// Run all field validators, reporting the first offending section.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate().map_err(|errors| {
            let field =
                errors.errors().keys().next().map(|k| k.to_string()).unwrap_or_default();
            ConfigError::ValidationError { field, message: errors.to_string() }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GatewayConfig::default();
        assert!(config.check().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pool.max_failures, 3);
        assert_eq!(config.network.max_retries, 3);
        assert_eq!(config.features.thinking_mode, ThinkingMode::Think);
        assert_eq!(config.models.aliases(), ["GLM-4.5", "GLM-4.5-Thinking", "GLM-4.5-Search", "GLM-4.5-Air"]);
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let mut config = GatewayConfig::default();
        config.upstream.api_endpoint = "not a url".to_string();

        let err = config.check().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "upstream"));
    }

    #[test]
    fn test_zero_failure_threshold_rejected() {
        let mut config = GatewayConfig::default();
        config.pool.max_failures = 0;
        assert!(config.check().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: GatewayConfig = serde_json::from_value(serde_json::json!({
            "server": { "port": 9000 },
            "features": { "thinking_mode": "raw" }
        }))
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.api_key, "sk-your-api-key");
        assert_eq!(config.features.thinking_mode, ThinkingMode::Raw);
        assert!(config.features.anonymous_mode);
        assert_eq!(config.upstream.anonymous_auth_url(), "https://chat.z.ai/api/v1/auths/");
    }
}
