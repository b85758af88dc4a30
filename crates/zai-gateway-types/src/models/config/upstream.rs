//! Upstream chat backend and model alias configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Where and how the upstream chat backend is reached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct UpstreamConfig {
    /// Chat completions endpoint
    #[validate(url)]
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    /// Site origin, used for `Origin`, `Referer` and the anonymous auth endpoint
    #[validate(url)]
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Value of the `X-FE-Version` header
    #[validate(length(min = 1))]
    #[serde(default = "default_fe_version")]
    pub fe_version: String,
    /// Secret for the request signature window key
    #[validate(length(min = 1))]
    #[serde(default = "default_signing_secret")]
    pub signing_secret: String,
    /// Backup bearer credential, joins the file-backed pool
    #[serde(default)]
    pub backup_token: Option<String>,
    /// `{{CURRENT_TIMEZONE}}` template value
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// `{{USER_LANGUAGE}}` template value
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_endpoint: default_api_endpoint(),
            base_url: default_base_url(),
            fe_version: default_fe_version(),
            signing_secret: default_signing_secret(),
            backup_token: None,
            timezone: default_timezone(),
            language: default_language(),
        }
    }
}

impl UpstreamConfig {
    /// Anonymous guest-token issuance endpoint.
    pub fn anonymous_auth_url(&self) -> String {
        format!("{}/api/v1/auths/", self.base_url.trim_end_matches('/'))
    }
}

/// The four public model aliases and the upstream ids they resolve to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct ModelConfig {
    #[validate(length(min = 1))]
    #[serde(default = "default_primary_model")]
    pub primary: String,
    #[validate(length(min = 1))]
    #[serde(default = "default_thinking_model")]
    pub thinking: String,
    #[validate(length(min = 1))]
    #[serde(default = "default_search_model")]
    pub search: String,
    #[validate(length(min = 1))]
    #[serde(default = "default_air_model")]
    pub air: String,
    /// Upstream id for primary/thinking/search and unknown aliases
    #[validate(length(min = 1))]
    #[serde(default = "default_full_upstream_id")]
    pub full_upstream_id: String,
    /// Upstream id for the air alias
    #[validate(length(min = 1))]
    #[serde(default = "default_air_upstream_id")]
    pub air_upstream_id: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            primary: default_primary_model(),
            thinking: default_thinking_model(),
            search: default_search_model(),
            air: default_air_model(),
            full_upstream_id: default_full_upstream_id(),
            air_upstream_id: default_air_upstream_id(),
        }
    }
}

impl ModelConfig {
    /// Public aliases in listing order.
    pub fn aliases(&self) -> [&str; 4] {
        [
            self.primary.as_str(),
            self.thinking.as_str(),
            self.search.as_str(),
            self.air.as_str(),
        ]
    }
}

fn default_api_endpoint() -> String {
    "https://chat.z.ai/api/chat/completions".to_string()
}

fn default_base_url() -> String {
    "https://chat.z.ai".to_string()
}

fn default_fe_version() -> String {
    "prod-fe-1.0.79".to_string()
}

fn default_signing_secret() -> String {
    "junjie".to_string()
}

fn default_timezone() -> String {
    "Asia/Shanghai".to_string()
}

fn default_language() -> String {
    "zh-CN".to_string()
}

fn default_primary_model() -> String {
    "GLM-4.5".to_string()
}

fn default_thinking_model() -> String {
    "GLM-4.5-Thinking".to_string()
}

fn default_search_model() -> String {
    "GLM-4.5-Search".to_string()
}

fn default_air_model() -> String {
    "GLM-4.5-Air".to_string()
}

fn default_full_upstream_id() -> String {
    "0727-360B-API".to_string()
}

fn default_air_upstream_id() -> String {
    "0727-106B-API".to_string()
}
