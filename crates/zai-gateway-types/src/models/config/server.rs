//! Listener, inbound auth and feature toggles.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::enums::ThinkingMode;

/// Inbound listener and API key settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Port to listen on
    #[validate(range(min = 1_u16))]
    #[serde(default = "default_port")]
    pub port: u16,
    /// Static key expected in `Authorization: Bearer <key>`
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Accept any inbound request without checking the key
    #[serde(default)]
    pub skip_auth: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            api_key: default_api_key(),
            skip_auth: false,
        }
    }
}

impl ServerConfig {
    /// Full bind socket address.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Request shaping toggles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureConfig {
    #[serde(default)]
    pub thinking_mode: ThinkingMode,
    /// Prefer anonymously issued guest credentials over the pool
    #[serde(default = "default_true")]
    pub anonymous_mode: bool,
    /// Forward client tool definitions upstream
    #[serde(default = "default_true")]
    pub tool_support: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self { thinking_mode: ThinkingMode::default(), anonymous_mode: true, tool_support: true }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

fn default_api_key() -> String {
    "sk-your-api-key".to_string()
}

const fn default_true() -> bool {
    true
}
