//! Credential pool and outbound network settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// File-backed credential rotation pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct PoolConfig {
    /// Newline-delimited bearer tokens
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    /// Consecutive failures after which a credential is skipped
    #[validate(range(min = 1_u32, max = 1000_u32))]
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
    /// Seconds between token file reloads
    #[validate(range(min = 1_u64, max = 86400_u64))]
    #[serde(default = "default_reload_interval")]
    pub reload_interval_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            token_file: default_token_file(),
            max_failures: default_max_failures(),
            reload_interval_secs: default_reload_interval(),
        }
    }
}

impl PoolConfig {
    pub fn reload_interval(&self) -> Duration {
        Duration::from_secs(self.reload_interval_secs)
    }
}

/// Per-attempt timeouts, retry policy and outbound proxies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct NetworkConfig {
    #[validate(range(min = 1_u64, max = 600_u64))]
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[validate(range(min = 1_u64, max = 3600_u64))]
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Retries beyond the first attempt
    #[validate(range(max = 20_u32))]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed delay before each retry
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[validate(url)]
    #[serde(default)]
    pub http_proxy: Option<String>,
    #[validate(url)]
    #[serde(default)]
    pub https_proxy: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            http_proxy: None,
            https_proxy: None,
        }
    }
}

impl NetworkConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn default_token_file() -> PathBuf {
    PathBuf::from("./tokens.txt")
}

const fn default_max_failures() -> u32 {
    3
}

const fn default_reload_interval() -> u64 {
    60
}

const fn default_connect_timeout() -> u64 {
    30
}

const fn default_request_timeout() -> u64 {
    120
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_delay_ms() -> u64 {
    2000
}
