//! Gateway domain models.

pub mod config;

pub use config::{
    FeatureConfig, GatewayConfig, ModelConfig, NetworkConfig, PoolConfig, ServerConfig,
    ThinkingMode, UpstreamConfig,
};
