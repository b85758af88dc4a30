//! # Z.ai Gateway Types
//!
//! Core types, configuration models, and error definitions for the gateway.
//!
//! - **`error`** - Typed error taxonomy for proxying and configuration
//! - **`models`** - Gateway configuration (`GatewayConfig` and its sections)
//! - **`protocol`** - OpenAI-compatible inbound/outbound types and the
//!   upstream chat backend wire types
//!
//! ## Architecture Role
//!
//! ```text
//!            zai-gateway-types (this crate)
//!                      │
//!                      ▼
//!              zai-gateway-core
//!                      │
//!                      ▼
//!             zai-gateway-server
//! ```

pub mod error;
pub mod models;
pub mod protocol;

pub use error::{ConfigError, ProxyError};
pub use models::{GatewayConfig, ThinkingMode};
