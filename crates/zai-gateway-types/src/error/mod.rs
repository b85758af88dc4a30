//! Typed error definitions for the gateway.
//!
//! All errors are designed to be:
//!
//! - **Serializable** for API responses via serde
//! - **Displayable** for logging via Display trait
//! - **Matchable** for retry decisions via enum variants

mod config;
mod proxy;

pub use config::ConfigError;
pub use proxy::ProxyError;
