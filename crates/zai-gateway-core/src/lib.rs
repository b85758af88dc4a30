//! # Z.ai Gateway Core
//!
//! Translation and resilience core of the gateway.
//!
//! ```text
//! zai-gateway-core/src/proxy/
//! ├── credential_pool/  # rotating bearer credentials + anonymous issuance
//! ├── signer.rs         # request signature
//! ├── transformer/      # OpenAI request -> upstream body + headers
//! ├── upstream/         # browser fingerprint headers, HTTP transport
//! ├── translator/       # upstream SSE -> OpenAI chunks
//! ├── orchestrator/     # bounded retry loop over attempts
//! ├── handlers/         # axum handlers
//! ├── middleware/       # inbound API key check
//! └── server.rs         # router + shared state
//! ```

#![allow(
    clippy::significant_drop_tightening,
    reason = "Mutex guards are scoped to O(1) pool bookkeeping"
)]
#![allow(clippy::needless_continue, reason = "Explicit continue improves loop readability")]
#![allow(
    clippy::derive_partial_eq_without_eq,
    reason = "Some types intentionally don't implement Eq"
)]
#![cfg_attr(
    test,
    allow(clippy::panic, clippy::unwrap_used, clippy::expect_used, clippy::assertions_on_result_states)
)]

pub mod error;
pub mod proxy;

pub use error::{AppError, AppResult};
