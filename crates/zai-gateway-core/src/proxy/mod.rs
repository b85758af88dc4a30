// proxy module - Z.ai OpenAI-compatible gateway

pub mod credential_pool;
pub mod handlers;
pub mod middleware;
pub mod orchestrator;
pub mod server;
pub mod signer;
pub mod transformer;
pub mod translator;
pub mod upstream;

pub use credential_pool::{Credential, CredentialPool, GuestTokenIssuer, Provenance};
pub use orchestrator::AttemptOrchestrator;
pub use server::{build_router, serve, AppState};
pub use signer::RequestSigner;
pub use transformer::{RequestTransformer, TransformedRequest};
pub use translator::StreamTranslator;
pub use upstream::{HttpTransport, UpstreamTransport};
