use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use zai_gateway_types::GatewayConfig;

use crate::error::AppResult;
use crate::proxy::credential_pool::CredentialPool;
use crate::proxy::handlers;
use crate::proxy::middleware::{auth_middleware, cors_layer};
use crate::proxy::orchestrator::AttemptOrchestrator;
use crate::proxy::transformer::RequestTransformer;
use crate::proxy::upstream::UpstreamTransport;

/// Axum application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub pool: Arc<CredentialPool>,
    pub orchestrator: Arc<AttemptOrchestrator>,
}

impl AppState {
    pub fn new(
        config: Arc<GatewayConfig>,
        pool: Arc<CredentialPool>,
        transport: Arc<dyn UpstreamTransport>,
    ) -> Self {
        let transformer = Arc::new(RequestTransformer::new(Arc::clone(&config), Arc::clone(&pool)));
        let orchestrator = Arc::new(AttemptOrchestrator::new(transformer, transport));
        Self { config, pool, orchestrator }
    }
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/v1/models", get(handlers::handle_list_models))
        .route("/v1/chat/completions", post(handlers::handle_chat_completions))
        .layer(axum::middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(api)
        .route("/health", get(handlers::handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn serve(state: AppState) -> AppResult<()> {
    let addr = state.config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Gateway listening on {}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}
