//! Z.ai Gateway - Headless Daemon
//!
//! Serves an OpenAI-compatible API on /v1/* and forwards every chat
//! completion to the Z.ai web chat backend, rotating credentials and
//! retrying failed attempts before the first byte reaches the client.
//!
//! Configuration comes from flags, the environment, and an optional `.env`.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zai_gateway_core::proxy::credential_pool::{CredentialPool, GuestTokenIssuer};
use zai_gateway_core::proxy::upstream::{HttpTransport, SiteIdentity};
use zai_gateway_core::proxy::{serve, AppState};
use zai_gateway_types::GatewayConfig;

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be loaded before clap reads `env = ...` arguments
    let dotenv = dotenvy::dotenv();
    let config = cli::Cli::parse().into_config();

    init_tracing(config.debug_logging)?;
    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {},
        Err(e) => warn!("⚠️ Ignoring unreadable .env: {}", e),
    }

    config.check().context("invalid configuration")?;
    log_startup(&config);

    let config = Arc::new(config);
    let transport = HttpTransport::from_config(&config.network)?;

    let mut pool = CredentialPool::new(
        Some(config.pool.token_file.clone()),
        config.upstream.backup_token.clone(),
        config.pool.max_failures,
    );
    if config.features.anonymous_mode {
        let site = SiteIdentity {
            base_url: config.upstream.base_url.clone(),
            fe_version: config.upstream.fe_version.clone(),
        };
        let issuer =
            GuestTokenIssuer::new(transport.client().clone(), config.upstream.anonymous_auth_url(), site);
        pool = pool.with_ephemeral_issuer(Arc::new(issuer));
    }
    let pool = Arc::new(pool);

    match pool.reload().await {
        Ok(count) => info!("📊 Loaded {} pooled credential(s)", count),
        Err(e) => warn!("⚠️ Could not load token file {}: {}", config.pool.token_file.display(), e),
    }
    if pool.is_empty() && !pool.has_ephemeral_source() {
        warn!("⚠️ No credentials available; chat requests will fail until the token file is populated");
    }
    pool.start_auto_reload(config.pool.reload_interval());

    let state = AppState::new(Arc::clone(&config), pool, Arc::new(transport));
    info!("✅ Application state initialized");

    serve(state).await?;
    Ok(())
}

/// `RUST_LOG` wins; otherwise `DEBUG_LOGGING` picks between debug and info.
fn init_tracing(debug_logging: bool) -> Result<()> {
    let fallback = if debug_logging { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn log_startup(config: &GatewayConfig) {
    info!("🚀 Z.ai Gateway v{} starting on {}", env!("CARGO_PKG_VERSION"), config.server.socket_addr());
    info!("🔀 Upstream: {}", config.upstream.api_endpoint);
    info!(
        "🧠 Models: {} | thinking mode: {} | anonymous: {} | tools: {}",
        config.models.aliases().join(", "),
        config.features.thinking_mode,
        config.features.anonymous_mode,
        config.features.tool_support
    );
    info!(
        "🔁 Retries: {} (delay {}ms), request timeout {}s",
        config.network.max_retries,
        config.network.retry_delay_ms,
        config.network.request_timeout_secs
    );
    if config.server.skip_auth {
        warn!("⚠️ API key check disabled (SKIP_AUTH_TOKEN)");
    }
}
