use clap::builder::BoolishValueParser;
use clap::Parser;
use std::path::PathBuf;
use zai_gateway_types::{GatewayConfig, ThinkingMode};

/// Every option is also read from the environment; unset options keep the
/// built-in defaults.
#[derive(Parser, Debug)]
#[command(
    name = "zai-gateway",
    about = "OpenAI-compatible gateway for the Z.ai chat backend",
    version = env!("CARGO_PKG_VERSION"),
    author
)]
pub struct Cli {
    /// Upstream chat completions endpoint
    #[arg(long, env = "API_ENDPOINT")]
    pub api_endpoint: Option<String>,

    /// API key clients must present as `Authorization: Bearer <key>`
    #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Upstream credential added to the pool alongside the token file
    #[arg(long, env = "BACKUP_TOKEN", hide_env_values = true)]
    pub backup_token: Option<String>,

    #[arg(long, env = "PRIMARY_MODEL")]
    pub primary_model: Option<String>,

    #[arg(long, env = "THINKING_MODEL")]
    pub thinking_model: Option<String>,

    #[arg(long, env = "SEARCH_MODEL")]
    pub search_model: Option<String>,

    #[arg(long, env = "AIR_MODEL")]
    pub air_model: Option<String>,

    #[arg(long, env = "BIND_ADDRESS")]
    pub bind_address: Option<String>,

    #[arg(short, long, env = "LISTEN_PORT")]
    pub port: Option<u16>,

    #[arg(long, env = "DEBUG_LOGGING", value_parser = BoolishValueParser::new())]
    pub debug_logging: Option<bool>,

    /// strip | think | raw
    #[arg(long, env = "THINKING_PROCESSING")]
    pub thinking_processing: Option<ThinkingMode>,

    /// Prefer per-request guest credentials over the token pool
    #[arg(long, env = "ANONYMOUS_MODE", value_parser = BoolishValueParser::new())]
    pub anonymous_mode: Option<bool>,

    #[arg(long, env = "TOOL_SUPPORT", value_parser = BoolishValueParser::new())]
    pub tool_support: Option<bool>,

    /// Accept requests without checking the API key
    #[arg(long, env = "SKIP_AUTH_TOKEN", value_parser = BoolishValueParser::new())]
    pub skip_auth: Option<bool>,

    #[arg(long, env = "TOKEN_FILE_PATH")]
    pub token_file: Option<PathBuf>,

    #[arg(long, env = "TOKEN_MAX_FAILURES")]
    pub token_max_failures: Option<u32>,

    /// Seconds between token file reloads
    #[arg(long, env = "TOKEN_RELOAD_INTERVAL")]
    pub token_reload_interval: Option<u64>,

    /// Total per-attempt timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,

    /// Connection establishment timeout in seconds
    #[arg(long, env = "CONNECTION_TIMEOUT")]
    pub connection_timeout: Option<u64>,

    #[arg(long, env = "MAX_RETRIES")]
    pub max_retries: Option<u32>,

    #[arg(long, env = "RETRY_DELAY_MS")]
    pub retry_delay_ms: Option<u64>,

    #[arg(long, env = "HTTP_PROXY")]
    pub http_proxy: Option<String>,

    #[arg(long, env = "HTTPS_PROXY")]
    pub https_proxy: Option<String>,

    #[arg(long, env = "SIGNING_SECRET", hide_env_values = true)]
    pub signing_secret: Option<String>,

    #[arg(long, env = "FE_VERSION")]
    pub fe_version: Option<String>,
}

impl Cli {
    pub fn into_config(self) -> GatewayConfig {
        let mut config = GatewayConfig::default();

        set(&mut config.upstream.api_endpoint, self.api_endpoint);
        set(&mut config.upstream.signing_secret, self.signing_secret);
        set(&mut config.upstream.fe_version, self.fe_version);
        if self.backup_token.is_some() {
            config.upstream.backup_token = self.backup_token;
        }

        set(&mut config.models.primary, self.primary_model);
        set(&mut config.models.thinking, self.thinking_model);
        set(&mut config.models.search, self.search_model);
        set(&mut config.models.air, self.air_model);

        set(&mut config.server.api_key, self.auth_token);
        set(&mut config.server.bind_address, self.bind_address);
        set(&mut config.server.port, self.port);
        set(&mut config.server.skip_auth, self.skip_auth);

        set(&mut config.features.thinking_mode, self.thinking_processing);
        set(&mut config.features.anonymous_mode, self.anonymous_mode);
        set(&mut config.features.tool_support, self.tool_support);

        set(&mut config.pool.token_file, self.token_file);
        set(&mut config.pool.max_failures, self.token_max_failures);
        set(&mut config.pool.reload_interval_secs, self.token_reload_interval);

        set(&mut config.network.request_timeout_secs, self.request_timeout);
        set(&mut config.network.connect_timeout_secs, self.connection_timeout);
        set(&mut config.network.max_retries, self.max_retries);
        set(&mut config.network.retry_delay_ms, self.retry_delay_ms);
        if self.http_proxy.is_some() {
            config.network.http_proxy = self.http_proxy;
        }
        if self.https_proxy.is_some() {
            config.network.https_proxy = self.https_proxy;
        }

        set(&mut config.debug_logging, self.debug_logging);
        config
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::builder::Resettable;
    use clap::{CommandFactory, FromArgMatches};

    /// Parse flags only; `env = ...` bindings are cut so the host
    /// environment cannot leak into the result.
    fn parse_flags(args: &[&str]) -> Cli {
        let command = Cli::command().mut_args(|arg| arg.env(Resettable::Reset));
        let matches = command.try_get_matches_from(args).unwrap();
        Cli::from_arg_matches(&matches).unwrap()
    }

    #[test]
    fn test_defaults_survive_empty_cli() {
        let config = parse_flags(&["zai-gateway"]).into_config();
        assert_eq!(config.server.port, GatewayConfig::default().server.port);
        assert_eq!(config.features.thinking_mode, ThinkingMode::Think);
        assert!(config.network.http_proxy.is_none());
        assert!(config.network.https_proxy.is_none());
        assert_eq!(config, GatewayConfig::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = parse_flags(&[
            "zai-gateway",
            "--port",
            "9090",
            "--thinking-processing",
            "raw",
            "--anonymous-mode",
            "false",
            "--max-retries",
            "5",
            "--backup-token",
            "backup",
        ])
        .into_config();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.features.thinking_mode, ThinkingMode::Raw);
        assert!(!config.features.anonymous_mode);
        assert_eq!(config.network.max_retries, 5);
        assert_eq!(config.upstream.backup_token.as_deref(), Some("backup"));
    }
}
