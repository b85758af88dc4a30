//! Anonymous guest-token issuance.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use zai_gateway_types::ProxyError;

use crate::proxy::upstream::{build_browser_headers, BrowserProfile, SiteIdentity};

/// Side-call timeout for guest issuance.
pub const ANONYMOUS_ISSUE_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of short-lived credentials tried before the file-backed pool.
#[async_trait]
pub trait EphemeralIssuer: Send + Sync {
    async fn issue(&self) -> Result<String, ProxyError>;
}

#[derive(Debug, Deserialize)]
struct GuestAuthResponse {
    #[serde(default)]
    token: String,
}

/// `GET {base}/api/v1/auths/` with browser-like headers.
pub struct GuestTokenIssuer {
    client: reqwest::Client,
    auth_url: String,
    site: SiteIdentity,
}

impl GuestTokenIssuer {
    pub fn new(client: reqwest::Client, auth_url: impl Into<String>, site: SiteIdentity) -> Self {
        Self { client, auth_url: auth_url.into(), site }
    }
}

#[async_trait]
impl EphemeralIssuer for GuestTokenIssuer {
    async fn issue(&self) -> Result<String, ProxyError> {
        let profile = BrowserProfile::random(&mut rand::thread_rng());
        let headers = build_browser_headers(&profile, &self.site, None);

        let response = self
            .client
            .get(&self.auth_url)
            .headers(headers)
            .timeout(ANONYMOUS_ISSUE_TIMEOUT)
            .send()
            .await
            .map_err(|e| ProxyError::Transport { message: format!("guest auth: {e}") })?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(ProxyError::UpstreamStatus {
                status,
                message: "guest auth endpoint refused".to_string(),
            });
        }

        let parsed: GuestAuthResponse = response
            .json()
            .await
            .map_err(|e| ProxyError::Transport { message: format!("guest auth body: {e}") })?;

        if parsed.token.is_empty() {
            return Err(ProxyError::CredentialExhausted {
                reason: "guest auth returned no token".to_string(),
            });
        }
        Ok(parsed.token)
    }
}
