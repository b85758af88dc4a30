//! Request transformer: OpenAI chat request to upstream body and HTTP config.

mod messages;
mod model_route;
mod variables;

pub use messages::{last_user_text, rewrite_messages, SYSTEM_PREFACE};
pub use model_route::{resolve_route, ModelRoute, ModelVariant, SEARCH_MCP_SERVER};
pub use variables::template_variables;

use bytes::Bytes;
use chrono::{DateTime, Local};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;
use zai_gateway_types::protocol::{
    BackgroundTasks, ChatRequest, FeatureFlags, ModelItem, UpstreamRequestBody,
};
use zai_gateway_types::{GatewayConfig, ProxyError};

use super::credential_pool::{Credential, CredentialPool};
use super::signer::{extract_user_id, RequestSigner};
use super::upstream::{build_browser_headers, BrowserProfile, OutboundRequest, SiteIdentity};

pub const X_SIGNATURE: HeaderName = HeaderName::from_static("x-signature");

/// `owned_by` tag for upstream model items and the model listing.
pub const MODEL_OWNER: &str = "z.ai";

/// Inputs the signature depends on, fixed for one logical request.
#[derive(Debug, Clone)]
struct SigningContext {
    request_id: String,
    timestamp_ms: i64,
    content: String,
}

/// Outbound URL, query parameters and headers for one logical request.
///
/// Only the credential-derived parts (bearer header, signature header,
/// `token` and `user_id` params) change when a retry rebinds a new credential.
#[derive(Debug, Clone)]
pub struct OutboundHttpConfig {
    pub endpoint: String,
    pub headers: HeaderMap,
    params: Vec<(&'static str, String)>,
    signing: SigningContext,
}

impl OutboundHttpConfig {
    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_str())
    }

    fn set_param(&mut self, name: &'static str, value: String) {
        match self.params.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name, value)),
        }
    }

    /// Point authorization and signature at `credential`.
    pub fn bind_credential(
        &mut self,
        credential: &Credential,
        signer: &RequestSigner,
    ) -> Result<(), ProxyError> {
        let signature = signer.sign(
            credential.token(),
            &self.signing.request_id,
            self.signing.timestamp_ms,
            &self.signing.content,
        )?;

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", credential.token()))
            .map_err(|_| ProxyError::Internal { message: "credential is not a valid header value".into() })?;
        bearer.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, bearer);

        let signature_value = HeaderValue::from_str(&signature.signature)
            .map_err(|_| ProxyError::Internal { message: "signature is not a valid header value".into() })?;
        self.headers.insert(X_SIGNATURE, signature_value);

        self.set_param("user_id", extract_user_id(credential.token()));
        self.set_param("token", credential.token().to_string());
        Ok(())
    }

    pub fn url(&self) -> Result<String, ProxyError> {
        url::Url::parse_with_params(&self.endpoint, self.params.iter().map(|(k, v)| (*k, v.as_str())))
            .map(String::from)
            .map_err(|e| ProxyError::Internal { message: format!("invalid upstream endpoint: {e}") })
    }

    pub fn to_request(&self, body: Bytes) -> Result<OutboundRequest, ProxyError> {
        Ok(OutboundRequest { url: self.url()?, headers: self.headers.clone(), body })
    }
}

/// Result of transforming one logical request.
#[derive(Debug, Clone)]
pub struct TransformedRequest {
    pub body: UpstreamRequestBody,
    pub http: OutboundHttpConfig,
    pub credential: Credential,
    pub route: ModelRoute,
}

impl TransformedRequest {
    pub fn chat_id(&self) -> &str {
        &self.body.chat_id
    }

    pub fn has_tools(&self) -> bool {
        self.body.tools.is_some()
    }

    pub fn has_mcp_servers(&self) -> bool {
        !self.body.mcp_servers.is_empty()
    }
}

pub struct RequestTransformer {
    config: Arc<GatewayConfig>,
    pool: Arc<CredentialPool>,
    signer: RequestSigner,
}

impl RequestTransformer {
    pub fn new(config: Arc<GatewayConfig>, pool: Arc<CredentialPool>) -> Self {
        let signer = RequestSigner::new(config.upstream.signing_secret.clone());
        Self { config, pool, signer }
    }

    pub fn pool(&self) -> &Arc<CredentialPool> {
        &self.pool
    }

    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Build the upstream request. Fails with `CredentialExhausted` before
    /// anything else is constructed when the pool has nothing usable.
    pub async fn transform(&self, request: &ChatRequest) -> Result<TransformedRequest, ProxyError> {
        let credential = self.pool.acquire().await?;
        tracing::debug!("Transforming request for {} with credential {}", request.model, credential.redacted());

        let route = resolve_route(&self.config.models, &request.model, request.reasoning);
        tracing::debug!(
            "Model route: {} -> {} (thinking={}, search={})",
            route.alias,
            route.upstream_id,
            route.enable_thinking,
            route.web_search
        );

        let chat_id = Uuid::new_v4().to_string();
        let request_id = Uuid::new_v4().to_string();
        let now = Local::now();
        let body = self.build_body(request, &route, &chat_id, &request_id, &now);

        let profile = BrowserProfile::random(&mut rand::thread_rng());
        let site = SiteIdentity {
            base_url: self.config.upstream.base_url.clone(),
            fe_version: self.config.upstream.fe_version.clone(),
        };
        let headers = build_browser_headers(&profile, &site, Some(&chat_id));

        let timestamp_ms = now.timestamp_millis();
        let base = self.config.upstream.base_url.trim_end_matches('/');
        let mut http = OutboundHttpConfig {
            endpoint: self.config.upstream.api_endpoint.clone(),
            headers,
            params: vec![
                ("timestamp", timestamp_ms.to_string()),
                ("requestId", request_id.clone()),
                ("current_url", format!("{base}/c/{chat_id}")),
                ("pathname", format!("/c/{chat_id}")),
                ("signature_timestamp", timestamp_ms.to_string()),
            ],
            signing: SigningContext {
                request_id,
                timestamp_ms,
                content: last_user_text(&request.messages),
            },
        };
        http.bind_credential(&credential, &self.signer)?;

        Ok(TransformedRequest { body, http, credential, route })
    }

    /// Acquire a fresh credential and rebind `http` to it.
    pub async fn rebind(&self, http: &mut OutboundHttpConfig) -> Result<Credential, ProxyError> {
        let credential = self.pool.acquire().await?;
        http.bind_credential(&credential, &self.signer)?;
        Ok(credential)
    }

    pub fn build_body<Tz>(
        &self,
        request: &ChatRequest,
        route: &ModelRoute,
        chat_id: &str,
        id: &str,
        now: &DateTime<Tz>,
    ) -> UpstreamRequestBody
    where
        Tz: chrono::TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        UpstreamRequestBody {
            stream: true,
            model: route.upstream_id.clone(),
            messages: rewrite_messages(&request.messages),
            params: BTreeMap::new(),
            features: FeatureFlags {
                image_generation: false,
                web_search: route.web_search,
                auto_web_search: route.web_search,
                preview_mode: false,
                flags: Vec::new(),
                features: Vec::new(),
                enable_thinking: route.enable_thinking,
            },
            background_tasks: BackgroundTasks { title_generation: false, tags_generation: false },
            mcp_servers: route.mcp_servers.clone(),
            variables: template_variables(now, &self.config.upstream.timezone, &self.config.upstream.language),
            model_item: ModelItem {
                id: route.upstream_id.clone(),
                name: route.alias.clone(),
                owned_by: MODEL_OWNER.to_string(),
            },
            chat_id: chat_id.to_string(),
            id: id.to_string(),
            tools: self.forwarded_tools(request, route),
        }
    }

    /// Tools go upstream only with tool support on, a non-thinking route, and
    /// at least one tool supplied.
    fn forwarded_tools(&self, request: &ChatRequest, route: &ModelRoute) -> Option<Vec<Value>> {
        if !self.config.features.tool_support || route.is_thinking() {
            return None;
        }
        request.non_empty_tools().map(<[Value]>::to_vec)
    }
}
