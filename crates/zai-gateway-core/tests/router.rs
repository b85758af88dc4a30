#![allow(unused_crate_dependencies)]
#![allow(clippy::tests_outside_test_module, reason = "integration tests live in tests/ dir")]
#![allow(clippy::expect_used, reason = "integration test, panics are the assertion mechanism")]

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use bytes::Bytes;
use serde_json::{json, Value};
use std::sync::Arc;
use zai_gateway_core::proxy::upstream::{OutboundRequest, UpstreamResponse, UpstreamTransport};
use zai_gateway_core::proxy::{build_router, AppState, CredentialPool};
use zai_gateway_types::{GatewayConfig, ProxyError};

const API_KEY: &str = "sk-test-key";

/// Answers every call with the same short SSE reply.
struct CannedTransport;

#[async_trait]
impl UpstreamTransport for CannedTransport {
    async fn send(&self, _request: &OutboundRequest) -> Result<UpstreamResponse, ProxyError> {
        let body = concat!(
            "data: {\"data\":{\"phase\":\"answer\",\"delta_content\":\"pong\"}}\n",
            "data: {\"data\":{\"phase\":\"answer\",\"usage\":{\"total_tokens\":2}}}\n",
        );
        let chunks = vec![Ok::<_, ProxyError>(Bytes::from_static(body.as_bytes()))];
        Ok(UpstreamResponse { status: 200, body: Box::pin(futures::stream::iter(chunks)) })
    }
}

fn server_with(config: GatewayConfig, tokens: &[&str]) -> TestServer {
    let pool = Arc::new(CredentialPool::from_tokens(tokens.iter().copied(), 3));
    let state = AppState::new(Arc::new(config), pool, Arc::new(CannedTransport));
    TestServer::new(build_router(state)).expect("test server")
}

fn server() -> TestServer {
    let mut config = GatewayConfig::default();
    config.server.api_key = API_KEY.to_string();
    server_with(config, &["tok"])
}

fn chat_body() -> Value {
    json!({"model": "GLM-4.5", "messages": [{"role": "user", "content": "ping"}], "stream": true})
}

#[tokio::test]
async fn test_health_needs_no_auth() {
    let response = server().get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"status": "ok"}));
}

#[tokio::test]
async fn test_missing_key_rejected() {
    let response = server().get("/v1/models").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: Value = response.json();
    assert_eq!(body["error"]["type"], "authentication_error");
    assert_eq!(body["error"]["code"], 401);
}

#[tokio::test]
async fn test_wrong_key_rejected() {
    let response = server().post("/v1/chat/completions").authorization_bearer("sk-wrong").json(&chat_body()).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_skip_auth() {
    let mut config = GatewayConfig::default();
    config.server.skip_auth = true;
    let response = server_with(config, &["tok"]).get("/v1/models").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_models_listing() {
    let response = server().get("/v1/models").authorization_bearer(API_KEY).await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["object"], "list");
    let ids: Vec<&str> = body["data"].as_array().expect("data").iter().filter_map(|m| m["id"].as_str()).collect();
    assert_eq!(ids, vec!["GLM-4.5", "GLM-4.5-Thinking", "GLM-4.5-Search", "GLM-4.5-Air"]);
    for model in body["data"].as_array().expect("data") {
        assert_eq!(model["object"], "model");
        assert_eq!(model["owned_by"], "z.ai");
        assert!(model["created"].is_number());
    }
}

#[tokio::test]
async fn test_chat_streams_sse() {
    let response = server().post("/v1/chat/completions").authorization_bearer(API_KEY).json(&chat_body()).await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "text/event-stream");

    let text = response.text();
    assert!(text.contains("\"content\":\"pong\""));
    assert!(text.contains("\"finish_reason\":\"stop\""));
    assert!(text.ends_with("data: [DONE]\n\n"));
    assert_eq!(text.matches("[DONE]").count(), 1);
}

#[tokio::test]
async fn test_non_streaming_request_still_streams() {
    let mut body = chat_body();
    body["stream"] = json!(false);
    let response = server().post("/v1/chat/completions").authorization_bearer(API_KEY).json(&body).await;
    response.assert_status_ok();
    assert!(response.text().ends_with("data: [DONE]\n\n"));
}

#[tokio::test]
async fn test_no_credentials_is_server_error() {
    let mut config = GatewayConfig::default();
    config.server.skip_auth = true;
    let response = server_with(config, &[]).post("/v1/chat/completions").json(&chat_body()).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    assert_eq!(body["error"]["type"], "credential_error");
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let response = server()
        .post("/v1/chat/completions")
        .authorization_bearer(API_KEY)
        .json(&json!({"messages": "not a list"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["type"], "invalid_request_error");
}
