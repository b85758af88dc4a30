// OpenAI chat completions
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use zai_gateway_types::protocol::ChatRequest;
use zai_gateway_types::ProxyError;

use crate::error::AppResult;
use crate::proxy::server::AppState;

/// `POST /v1/chat/completions`. Always answers as an SSE stream; once the
/// stream has started, failures arrive in-band.
pub async fn handle_chat_completions(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) =
        payload.map_err(|rejection| ProxyError::InvalidRequest { message: rejection.body_text() })?;
    if request.messages.is_empty() {
        return Err(ProxyError::InvalidRequest { message: "messages must not be empty".into() }.into());
    }
    if !request.stream {
        tracing::debug!("Client asked for a non-streaming response; streaming anyway");
    }
    tracing::info!("Chat request: model={} messages={}", request.model, request.messages.len());

    let transformed = state
        .orchestrator
        .transformer()
        .transform(&request)
        .await
        .inspect_err(|e| tracing::error!("Request transform failed: {}", e))?;

    let stream = state.orchestrator.run(&request, transformed);
    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
