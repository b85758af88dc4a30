// API endpoint handlers

pub mod chat;
pub mod health;
pub mod models;

pub use chat::handle_chat_completions;
pub use health::handle_health;
pub use models::handle_list_models;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use zai_gateway_types::protocol::ErrorEnvelope;
use zai_gateway_types::ProxyError;

/// JSON error response for failures raised before streaming starts.
pub fn error_response(error: &ProxyError) -> Response {
    let code = error.http_status_code();
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let envelope = ErrorEnvelope::new(error.to_string(), error.error_type(), Some(code));
    (status, Json(envelope)).into_response()
}
