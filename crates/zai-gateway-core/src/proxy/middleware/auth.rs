use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use zai_gateway_types::ProxyError;

use crate::proxy::handlers::error_response;
use crate::proxy::server::AppState;

/// Inbound API key check for the `/v1` routes.
pub async fn auth_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    tracing::info!("Request: {} {}", method, request.uri().path());

    if method == Method::OPTIONS || state.config.server.skip_auth {
        return next.run(request).await;
    }

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "));

    match check_api_key(presented, &state.config.server.api_key) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            tracing::warn!("Rejected {} {}: {}", method, request.uri().path(), e);
            error_response(&e)
        },
    }
}

fn check_api_key(presented: Option<&str>, expected: &str) -> Result<(), ProxyError> {
    let Some(key) = presented else {
        return Err(ProxyError::Unauthorized { message: "Missing or invalid Authorization header".into() });
    };
    if expected.is_empty() || !constant_time_compare(key.trim(), expected) {
        return Err(ProxyError::Unauthorized { message: "Invalid API key".into() });
    }
    Ok(())
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_api_key() {
        assert!(check_api_key(Some("sk-test"), "sk-test").is_ok());
        assert!(matches!(check_api_key(None, "sk-test"), Err(ProxyError::Unauthorized { .. })));
        assert!(check_api_key(Some("sk-other"), "sk-test").is_err());
        assert!(check_api_key(Some("sk-tes"), "sk-test").is_err());
        assert!(check_api_key(Some(""), "").is_err());
    }
}
