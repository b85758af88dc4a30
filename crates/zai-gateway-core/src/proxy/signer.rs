//! Request signer.
//!
//! `X-Signature` is a two-stage HMAC-SHA256:
//!
//! ```text
//! window_key = hex(HMAC(secret, floor(ts / 300000)))
//! signature  = hex(HMAC(window_key, "{canonical}|{base64(content)}|{ts}"))
//! canonical  = "requestId,{request_id},timestamp,{ts},user_id,{user_id}"
//! ```
//!
//! The user id comes from the unverified JWT payload `id` claim; tokens that are
//! not JWT-shaped sign as `guest`.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use zai_gateway_types::ProxyError;

type HmacSha256 = Hmac<Sha256>;

/// Width of the key rotation window in milliseconds.
pub const SIGNATURE_WINDOW_MS: i64 = 5 * 60 * 1000;

/// User id used when the credential carries none.
pub const ANONYMOUS_USER_ID: &str = "guest";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub signature: String,
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone)]
pub struct RequestSigner {
    secret: String,
}

impl RequestSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    pub fn sign(
        &self,
        token: &str,
        request_id: &str,
        timestamp_ms: i64,
        content: &str,
    ) -> Result<Signature, ProxyError> {
        let user_id = extract_user_id(token);
        let canonical = canonical_string(request_id, timestamp_ms, &user_id);
        let signature = self.sign_canonical(&canonical, content, timestamp_ms)?;
        Ok(Signature { signature, timestamp_ms })
    }

    /// Signature over an already-built canonical string.
    pub fn sign_canonical(
        &self,
        canonical: &str,
        content: &str,
        timestamp_ms: i64,
    ) -> Result<String, ProxyError> {
        let window = timestamp_ms.div_euclid(SIGNATURE_WINDOW_MS);
        let window_key = hmac_hex(self.secret.as_bytes(), window.to_string().as_bytes())?;
        let message = format!("{}|{}|{}", canonical, STANDARD.encode(content), timestamp_ms);
        hmac_hex(window_key.as_bytes(), message.as_bytes())
    }
}

pub fn canonical_string(request_id: &str, timestamp_ms: i64, user_id: &str) -> String {
    format!("requestId,{request_id},timestamp,{timestamp_ms},user_id,{user_id}")
}

/// Decode (without verifying) a JWT payload segment.
pub fn decode_jwt_payload(token: &str) -> Option<Value> {
    let mut segments = token.split('.');
    let (_header, payload, _sig) = (segments.next()?, segments.next()?, segments.next()?);
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

pub fn extract_user_id(token: &str) -> String {
    decode_jwt_payload(token)
        .and_then(|payload| match payload.get("id") {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| ANONYMOUS_USER_ID.to_string())
}

fn hmac_hex(key: &[u8], message: &[u8]) -> Result<String, ProxyError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| ProxyError::Internal { message: format!("hmac key: {e}") })?;
    mac.update(message);
    Ok(to_hex(&mac.finalize().into_bytes()))
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_JWT: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJpZCI6InRlc3QtdXNlci0xMjMiLCJleHAiOjk5OTk5OTk5OTl9.example";

    fn signer() -> RequestSigner {
        RequestSigner::new("junjie")
    }

    #[test]
    fn test_reference_vector_canonical() {
        let sig = signer()
            .sign_canonical(
                "requestId,abc-123,timestamp,1694006400000,user_id,user-456",
                "Hello, how can I help you?",
                1_694_006_400_000,
            )
            .unwrap();
        assert_eq!(sig, "5482b4b1ec9fd834bf5f43d6b81db9bb5354ed7bbbd106d3943cf176cbae8501");
    }

    #[test]
    fn test_reference_vector_from_jwt() {
        let sig = signer().sign(TEST_JWT, "test-request-123", 1_700_000_000_000, "hello").unwrap();
        assert_eq!(sig.signature, "0f0f5a925f249d9f167060772067291c8569b24facd51a300160cbc2fff4a356");
        assert_eq!(sig.timestamp_ms, 1_700_000_000_000);
    }

    #[test]
    fn test_non_jwt_signs_as_guest() {
        let sig = signer().sign("opaque-token", "req-1", 1_700_000_000_000, "hello").unwrap();
        assert_eq!(sig.signature, "5c755b24508d38f638256852d7044a4faaf59d1e740fb21686c86439f4866655");
    }

    #[test]
    fn test_deterministic() {
        let a = signer().sign(TEST_JWT, "r", 1_700_000_000_000, "hi").unwrap();
        let b = signer().sign(TEST_JWT, "r", 1_700_000_000_000, "hi").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_timestamp_change_alone_changes_signature() {
        let a = signer().sign(TEST_JWT, "test-request-123", 1_700_000_000_000, "hello").unwrap();
        let b = signer().sign(TEST_JWT, "test-request-123", 1_700_000_000_001, "hello").unwrap();
        assert_ne!(a.signature, b.signature);
        assert_eq!(b.signature, "1e4f20f9eafd57a12c3f231c55a1d6d5e7c4b51a50c3e0837563058daab992bd");
    }

    #[test]
    fn test_every_input_matters() {
        let base = signer().sign(TEST_JWT, "r", 1_700_000_000_000, "hi").unwrap().signature;
        assert_ne!(base, signer().sign("other", "r", 1_700_000_000_000, "hi").unwrap().signature);
        assert_ne!(base, signer().sign(TEST_JWT, "r2", 1_700_000_000_000, "hi").unwrap().signature);
        assert_ne!(base, signer().sign(TEST_JWT, "r", 1_700_000_000_000, "ho").unwrap().signature);
        assert_ne!(
            base,
            RequestSigner::new("other").sign(TEST_JWT, "r", 1_700_000_000_000, "hi").unwrap().signature
        );
    }

    #[test]
    fn test_jwt_payload_decoding() {
        let payload = decode_jwt_payload(TEST_JWT).unwrap();
        assert_eq!(payload["id"], "test-user-123");
        assert_eq!(payload["exp"], 9_999_999_999_i64);
        assert_eq!(extract_user_id(TEST_JWT), "test-user-123");
        assert!(decode_jwt_payload("not-a-jwt").is_none());
    }
}
