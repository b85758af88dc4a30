//! Credential file parsing.

use std::io::ErrorKind;
use std::path::Path;

use crate::error::AppResult;

/// Parse newline-delimited tokens. Blank lines and `#` comments are skipped,
/// duplicates keep their first position.
pub fn parse_tokens(raw: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for line in raw.lines() {
        let token = line.trim();
        if token.is_empty() || token.starts_with('#') {
            continue;
        }
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// Read the token file. A missing file is an empty pool, not an error.
pub async fn read_token_file(path: &Path) -> AppResult<Vec<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(parse_tokens(&raw)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("Token file {} not found, pool starts empty", path.display());
            Ok(Vec::new())
        },
        Err(e) => Err(e.into()),
    }
}
