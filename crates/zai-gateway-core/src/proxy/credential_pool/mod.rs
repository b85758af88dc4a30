//! Credential pool.
//!
//! Two sources, tried in order: an optional ephemeral issuer (anonymous guest
//! tokens), then a file-backed round-robin pool. Pooled credentials whose
//! consecutive-failure count reaches `max_failures` are skipped by `acquire`
//! but kept until the next reload, which rebuilds the pool from disk with
//! fresh counters.
//!
//! All bookkeeping sits behind one `parking_lot::Mutex`; the lock is never held
//! across an await or a network call.

mod anonymous;
mod credential;
mod token_file;

#[cfg(test)]
mod tests;

pub use anonymous::{EphemeralIssuer, GuestTokenIssuer, ANONYMOUS_ISSUE_TIMEOUT};
pub use credential::{Credential, Provenance};
pub use token_file::{parse_tokens, read_token_file};

use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use zai_gateway_types::ProxyError;

use crate::error::AppResult;
use credential::redact;

struct PoolEntry {
    token: Arc<str>,
    failures: u32,
}

#[derive(Default)]
struct PoolState {
    entries: Vec<PoolEntry>,
    cursor: usize,
}

/// Snapshot of one pooled credential, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolEntryStatus {
    pub token_prefix: String,
    pub failures: u32,
    pub usable: bool,
}

pub struct CredentialPool {
    state: Mutex<PoolState>,
    token_file: Option<PathBuf>,
    backup_token: Option<String>,
    max_failures: u32,
    ephemeral: Option<Arc<dyn EphemeralIssuer>>,
}

impl CredentialPool {
    pub fn new(token_file: Option<PathBuf>, backup_token: Option<String>, max_failures: u32) -> Self {
        Self {
            state: Mutex::new(PoolState::default()),
            token_file,
            backup_token: backup_token.filter(|t| !t.trim().is_empty()),
            max_failures: max_failures.max(1),
            ephemeral: None,
        }
    }

    /// Prefer credentials from `issuer` over the file-backed pool.
    pub fn with_ephemeral_issuer(mut self, issuer: Arc<dyn EphemeralIssuer>) -> Self {
        self.ephemeral = Some(issuer);
        self
    }

    /// Pool built directly from a token list, without a backing file.
    pub fn from_tokens<I, S>(tokens: I, max_failures: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pool = Self::new(None, None, max_failures);
        let raw: Vec<String> = tokens.into_iter().map(|t| t.as_ref().to_string()).collect();
        pool.replace_entries(parse_tokens(&raw.join("\n")));
        pool
    }

    /// Next usable credential: ephemeral first (if configured), then round-robin
    /// over pooled entries below the failure threshold.
    pub async fn acquire(&self) -> Result<Credential, ProxyError> {
        if let Some(issuer) = &self.ephemeral {
            match issuer.issue().await {
                Ok(token) => {
                    tracing::debug!("Issued guest credential {}", redact(&token));
                    return Ok(Credential::new(token, Provenance::Ephemeral));
                },
                Err(e) => tracing::warn!("Guest credential issuance failed: {}", e),
            }
        }

        self.select_pooled().ok_or_else(|| ProxyError::CredentialExhausted {
            reason: "no pooled credential below the failure threshold".to_string(),
        })
    }

    fn select_pooled(&self) -> Option<Credential> {
        let mut state = self.state.lock();
        let len = state.entries.len();
        for offset in 0..len {
            let idx = (state.cursor + offset) % len;
            if state.entries[idx].failures < self.max_failures {
                state.cursor = (idx + 1) % len;
                let token = Arc::clone(&state.entries[idx].token);
                return Some(Credential::new(token, Provenance::Pooled));
            }
        }
        None
    }

    /// Reset the credential's consecutive-failure count.
    pub fn report_success(&self, credential: &Credential) {
        if credential.provenance() == Provenance::Ephemeral {
            return;
        }
        let mut state = self.state.lock();
        if let Some(entry) = find_entry(&mut state, credential) {
            if entry.failures > 0 {
                tracing::debug!("Credential {} recovered after {} failure(s)", credential.redacted(), entry.failures);
            }
            entry.failures = 0;
        }
    }

    /// Count one failed use against the credential.
    pub fn report_failure(&self, credential: &Credential, cause: &ProxyError) {
        if credential.provenance() == Provenance::Ephemeral {
            tracing::debug!("Guest credential {} failed: {}", credential.redacted(), cause);
            return;
        }
        let mut state = self.state.lock();
        if let Some(entry) = find_entry(&mut state, credential) {
            entry.failures = entry.failures.saturating_add(1);
            if entry.failures == self.max_failures {
                tracing::warn!(
                    "Credential {} reached {} consecutive failures, skipping until reload (last: {})",
                    credential.redacted(),
                    entry.failures,
                    cause
                );
            } else {
                tracing::debug!(
                    "Credential {} failure {}/{}: {}",
                    credential.redacted(),
                    entry.failures,
                    self.max_failures,
                    cause
                );
            }
        }
    }

    /// Re-read the token file (plus the backup token) and rebuild the pool.
    /// Returns the number of pooled credentials.
    pub async fn reload(&self) -> AppResult<usize> {
        let mut tokens = match &self.token_file {
            Some(path) => read_token_file(path).await?,
            None => Vec::new(),
        };
        if let Some(backup) = &self.backup_token {
            let backup = backup.trim();
            if !tokens.iter().any(|t| t == backup) {
                tokens.push(backup.to_string());
            }
        }
        Ok(self.replace_entries(tokens))
    }

    fn replace_entries(&self, tokens: Vec<String>) -> usize {
        let entries: Vec<PoolEntry> =
            tokens.into_iter().map(|t| PoolEntry { token: Arc::from(t), failures: 0 }).collect();
        let count = entries.len();
        let mut state = self.state.lock();
        state.entries = entries;
        state.cursor = 0;
        count
    }

    /// Periodically reload from disk so external edits apply without restart.
    pub fn start_auto_reload(self: &Arc<Self>, interval: Duration) {
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Skip first tick (pool already loaded at startup)
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match pool.reload().await {
                    Ok(count) => tracing::debug!("Credential pool reloaded: {} token(s)", count),
                    Err(e) => tracing::warn!("Credential pool reload failed: {}", e),
                }
            }
        });
        tracing::info!("Credential pool auto-reload started (interval: {}s)", interval.as_secs());
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pooled credentials still below the failure threshold.
    pub fn usable_count(&self) -> usize {
        let state = self.state.lock();
        state.entries.iter().filter(|e| e.failures < self.max_failures).count()
    }

    pub fn has_ephemeral_source(&self) -> bool {
        self.ephemeral.is_some()
    }

    pub fn status(&self) -> Vec<PoolEntryStatus> {
        let state = self.state.lock();
        state
            .entries
            .iter()
            .map(|e| PoolEntryStatus {
                token_prefix: redact(&e.token),
                failures: e.failures,
                usable: e.failures < self.max_failures,
            })
            .collect()
    }
}

fn find_entry<'a>(state: &'a mut PoolState, credential: &Credential) -> Option<&'a mut PoolEntry> {
    let wanted = credential.shared_token();
    state.entries.iter_mut().find(|e| Arc::ptr_eq(&e.token, wanted) || *e.token == **wanted)
}
