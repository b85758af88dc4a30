use std::fmt;
use std::sync::Arc;

/// Where a credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Issued by the anonymous-session endpoint for this request only
    Ephemeral,
    /// Drawn from the file-backed rotation pool
    Pooled,
}

/// A bearer credential handed out for the lifetime of one attempt.
///
/// Failure counts live in the pool, keyed by token; this handle only
/// identifies which entry to report against.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: Arc<str>,
    provenance: Provenance,
}

impl Credential {
    pub fn new(token: impl Into<Arc<str>>, provenance: Provenance) -> Self {
        Self { token: token.into(), provenance }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Short prefix safe for logs.
    pub fn redacted(&self) -> String {
        redact(&self.token)
    }

    pub(super) fn shared_token(&self) -> &Arc<str> {
        &self.token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &self.redacted())
            .field("provenance", &self.provenance)
            .finish()
    }
}

pub(crate) fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(12).collect();
    format!("{prefix}...")
}
