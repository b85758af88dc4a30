//! Retry policy as a pure function of attempt outcomes.

use zai_gateway_types::protocol::ErrorEnvelope;
use zai_gateway_types::ProxyError;

/// How a client disconnect before the first upstream byte counts against the
/// credential in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptedUsePolicy {
    /// Neither success nor failure
    Neutral,
    /// One failure, as if the upstream had dropped the connection
    SoftFailure,
}

/// Client disconnects say nothing about the credential's health.
pub const INTERRUPTED_USE_POLICY: InterruptedUsePolicy = InterruptedUsePolicy::Neutral;

/// Result of one upstream attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// The stream was translated to its end (including an in-band error
    /// after output had already started).
    Completed,
    Retryable(ProxyError),
    Fatal(ProxyError),
}

impl From<Result<(), ProxyError>> for AttemptOutcome {
    fn from(result: Result<(), ProxyError>) -> Self {
        match result {
            Ok(()) => Self::Completed,
            Err(e) if e.is_retryable() => Self::Retryable(e),
            Err(e) => Self::Fatal(e),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum NextStep {
    Finish,
    Retry,
    /// Retryable failure with no attempts left
    Exhausted,
    Abort,
}

/// `attempts` counts attempts made so far, including the one in `outcome`.
/// Up to `max_retries` retries follow the first attempt.
pub fn next_step(outcome: &AttemptOutcome, attempts: u32, max_retries: u32) -> NextStep {
    match outcome {
        AttemptOutcome::Completed => NextStep::Finish,
        AttemptOutcome::Fatal(_) => NextStep::Abort,
        AttemptOutcome::Retryable(_) if attempts <= max_retries => NextStep::Retry,
        AttemptOutcome::Retryable(_) => NextStep::Exhausted,
    }
}

/// In-band error for a retryable failure that ran out of attempts.
pub fn exhaustion_envelope(last: &ProxyError, max_retries: u32) -> ErrorEnvelope {
    match last {
        ProxyError::UpstreamBadRequest { body } => ErrorEnvelope::new(
            format!("Request failed after {max_retries} retries: 400 Bad Request: {body}"),
            "upstream_error",
            Some(400),
        ),
        ProxyError::Transport { message } => ErrorEnvelope::new(
            format!("Stream processing failed after {max_retries} retries: {message}"),
            "stream_error",
            None,
        ),
        other => fatal_envelope(other),
    }
}

/// In-band error for a failure that is never retried.
pub fn fatal_envelope(error: &ProxyError) -> ErrorEnvelope {
    ErrorEnvelope::new(error.to_string(), error.error_type(), Some(error.http_status_code()))
}

/// In-band error for a read failure after output already reached the client.
pub fn interrupted_envelope(error: &ProxyError) -> ErrorEnvelope {
    ErrorEnvelope::new(format!("Stream interrupted: {error}"), "stream_error", None)
}
