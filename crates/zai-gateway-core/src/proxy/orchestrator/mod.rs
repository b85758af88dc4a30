//! Attempt orchestrator.
//!
//! Runs one logical request as a bounded sequence of upstream attempts. The
//! transformed body is serialized once and reused; between attempts only the
//! credential binding changes. Output is always an SSE byte stream that ends
//! with exactly one `data: [DONE]`.

mod policy;


pub use policy::{
    exhaustion_envelope, fatal_envelope, next_step, AttemptOutcome, InterruptedUsePolicy, NextStep,
    INTERRUPTED_USE_POLICY,
};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use zai_gateway_types::protocol::ChatRequest;
use zai_gateway_types::{ProxyError, ThinkingMode};

use super::credential_pool::{Credential, CredentialPool};
use super::transformer::{OutboundHttpConfig, RequestTransformer, TransformedRequest};
use super::translator::{sse_line, ChunkFactory, StreamTranslator, DONE_LINE};
use super::upstream::{ByteStream, UpstreamTransport};
use policy::interrupted_envelope;

/// A credential handed to an attempt whose outcome is not known yet.
///
/// Dropping it unresolved (the client went away mid-attempt) applies
/// `INTERRUPTED_USE_POLICY`.
struct PendingUse {
    pool: Arc<CredentialPool>,
    credential: Credential,
    resolved: bool,
}

impl PendingUse {
    fn new(pool: Arc<CredentialPool>, credential: Credential) -> Self {
        Self { pool, credential, resolved: false }
    }

    fn succeed(mut self) {
        self.pool.report_success(&self.credential);
        self.resolved = true;
    }

    /// Outcome is reported elsewhere.
    fn release(mut self) {
        self.resolved = true;
    }
}

impl Drop for PendingUse {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }
        match INTERRUPTED_USE_POLICY {
            InterruptedUsePolicy::Neutral => {
                tracing::debug!("Attempt with {} interrupted by client", self.credential.redacted());
            },
            InterruptedUsePolicy::SoftFailure => {
                let cause = ProxyError::Transport { message: "client disconnected".into() };
                self.pool.report_failure(&self.credential, &cause);
            },
        }
    }
}

pub struct AttemptOrchestrator {
    transformer: Arc<RequestTransformer>,
    transport: Arc<dyn UpstreamTransport>,
    max_retries: u32,
    retry_delay: Duration,
    thinking_mode: ThinkingMode,
}

impl AttemptOrchestrator {
    pub fn new(transformer: Arc<RequestTransformer>, transport: Arc<dyn UpstreamTransport>) -> Self {
        let config = transformer.config();
        let max_retries = config.network.max_retries;
        let retry_delay = config.network.retry_delay();
        let thinking_mode = config.features.thinking_mode;
        Self { transformer, transport, max_retries, retry_delay, thinking_mode }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn transformer(&self) -> &Arc<RequestTransformer> {
        &self.transformer
    }

    /// Stream the translated response for `transformed`.
    pub fn run(
        &self,
        request: &ChatRequest,
        transformed: TransformedRequest,
    ) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
        let transformer = Arc::clone(&self.transformer);
        let transport = Arc::clone(&self.transport);
        let max_retries = self.max_retries;
        let retry_delay = self.retry_delay;
        let mode = self.thinking_mode;

        let factory = ChunkFactory::new(transformed.chat_id(), request.model.clone());
        let client_tools = if transformed.has_tools() {
            Some(request.tool_names())
        } else if transformed.has_mcp_servers() {
            Some(Vec::new())
        } else {
            None
        };
        let serialized = serde_json::to_vec(&transformed.body).map(Bytes::from);
        let TransformedRequest { mut http, mut credential, .. } = transformed;

        async_stream::stream! {
            let body = match serialized {
                Ok(body) => body,
                Err(e) => {
                    let error = ProxyError::Internal { message: format!("failed to serialize upstream body: {e}") };
                    yield Ok(sse_line(&fatal_envelope(&error)));
                    yield Ok(Bytes::from_static(DONE_LINE.as_bytes()));
                    return;
                },
            };

            let pool = Arc::clone(transformer.pool());
            let mut attempts: u32 = 0;

            loop {
                attempts += 1;
                tracing::debug!("Upstream attempt {}/{} with {}", attempts, max_retries + 1, credential.redacted());

                let pending = PendingUse::new(Arc::clone(&pool), credential.clone());
                let result: Result<(), ProxyError> = match open_stream(transport.as_ref(), &http, body.clone()).await {
                    Err(e) => {
                        pending.release();
                        Err(e)
                    },
                    Ok(mut upstream) => {
                        let mut pending = Some(pending);
                        let mut translator = StreamTranslator::new(factory.clone(), mode, client_tools.clone());
                        let mut read_error = None;

                        while let Some(item) = upstream.next().await {
                            match item {
                                Ok(bytes) => {
                                    if !bytes.is_empty() {
                                        if let Some(first) = pending.take() {
                                            first.succeed();
                                        }
                                    }
                                    for event in translator.push(&bytes) {
                                        yield Ok(event.to_bytes());
                                    }
                                    if translator.is_done() {
                                        break;
                                    }
                                },
                                Err(e) => {
                                    read_error = Some(e);
                                    break;
                                },
                            }
                        }
                        if let Some(unresolved) = pending.take() {
                            unresolved.release();
                        }

                        match read_error {
                            Some(e) if !translator.has_output() => Err(e),
                            Some(e) => {
                                tracing::warn!("Upstream stream failed after output started: {}", e);
                                for event in translator.fail(interrupted_envelope(&e)) {
                                    yield Ok(event.to_bytes());
                                }
                                Ok(())
                            },
                            None => {
                                for event in translator.finish() {
                                    yield Ok(event.to_bytes());
                                }
                                Ok(())
                            },
                        }
                    },
                };

                let outcome = AttemptOutcome::from(result);
                let step = next_step(&outcome, attempts, max_retries);
                let cause = match outcome {
                    AttemptOutcome::Completed => break,
                    AttemptOutcome::Retryable(e) | AttemptOutcome::Fatal(e) => e,
                };

                let envelope = match step {
                    NextStep::Retry => {
                        tracing::warn!("Attempt {} failed, retrying in {:?}: {}", attempts, retry_delay, cause);
                        pool.report_failure(&credential, &cause);
                        tokio::time::sleep(retry_delay).await;
                        match transformer.rebind(&mut http).await {
                            Ok(next) => {
                                credential = next;
                                continue;
                            },
                            Err(e) => {
                                tracing::error!("No credential for retry: {}", e);
                                fatal_envelope(&e)
                            },
                        }
                    },
                    NextStep::Exhausted => {
                        tracing::error!("Giving up after {} attempt(s): {}", attempts, cause);
                        pool.report_failure(&credential, &cause);
                        exhaustion_envelope(&cause, max_retries)
                    },
                    NextStep::Abort | NextStep::Finish => {
                        tracing::error!("Upstream request failed: {}", cause);
                        fatal_envelope(&cause)
                    },
                };

                yield Ok(sse_line(&envelope));
                yield Ok(Bytes::from_static(DONE_LINE.as_bytes()));
                break;
            }
        }
    }
}

/// Send one attempt and check the status. A 400 is retryable; any other
/// non-200 status is not.
async fn open_stream(
    transport: &dyn UpstreamTransport,
    http: &OutboundHttpConfig,
    body: Bytes,
) -> Result<ByteStream, ProxyError> {
    let outbound = http.to_request(body)?;
    let response = transport.send(&outbound).await?;

    match response.status {
        200 => Ok(response.body),
        400 => {
            let body = response.read_text().await;
            tracing::warn!("Upstream returned 400: {}", body);
            Err(ProxyError::UpstreamBadRequest { body })
        },
        status => {
            let message = response.read_text().await;
            tracing::error!("Upstream returned {}: {}", status, message);
            Err(ProxyError::UpstreamStatus { status, message })
        },
    }
}
