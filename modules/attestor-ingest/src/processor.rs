//! The consumption loop.
//!
//! Subscribe once, then drain the stream for the life of the process:
//! build the batch, persist the subject, persist the result, report the
//! outcome, next event. One event is fully processed before the next is
//! read — throughput is bounded by persistence latency by design.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::batch::build_batch;
use crate::config::ProcessorConfig;
use crate::error::IngestError;
use crate::event::ExecutionResult;
use crate::outcome::{IngestOutcome, IngestStatus};
use crate::traits::{EventSource, OutcomeSink, ResultStore};

/// Consumes execution-result events and persists the records they
/// describe. Collaborators are injected; see `crate::testing` for the
/// in-memory set.
pub struct ResultProcessor {
    source: Arc<dyn EventSource>,
    store: Arc<dyn ResultStore>,
    sink: Arc<dyn OutcomeSink>,
    config: ProcessorConfig,
}

impl ResultProcessor {
    pub fn new(
        source: Arc<dyn EventSource>,
        store: Arc<dyn ResultStore>,
        sink: Arc<dyn OutcomeSink>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            source,
            store,
            sink,
            config,
        }
    }

    /// Spawn the consumption loop as a dedicated background task.
    pub fn spawn(
        self: Arc<Self>,
        cancel: watch::Receiver<bool>,
    ) -> JoinHandle<Result<(), IngestError>> {
        tokio::spawn(async move { self.run(cancel).await })
    }

    /// Run the consumption loop until the stream ends or `cancel` flips
    /// to true.
    ///
    /// The only error this returns is a failed subscription — a startup
    /// condition. Per-event failures become `Abandoned` outcomes and the
    /// loop continues. Cancellation is observed at the stream receive
    /// only: an in-flight event always drains to completion, both
    /// persistence calls included.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) -> Result<(), IngestError> {
        let topic = self.config.topic.as_str();
        let mut stream = self
            .source
            .subscribe(topic)
            .await
            .map_err(|e| IngestError::Subscription(format!("topic '{topic}': {e:#}")))?;

        info!(topic, "Subscribed to execution results");

        loop {
            let event = tokio::select! {
                _ = cancel.changed() => {
                    info!(topic, "Shutdown requested, stopping consumption");
                    break;
                }
                next = stream.next() => match next {
                    Some(event) => event,
                    None => {
                        info!(topic, "Event stream closed");
                        break;
                    }
                },
            };

            let outcome = self.ingest(&event).await;
            if let Err(e) = self.sink.report(&outcome).await {
                warn!(error = %e, assessment_id = event.assessment_id.as_str(), "Failed to report outcome");
            }
        }

        Ok(())
    }

    /// Process one event end to end. Never fails the loop.
    async fn ingest(&self, event: &ExecutionResult) -> IngestOutcome {
        match self.try_ingest(event).await {
            Ok(status) => IngestOutcome {
                assessment_id: event.assessment_id.clone(),
                status,
            },
            Err(e) => {
                warn!(
                    assessment_id = event.assessment_id.as_str(),
                    error = %e,
                    "Event abandoned"
                );
                IngestOutcome {
                    assessment_id: event.assessment_id.clone(),
                    status: IngestStatus::Abandoned {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }

    async fn try_ingest(&self, event: &ExecutionResult) -> Result<IngestStatus, IngestError> {
        let batch = build_batch(event, self.config.risk_link)?;

        // Subject first; if it cannot be saved the result is never
        // attempted and the event is abandoned.
        self.persist("subject", || self.store.save_subject(&batch.subject))
            .await?;
        self.persist("result", || {
            self.store.save_result(&event.assessment_id, &batch.result)
        })
        .await?;

        Ok(IngestStatus::Ingested {
            subject_uuid: batch.subject.uuid,
            result_uuid: batch.result.uuid,
            observations: batch.result.observations.len(),
            risks: batch.result.risks.len(),
            findings: batch.result.findings.len(),
            log_entries: batch.result.assessment_log.len(),
        })
    }

    /// Run one persistence call under the retry policy.
    async fn persist<F, Fut>(&self, entity: &'static str, op: F) -> Result<(), IngestError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let policy = self.config.retry;
        let mut attempt: u32 = 0;

        loop {
            match op().await {
                Ok(()) => return Ok(()),
                Err(e) if attempt + 1 < policy.max_attempts => {
                    let backoff = backoff_with_jitter(policy.base, attempt);
                    warn!(
                        entity,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Persistence failed, retrying after backoff"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(IngestError::Persistence(format!("{entity}: {e:#}")));
                }
            }
        }
    }
}

/// Exponential backoff `base * 3^attempt` plus 0-250ms jitter. Zero base
/// means zero backoff (tests).
fn backoff_with_jitter(base: Duration, attempt: u32) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }
    let backoff = base * 3u32.saturating_pow(attempt);
    backoff + Duration::from_millis(rand::rng().random_range(0..250))
}
