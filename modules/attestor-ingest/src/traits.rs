// Trait abstractions for the processor's collaborators.
//
// EventSource hides the event bus — the processor only knows
// "subscribe to a topic, get a stream". ResultStore hides the storage
// engine. OutcomeSink receives the typed per-event outcome.
//
// These enable deterministic testing with ChannelEventSource and
// MemoryResultStore: no broker, no database.

use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;

use attestor_oscal::{AssessmentResult, Subject};

use crate::event::ExecutionResult;
use crate::outcome::IngestOutcome;

/// Stream of execution-result events for one subscription.
pub type EventStream = Pin<Box<dyn Stream<Item = ExecutionResult> + Send>>;

/// The event bus, reduced to the one call the processor needs.
///
/// Delivery is assumed at-least-once and ordered within a stream.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Establish the subscription. Failing here is a startup condition —
    /// the processor does not run without it.
    async fn subscribe(&self, topic: &str) -> Result<EventStream>;
}

/// The persistence service. Internally thread-safe; provides no
/// cross-call transaction, so a subject can exist without its result.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn save_subject(&self, subject: &Subject) -> Result<()>;

    /// Persist the aggregate result, keyed by the event's assessment id.
    async fn save_result(&self, assessment_id: &str, result: &AssessmentResult) -> Result<()>;
}

/// Receives one outcome per consumed event, success or failure.
///
/// Sink errors are logged by the processor and never affect the loop.
#[async_trait]
pub trait OutcomeSink: Send + Sync {
    async fn report(&self, outcome: &IngestOutcome) -> Result<()>;
}
