//! Assessment-result ingestion pipeline.
//!
//! A background consumer that subscribes to execution-result events from
//! remote assessment runtimes, builds the related compliance records —
//! subject, observations with evidence, risks, findings, log entries,
//! and the aggregate result — assigns fresh identities and
//! cross-references, and persists them.
//!
//! The event bus and the storage engine live behind the `EventSource`
//! and `ResultStore` traits; deployments inject real adapters, tests
//! inject the fakes in `testing`. Per-event outcomes flow to an
//! `OutcomeSink`; only a failed subscription stops the loop.

pub mod batch;
pub mod config;
pub mod error;
pub mod event;
pub mod outcome;
pub mod processor;
pub mod testing;
pub mod traits;

pub use batch::{build_batch, AssessmentBatch, RiskLinkPolicy};
pub use config::{ProcessorConfig, RetryPolicy};
pub use error::IngestError;
pub use event::ExecutionResult;
pub use outcome::{IngestOutcome, IngestStatus, TracingSink};
pub use processor::ResultProcessor;
pub use traits::{EventSource, EventStream, OutcomeSink, ResultStore};
