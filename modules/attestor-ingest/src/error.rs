use thiserror::Error;

/// Errors raised by the ingestion pipeline.
///
/// Only `Subscription` is fatal to the consumption loop. `Persistence`
/// and `MalformedBatch` are scoped to a single event: they become an
/// abandoned outcome for that event and the loop moves on.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Subscription error: {0}")]
    Subscription(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Malformed batch: {0}")]
    MalformedBatch(String),
}
