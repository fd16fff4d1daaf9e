//! Per-event outcomes and the sinks that receive them.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::traits::OutcomeSink;

/// What happened to one consumed event.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub assessment_id: String,
    pub status: IngestStatus,
}

#[derive(Debug, Clone)]
pub enum IngestStatus {
    /// Subject and result were persisted.
    Ingested {
        subject_uuid: Uuid,
        result_uuid: Uuid,
        observations: usize,
        risks: usize,
        findings: usize,
        log_entries: usize,
    },
    /// The event was dropped. Nothing past the failure point was persisted.
    Abandoned { reason: String },
}

impl IngestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, IngestStatus::Ingested { .. })
    }
}

impl std::fmt::Display for IngestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.status {
            IngestStatus::Ingested {
                result_uuid,
                observations,
                risks,
                findings,
                log_entries,
                ..
            } => write!(
                f,
                "assessment {} ingested as result {result_uuid}: {observations} observation(s), {risks} risk(s), {findings} finding(s), {log_entries} log entries",
                self.assessment_id
            ),
            IngestStatus::Abandoned { reason } => {
                write!(f, "assessment {} abandoned: {reason}", self.assessment_id)
            }
        }
    }
}

/// Default sink: structured logs, one line per event.
pub struct TracingSink;

#[async_trait]
impl OutcomeSink for TracingSink {
    async fn report(&self, outcome: &IngestOutcome) -> Result<()> {
        match &outcome.status {
            IngestStatus::Ingested {
                subject_uuid,
                result_uuid,
                observations,
                risks,
                findings,
                log_entries,
            } => {
                tracing::info!(
                    assessment_id = outcome.assessment_id.as_str(),
                    subject_uuid = %subject_uuid,
                    result_uuid = %result_uuid,
                    observations,
                    risks,
                    findings,
                    log_entries,
                    "Execution result ingested"
                );
            }
            IngestStatus::Abandoned { reason } => {
                tracing::warn!(
                    assessment_id = outcome.assessment_id.as_str(),
                    reason = reason.as_str(),
                    "Execution result abandoned"
                );
            }
        }
        Ok(())
    }
}
