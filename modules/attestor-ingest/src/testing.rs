// Test doubles for the processor's trait boundaries.
//
// Three fakes matching the three seams:
// - ChannelEventSource (EventSource) — mpsc-fed stream, no broker
// - MemoryResultStore (ResultStore) — in-memory saves, scriptable failures
// - MemorySink (OutcomeSink) — collects outcomes for assertions
//
// Plus helpers for constructing execution-result events.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

use attestor_oscal::{AssessmentResult, Subject};

use crate::event::{
    ExecutionResult, FindingDescriptor, LogDescriptor, ObservationDescriptor, RiskDescriptor,
    SubjectDescriptor,
};
use crate::outcome::IngestOutcome;
use crate::traits::{EventSource, EventStream, OutcomeSink, ResultStore};

// ---------------------------------------------------------------------------
// ChannelEventSource
// ---------------------------------------------------------------------------

/// Channel-backed event source. Push events through the sender; drop it
/// to end the stream. The subscription can be taken once.
pub struct ChannelEventSource {
    rx: Mutex<Option<mpsc::UnboundedReceiver<ExecutionResult>>>,
}

impl ChannelEventSource {
    pub fn new() -> (Self, mpsc::UnboundedSender<ExecutionResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                rx: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

#[async_trait]
impl EventSource for ChannelEventSource {
    async fn subscribe(&self, topic: &str) -> Result<EventStream> {
        let Some(mut rx) = self.rx.lock().unwrap().take() else {
            bail!("subscription for '{topic}' already taken");
        };

        Ok(Box::pin(async_stream::stream! {
            while let Some(event) = rx.recv().await {
                yield event;
            }
        }))
    }
}

// ---------------------------------------------------------------------------
// MemoryResultStore
// ---------------------------------------------------------------------------

/// In-memory result store. Records every save in call order; can be
/// scripted to fail the next N saves of either kind.
pub struct MemoryResultStore {
    subjects: Mutex<Vec<Subject>>,
    results: Mutex<Vec<(String, AssessmentResult)>>,
    fail_subject_saves: AtomicU32,
    fail_result_saves: AtomicU32,
    subject_attempts: AtomicU32,
    result_attempts: AtomicU32,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self {
            subjects: Mutex::new(Vec::new()),
            results: Mutex::new(Vec::new()),
            fail_subject_saves: AtomicU32::new(0),
            fail_result_saves: AtomicU32::new(0),
            subject_attempts: AtomicU32::new(0),
            result_attempts: AtomicU32::new(0),
        }
    }

    /// Fail the next `n` subject saves with a transient error.
    pub fn fail_next_subject_saves(&self, n: u32) {
        self.fail_subject_saves.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` result saves with a transient error.
    pub fn fail_next_result_saves(&self, n: u32) {
        self.fail_result_saves.store(n, Ordering::SeqCst);
    }

    pub fn subjects(&self) -> Vec<Subject> {
        self.subjects.lock().unwrap().clone()
    }

    pub fn results(&self) -> Vec<(String, AssessmentResult)> {
        self.results.lock().unwrap().clone()
    }

    /// Total `save_subject` calls, including failed ones.
    pub fn subject_attempts(&self) -> u32 {
        self.subject_attempts.load(Ordering::SeqCst)
    }

    /// Total `save_result` calls, including failed ones.
    pub fn result_attempts(&self) -> u32 {
        self.result_attempts.load(Ordering::SeqCst)
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn save_subject(&self, subject: &Subject) -> Result<()> {
        self.subject_attempts.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.fail_subject_saves) {
            bail!("MemoryResultStore: subject save failed (scripted)");
        }
        self.subjects.lock().unwrap().push(subject.clone());
        Ok(())
    }

    async fn save_result(&self, assessment_id: &str, result: &AssessmentResult) -> Result<()> {
        self.result_attempts.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.fail_result_saves) {
            bail!("MemoryResultStore: result save failed (scripted)");
        }
        self.results
            .lock()
            .unwrap()
            .push((assessment_id.to_string(), result.clone()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// Collects every reported outcome.
pub struct MemorySink {
    outcomes: Mutex<Vec<IngestOutcome>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(Vec::new()),
        }
    }

    pub fn outcomes(&self) -> Vec<IngestOutcome> {
        self.outcomes.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.outcomes.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OutcomeSink for MemorySink {
    async fn report(&self, outcome: &IngestOutcome) -> Result<()> {
        self.outcomes.lock().unwrap().push(outcome.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Event helpers
// ---------------------------------------------------------------------------

/// An event with `n_obs`/`n_risks`/`n_findings`/`n_logs` titled entries.
pub fn event_with(
    assessment_id: &str,
    n_obs: usize,
    n_risks: usize,
    n_findings: usize,
    n_logs: usize,
) -> ExecutionResult {
    ExecutionResult {
        assessment_id: assessment_id.to_string(),
        subject: SubjectDescriptor {
            id: format!("{assessment_id}-subject"),
            subject_type: "host".to_string(),
            title: format!("{assessment_id} subject"),
            description: String::new(),
            props: vec![],
            links: vec![],
            remarks: String::new(),
        },
        observations: (0..n_obs)
            .map(|i| ObservationDescriptor {
                title: format!("obs{i}"),
                description: String::new(),
                props: vec![],
                links: vec![],
                remarks: String::new(),
                collected: None,
                expires: None,
                relevant_evidence: vec![],
            })
            .collect(),
        risks: (0..n_risks)
            .map(|i| RiskDescriptor {
                title: format!("risk{i}"),
                description: String::new(),
                statement: String::new(),
                props: vec![],
                links: vec![],
            })
            .collect(),
        findings: (0..n_findings)
            .map(|i| FindingDescriptor {
                title: format!("find{i}"),
                description: String::new(),
                props: vec![],
                links: vec![],
                remarks: String::new(),
            })
            .collect(),
        logs: (0..n_logs)
            .map(|i| LogDescriptor {
                title: format!("log{i}"),
                description: String::new(),
                props: vec![],
                links: vec![],
                remarks: String::new(),
            })
            .collect(),
    }
}
