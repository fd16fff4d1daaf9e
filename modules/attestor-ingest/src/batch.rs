//! Builds the batch of related compliance records for one event.
//!
//! Pure transform: one wall-clock sample at entry, fresh identities for
//! every record, cross-references assigned within the batch. Nothing
//! here touches storage.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use attestor_oscal::{
    AssessmentResult, Evidence, Finding, LogEntry, Observation, Risk, Subject,
};

use crate::error::IngestError;
use crate::event::{
    EvidenceDescriptor, ExecutionResult, FindingDescriptor, LogDescriptor,
    ObservationDescriptor, RiskDescriptor, SubjectDescriptor,
};

/// How a risk's `related_observations` references are chosen.
///
/// The upstream behavior couples every risk to the first observation of
/// the batch, independent of which observation it logically relates to.
/// That stays the default until product decides otherwise;
/// `AllObservations` is the alternative under discussion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RiskLinkPolicy {
    #[default]
    FirstObservation,
    AllObservations,
}

/// Everything built from one event: the subject plus the aggregate
/// result that references it.
#[derive(Debug, Clone)]
pub struct AssessmentBatch {
    pub subject: Subject,
    pub result: AssessmentResult,
}

/// Build the full batch for one event.
///
/// Fails with `MalformedBatch` before anything is built if the event's
/// internal references cannot be satisfied (risks present with zero
/// observations). Array order follows input order throughout. Replaying
/// the same event yields entirely new identities — no dedup.
pub fn build_batch(
    event: &ExecutionResult,
    policy: RiskLinkPolicy,
) -> Result<AssessmentBatch, IngestError> {
    if event.observations.is_empty() && !event.risks.is_empty() {
        return Err(IngestError::MalformedBatch(format!(
            "assessment {}: {} risk(s) with no observations to reference",
            event.assessment_id,
            event.risks.len()
        )));
    }

    let now = Utc::now();
    let subject = build_subject(&event.subject);

    let observations: Vec<Observation> = event
        .observations
        .iter()
        .map(|o| build_observation(o, subject.uuid, now))
        .collect();

    let related: Vec<Uuid> = match policy {
        RiskLinkPolicy::FirstObservation => {
            observations.first().map(|o| vec![o.uuid]).unwrap_or_default()
        }
        RiskLinkPolicy::AllObservations => observations.iter().map(|o| o.uuid).collect(),
    };

    let risks: Vec<Risk> = event.risks.iter().map(|r| build_risk(r, &related)).collect();

    let findings: Vec<Finding> = event
        .findings
        .iter()
        .map(|f| build_finding(f, subject.uuid))
        .collect();

    let assessment_log: Vec<LogEntry> =
        event.logs.iter().map(|l| build_log_entry(l, now)).collect();

    let result = AssessmentResult {
        uuid: Uuid::new_v4(),
        start: now,
        end: now,
        observations,
        risks,
        findings,
        assessment_log,
    };

    Ok(AssessmentBatch { subject, result })
}

fn build_subject(descriptor: &SubjectDescriptor) -> Subject {
    Subject {
        uuid: Uuid::new_v4(),
        source_subject_id: descriptor.id.clone(),
        subject_type: descriptor.subject_type.clone(),
        title: descriptor.title.clone(),
        description: descriptor.description.clone(),
        props: descriptor.props.clone(),
        links: descriptor.links.clone(),
        remarks: descriptor.remarks.clone(),
    }
}

fn build_observation(
    descriptor: &ObservationDescriptor,
    subject_uuid: Uuid,
    now: DateTime<Utc>,
) -> Observation {
    Observation {
        uuid: Uuid::new_v4(),
        title: descriptor.title.clone(),
        description: descriptor.description.clone(),
        props: descriptor.props.clone(),
        links: descriptor.links.clone(),
        remarks: descriptor.remarks.clone(),
        collected: descriptor.collected.unwrap_or(now),
        expires: descriptor.expires,
        relevant_evidence: descriptor
            .relevant_evidence
            .iter()
            .map(build_evidence)
            .collect(),
        subjects: vec![subject_uuid],
    }
}

fn build_evidence(descriptor: &EvidenceDescriptor) -> Evidence {
    Evidence {
        uuid: Uuid::new_v4(),
        title: descriptor.title.clone(),
        description: descriptor.description.clone(),
        props: descriptor.props.clone(),
        links: descriptor.links.clone(),
        remarks: descriptor.remarks.clone(),
    }
}

fn build_risk(descriptor: &RiskDescriptor, related: &[Uuid]) -> Risk {
    Risk {
        uuid: Uuid::new_v4(),
        title: descriptor.title.clone(),
        description: descriptor.description.clone(),
        statement: descriptor.statement.clone(),
        props: descriptor.props.clone(),
        links: descriptor.links.clone(),
        related_observations: related.to_vec(),
    }
}

fn build_finding(descriptor: &FindingDescriptor, subject_uuid: Uuid) -> Finding {
    Finding {
        uuid: Uuid::new_v4(),
        title: descriptor.title.clone(),
        description: descriptor.description.clone(),
        props: descriptor.props.clone(),
        links: descriptor.links.clone(),
        remarks: descriptor.remarks.clone(),
        target_id: subject_uuid,
    }
}

// Runtime-reported timing is not propagated; both stamps are ingestion
// time. TODO: carry the runtime's start/end once product signs off on
// trusting remote clocks.
fn build_log_entry(descriptor: &LogDescriptor, now: DateTime<Utc>) -> LogEntry {
    LogEntry {
        uuid: Uuid::new_v4(),
        title: descriptor.title.clone(),
        description: descriptor.description.clone(),
        start: now,
        end: now,
        props: descriptor.props.clone(),
        links: descriptor.links.clone(),
        remarks: descriptor.remarks.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn event_from_json(value: serde_json::Value) -> ExecutionResult {
        serde_json::from_value(value).unwrap()
    }

    fn full_event() -> ExecutionResult {
        event_from_json(serde_json::json!({
            "assessmentId": "A1",
            "subject": { "id": "s1", "type": "host", "title": "Server" },
            "observations": [
                { "title": "obs1", "relevantEvidence": [ { "title": "ev1" }, { "title": "ev2" } ] },
                { "title": "obs2" },
            ],
            "risks": [ { "title": "risk1", "statement": "exposed port" }, { "title": "risk2" } ],
            "findings": [ { "title": "find1" } ],
            "logs": [ { "title": "log1" } ],
        }))
    }

    #[test]
    fn batch_shape_matches_input_counts() {
        let batch = build_batch(&full_event(), RiskLinkPolicy::default()).unwrap();

        assert_eq!(batch.result.observations.len(), 2);
        assert_eq!(batch.result.risks.len(), 2);
        assert_eq!(batch.result.findings.len(), 1);
        assert_eq!(batch.result.assessment_log.len(), 1);
        assert_eq!(batch.result.observations[0].relevant_evidence.len(), 2);
    }

    #[test]
    fn input_order_is_preserved() {
        let batch = build_batch(&full_event(), RiskLinkPolicy::default()).unwrap();

        let titles: Vec<&str> = batch
            .result
            .observations
            .iter()
            .map(|o| o.title.as_str())
            .collect();
        assert_eq!(titles, vec!["obs1", "obs2"]);

        let risk_titles: Vec<&str> =
            batch.result.risks.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(risk_titles, vec!["risk1", "risk2"]);
    }

    #[test]
    fn identities_are_fresh_and_pairwise_distinct() {
        let batch = build_batch(&full_event(), RiskLinkPolicy::default()).unwrap();

        let mut ids = HashSet::new();
        ids.insert(batch.subject.uuid);
        ids.insert(batch.result.uuid);
        for o in &batch.result.observations {
            ids.insert(o.uuid);
            for e in &o.relevant_evidence {
                ids.insert(e.uuid);
            }
        }
        for r in &batch.result.risks {
            ids.insert(r.uuid);
        }
        for f in &batch.result.findings {
            ids.insert(f.uuid);
        }
        for l in &batch.result.assessment_log {
            ids.insert(l.uuid);
        }

        // subject + result + 2 obs + 2 evidence + 2 risks + 1 finding + 1 log
        assert_eq!(ids.len(), 9);
        // The runtime's subject id is correlation data, not the identity.
        assert_eq!(batch.subject.source_subject_id, "s1");
    }

    #[test]
    fn observations_and_findings_reference_the_batch_subject() {
        let batch = build_batch(&full_event(), RiskLinkPolicy::default()).unwrap();

        for o in &batch.result.observations {
            assert_eq!(o.subjects, vec![batch.subject.uuid]);
        }
        for f in &batch.result.findings {
            assert_eq!(f.target_id, batch.subject.uuid);
        }
    }

    #[test]
    fn every_risk_links_the_first_observation_by_default() {
        let batch = build_batch(&full_event(), RiskLinkPolicy::FirstObservation).unwrap();

        let first = batch.result.observations[0].uuid;
        for r in &batch.result.risks {
            assert_eq!(r.related_observations, vec![first]);
        }
    }

    #[test]
    fn all_observations_policy_links_every_observation_in_order() {
        let batch = build_batch(&full_event(), RiskLinkPolicy::AllObservations).unwrap();

        let all: Vec<_> = batch.result.observations.iter().map(|o| o.uuid).collect();
        for r in &batch.result.risks {
            assert_eq!(r.related_observations, all);
        }
    }

    #[test]
    fn risks_without_observations_are_a_malformed_batch() {
        let event = event_from_json(serde_json::json!({
            "assessmentId": "A2",
            "subject": { "id": "s1", "title": "Server" },
            "risks": [ { "title": "orphan risk" } ],
        }));

        let err = build_batch(&event, RiskLinkPolicy::default()).unwrap_err();
        assert!(matches!(err, IngestError::MalformedBatch(_)));
        assert!(err.to_string().contains("A2"));
    }

    #[test]
    fn zero_observations_without_risks_is_fine() {
        let event = event_from_json(serde_json::json!({
            "assessmentId": "A3",
            "subject": { "id": "s1", "title": "Server" },
            "findings": [ { "title": "find1" } ],
        }));

        let batch = build_batch(&event, RiskLinkPolicy::default()).unwrap();
        assert!(batch.result.observations.is_empty());
        assert_eq!(batch.result.findings.len(), 1);
    }

    #[test]
    fn timestamps_are_ingestion_time() {
        let before = Utc::now();
        let batch = build_batch(&full_event(), RiskLinkPolicy::default()).unwrap();
        let after = Utc::now();

        assert_eq!(batch.result.start, batch.result.end);
        assert!(batch.result.start >= before && batch.result.start <= after);

        let log = &batch.result.assessment_log[0];
        assert_eq!(log.start, log.end);
        assert_eq!(log.start, batch.result.start);

        // Observations without a collected stamp get ingestion time too.
        assert_eq!(batch.result.observations[0].collected, batch.result.start);
        assert!(batch.result.observations[0].expires.is_none());
    }

    #[test]
    fn supplied_collected_and_expires_are_carried() {
        let event = event_from_json(serde_json::json!({
            "assessmentId": "A4",
            "subject": { "id": "s1", "title": "Server" },
            "observations": [ {
                "title": "obs1",
                "collected": "2026-01-05T10:00:00Z",
                "expires": "2026-02-05T10:00:00Z",
            } ],
        }));

        let batch = build_batch(&event, RiskLinkPolicy::default()).unwrap();
        let obs = &batch.result.observations[0];
        assert_eq!(obs.collected.to_rfc3339(), "2026-01-05T10:00:00+00:00");
        assert!(obs.expires.is_some());
    }

    #[test]
    fn replaying_an_event_produces_disjoint_identities() {
        let event = full_event();
        let first = build_batch(&event, RiskLinkPolicy::default()).unwrap();
        let second = build_batch(&event, RiskLinkPolicy::default()).unwrap();

        assert_ne!(first.subject.uuid, second.subject.uuid);
        assert_ne!(first.result.uuid, second.result.uuid);
        let first_obs: HashSet<_> =
            first.result.observations.iter().map(|o| o.uuid).collect();
        let second_obs: HashSet<_> =
            second.result.observations.iter().map(|o| o.uuid).collect();
        assert!(first_obs.is_disjoint(&second_obs));
    }
}
