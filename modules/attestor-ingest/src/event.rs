//! The execution-result event published by remote assessment runtimes.
//!
//! This is the wire contract at the ingestion boundary: camelCase JSON,
//! every field except the assessment id and the subject's own id optional.
//! Descriptor fields are copied into the canonical records by the batch
//! builder; identities are never taken from here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use attestor_oscal::{Link, Property};

/// One runtime's report for one assessment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub assessment_id: String,
    pub subject: SubjectDescriptor,
    #[serde(default)]
    pub observations: Vec<ObservationDescriptor>,
    #[serde(default)]
    pub risks: Vec<RiskDescriptor>,
    #[serde(default)]
    pub findings: Vec<FindingDescriptor>,
    #[serde(default)]
    pub logs: Vec<LogDescriptor>,
}

/// What was assessed, as the runtime describes it.
///
/// `id` is the runtime's own identifier for the subject. It is carried
/// through as a correlation field only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDescriptor {
    pub id: String,
    #[serde(rename = "type", default)]
    pub subject_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub props: Vec<Property>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationDescriptor {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub props: Vec<Property>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub collected: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default)]
    pub relevant_evidence: Vec<EvidenceDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceDescriptor {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub props: Vec<Property>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskDescriptor {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub statement: String,
    #[serde(default)]
    pub props: Vec<Property>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingDescriptor {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub props: Vec<Property>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogDescriptor {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub props: Vec<Property>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub remarks: String,
}
