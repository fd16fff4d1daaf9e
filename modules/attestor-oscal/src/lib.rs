//! Canonical OSCAL-derived record shapes for assessment results.
//!
//! One definition per record — subject, observation, evidence, risk,
//! finding, log entry, and the aggregate result. Pure data contract:
//! everything serializes to OSCAL-style kebab-case JSON, nothing here
//! has behavior.
//!
//! The ingestion pipeline consumes and produces these shapes; storage
//! and transport layers treat them as opaque payloads.

pub mod types;

pub use types::{
    AssessmentResult, Evidence, Finding, Link, LogEntry, Observation, Property, Risk, Subject,
};
