//! Core data model for curated artifacts and review outcomes.
//!
//! Content is always carried as an opaque [`ContentRef`]; the pipeline routes
//! text between collaborators and the workspace surface without interpreting
//! it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Opaque handle to collaborator-produced text.
///
/// The core never parses or validates the body; it only moves it between the
/// producing collaborator, the workspace `work/` area, and the published
/// surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(String);

impl ContentRef {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Content digest used for event-log traceability.
    pub fn sha256(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Lifecycle position of one artifact version.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Draft,
    UnderReview,
    Accepted,
    Archived,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Draft => "draft",
            Stage::UnderReview => "under_review",
            Stage::Accepted => "accepted",
            Stage::Archived => "archived",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, versioned unit of content.
///
/// Versions for a given name are issued in creation order and never reused.
/// `sequence_hint` is reading-order metadata supplied by the orchestrator;
/// `created_seq` is the store event sequence at creation time and breaks ties
/// when no hint is present.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub version: u32,
    pub stage: Stage,
    pub content: ContentRef,
    pub sequence_hint: Option<u32>,
    pub created_seq: u64,
}

/// Severity classification a complaint resolves to at gate time.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Factual,
    Stylistic,
}

impl Severity {
    /// Classify a critic-supplied severity code, mapping unrecognized codes
    /// to `fallback`.
    pub fn from_code(raw: &str, fallback: Severity) -> Self {
        match raw {
            "factual" => Severity::Factual,
            "stylistic" => Severity::Stylistic,
            _ => fallback,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Factual => "factual",
            Severity::Stylistic => "stylistic",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One issue raised against an artifact version.
///
/// The severity is kept as the critic's raw code so critics can introduce new
/// codes without breaking the store; classification happens at the gate via
/// the configured fallback.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Complaint {
    pub severity: String,
    pub description: String,
}

impl Complaint {
    pub fn new(severity: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            severity: severity.into(),
            description: description.into(),
        }
    }

    pub fn factual(description: impl Into<String>) -> Self {
        Self::new(Severity::Factual.as_str(), description)
    }

    pub fn stylistic(description: impl Into<String>) -> Self {
        Self::new(Severity::Stylistic.as_str(), description)
    }
}

/// The gate's binary decision.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    Revise,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Accepted => "accepted",
            Verdict::Revise => "revise",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gate output for one artifact version, carrying the originating complaints
/// for traceability.
#[derive(Debug, Serialize, Clone)]
pub struct ReviewVerdict {
    pub verdict: Verdict,
    pub complaints: Vec<Complaint>,
    pub factual_count: usize,
    pub stylistic_count: usize,
}

impl ReviewVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self.verdict, Verdict::Accepted)
    }
}
