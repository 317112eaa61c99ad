//! Collaborator capability contracts.
//!
//! The pipeline never produces or judges content itself; it calls into three
//! externally supplied capabilities. Implementations may wrap a language
//! model, a human-in-the-loop tool, or anything else that satisfies the
//! contract. All calls are blocking and fallible; the orchestrator assumes
//! nothing about success and imposes no timeout of its own.

use crate::artifact::{Artifact, Complaint, ContentRef};
use crate::error::CollaboratorError;
use serde::Serialize;
use std::fmt;

/// Which collaborator raised an error.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Researcher,
    Critic,
    Synthesizer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Researcher => "researcher",
            Role::Critic => "critic",
            Role::Synthesizer => "synthesizer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concept split out of an accepted artifact, in reading order.
#[derive(Debug, Clone)]
pub struct ConceptDraft {
    pub name: String,
    pub content: ContentRef,
}

/// Produces or revises content for a topic.
///
/// When `prior_feedback` is present the producer is expected to incorporate
/// it; the orchestrator cannot verify incorporation, only that a new content
/// handle came back.
pub trait Researcher {
    fn produce(
        &mut self,
        topic: &str,
        prior_feedback: Option<&[Complaint]>,
    ) -> Result<ContentRef, CollaboratorError>;
}

/// Raises complaints against a piece of content. May return none.
pub trait Critic {
    fn review(&mut self, content: &ContentRef) -> Result<Vec<Complaint>, CollaboratorError>;
}

/// Splits an accepted artifact into concepts and writes the final index.
pub trait Synthesizer {
    fn expand(&mut self, artifact: &Artifact) -> Result<Vec<ConceptDraft>, CollaboratorError>;

    /// Produce one index document referencing every accepted artifact, in the
    /// order given.
    fn summarize(&mut self, accepted: &[&Artifact]) -> Result<ContentRef, CollaboratorError>;
}
