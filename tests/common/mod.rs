//! Shared test infrastructure: scripted collaborators and workspace helpers.

use std::collections::VecDeque;
use std::sync::Once;
use study_pack::{
    Artifact, CollaboratorError, Complaint, ConceptDraft, ContentRef, Critic, Researcher, Role,
    Synthesizer,
};

static INIT_TRACING: Once = Once::new();

/// Install a subscriber once so `RUST_LOG` works during test debugging.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Researcher that emits deterministic content per call and records every
/// invocation so tests can assert feedback routing.
#[derive(Default)]
pub struct ScriptedResearcher {
    /// Calls observed as (topic, feedback passed).
    pub calls: Vec<(String, Option<Vec<Complaint>>)>,
    /// When set, the call at this index (0-based) fails.
    pub fail_on_call: Option<usize>,
}

impl ScriptedResearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }
}

impl Researcher for ScriptedResearcher {
    fn produce(
        &mut self,
        topic: &str,
        prior_feedback: Option<&[Complaint]>,
    ) -> Result<ContentRef, CollaboratorError> {
        let call = self.calls.len();
        self.calls
            .push((topic.to_string(), prior_feedback.map(|f| f.to_vec())));
        if self.fail_on_call == Some(call) {
            return Err(CollaboratorError::new(
                Role::Researcher,
                format!("scripted failure on call {call}"),
            ));
        }
        let topic_calls: Vec<_> = self
            .calls
            .iter()
            .filter(|(name, _)| name == topic)
            .collect();
        // When the first call for a topic already carries feedback, version 1
        // was produced elsewhere (a synthesizer concept draft).
        let seeded = topic_calls
            .first()
            .map(|(_, feedback)| feedback.is_some())
            .unwrap_or(false);
        let round = topic_calls.len() + usize::from(seeded);
        Ok(ContentRef::new(format!("{topic} draft {round}")))
    }
}

/// Critic that pops one scripted complaint list per review, in call order.
/// An exhausted script reviews clean.
#[derive(Default)]
pub struct ScriptedCritic {
    script: VecDeque<Vec<Complaint>>,
    pub reviewed: Vec<String>,
    pub fail_on_call: Option<usize>,
}

impl ScriptedCritic {
    pub fn new(script: Vec<Vec<Complaint>>) -> Self {
        Self {
            script: script.into(),
            ..Self::default()
        }
    }

    pub fn clean() -> Self {
        Self::default()
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }
}

impl Critic for ScriptedCritic {
    fn review(&mut self, content: &ContentRef) -> Result<Vec<Complaint>, CollaboratorError> {
        let call = self.reviewed.len();
        self.reviewed.push(content.as_str().to_string());
        if self.fail_on_call == Some(call) {
            return Err(CollaboratorError::new(
                Role::Critic,
                format!("scripted failure on call {call}"),
            ));
        }
        Ok(self.script.pop_front().unwrap_or_default())
    }
}

/// Synthesizer with a fixed concept split and a line-per-note index.
#[derive(Default)]
pub struct ScriptedSynthesizer {
    pub concepts: Vec<String>,
    pub expanded: Vec<String>,
    pub summarized: Vec<Vec<String>>,
}

impl ScriptedSynthesizer {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn with_concepts(concepts: &[&str]) -> Self {
        Self {
            concepts: concepts.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }
}

impl Synthesizer for ScriptedSynthesizer {
    fn expand(&mut self, artifact: &Artifact) -> Result<Vec<ConceptDraft>, CollaboratorError> {
        self.expanded.push(artifact.name.clone());
        Ok(self
            .concepts
            .iter()
            .map(|name| ConceptDraft {
                name: name.clone(),
                content: ContentRef::new(format!("{name} draft 1")),
            })
            .collect())
    }

    fn summarize(&mut self, accepted: &[&Artifact]) -> Result<ContentRef, CollaboratorError> {
        let names: Vec<String> = accepted.iter().map(|a| a.name.clone()).collect();
        self.summarized.push(names.clone());
        let lines: Vec<String> = accepted
            .iter()
            .map(|a| format!("- {} (v{})", a.name, a.version))
            .collect();
        Ok(ContentRef::new(format!("# Index\n{}", lines.join("\n"))))
    }
}

/// Synthesizer whose summarize step fails, for finalize-failure coverage.
pub struct FailingSummarizer;

impl Synthesizer for FailingSummarizer {
    fn expand(&mut self, _artifact: &Artifact) -> Result<Vec<ConceptDraft>, CollaboratorError> {
        Ok(Vec::new())
    }

    fn summarize(&mut self, _accepted: &[&Artifact]) -> Result<ContentRef, CollaboratorError> {
        Err(CollaboratorError::new(
            Role::Synthesizer,
            "scripted summarize failure",
        ))
    }
}
