//! Pipeline orchestration for the sequential curation loop.
//!
//! The orchestrator owns the run's workspace state and is the only writer of
//! stage transitions. Stages run strictly one at a time: research the
//! subject, review it until the gate accepts, expand it into concepts, put
//! each concept through the same review loop, then finalize the workspace.
//! Any collaborator or store error is fatal; there is no retry and no
//! partial success.

use crate::artifact::{ContentRef, Severity};
use crate::config::{validate_config, write_config, CurationConfig};
use crate::error::{PipelineError, StoreError};
use crate::gate::{GatePolicy, ReviewGate};
use crate::store::ArtifactStore;
use crate::worker::{Critic, Researcher, Synthesizer};
use crate::workspace::{self, WorkspacePaths};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Orchestrator position in the run.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Init,
    Researching,
    Reviewing,
    Revising,
    Accepted,
    Expanding,
    Finalizing,
    Done,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Init => "init",
            PipelineState::Researching => "researching",
            PipelineState::Reviewing => "reviewing",
            PipelineState::Revising => "revising",
            PipelineState::Accepted => "accepted",
            PipelineState::Expanding => "expanding",
            PipelineState::Finalizing => "finalizing",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accepted artifact in the run report.
#[derive(Debug, Serialize, Clone)]
pub struct AcceptedNote {
    pub name: String,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_hint: Option<u32>,
    pub content_sha256: String,
    /// Review rounds this artifact went through before acceptance.
    pub rounds: u32,
}

/// Run summary written to `curation/report.json` on both outcomes.
#[derive(Debug, Serialize, Clone)]
pub struct RunReport {
    pub schema_version: u32,
    pub generated_at_epoch_ms: u128,
    pub subject: String,
    pub state: PipelineState,
    pub success: bool,
    pub accepted: Vec<AcceptedNote>,
    pub review_rounds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct PipelineOrchestrator<'a> {
    paths: WorkspacePaths,
    config: CurationConfig,
    policy: GatePolicy,
    researcher: &'a mut dyn Researcher,
    critic: &'a mut dyn Critic,
    synthesizer: &'a mut dyn Synthesizer,
    store: ArtifactStore,
    state: PipelineState,
    finalized: bool,
    flushed_seq: u64,
    total_rounds: u32,
    accepted: Vec<AcceptedNote>,
}

impl<'a> PipelineOrchestrator<'a> {
    pub fn new(
        workspace_root: PathBuf,
        config: CurationConfig,
        researcher: &'a mut dyn Researcher,
        critic: &'a mut dyn Critic,
        synthesizer: &'a mut dyn Synthesizer,
    ) -> Result<Self, PipelineError> {
        validate_config(&config)?;
        let policy = GatePolicy::from_config(&config);
        Ok(Self {
            paths: WorkspacePaths::new(workspace_root),
            config,
            policy,
            researcher,
            critic,
            synthesizer,
            store: ArtifactStore::new(),
            state: PipelineState::Init,
            finalized: false,
            flushed_seq: 0,
            total_rounds: 0,
            accepted: Vec::new(),
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// True once the finalizer has published the workspace surface.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Drive the whole run for `subject`.
    ///
    /// On success the workspace surface holds exactly the accepted notes
    /// plus `index.md`, and the report records `done`. On failure no surface
    /// is published, the report records `failed`, and the error is returned
    /// unchanged.
    pub fn run(&mut self, subject: &str) -> Result<RunReport, PipelineError> {
        write_config(self.paths.root(), &self.config)?;

        let result = self.execute(subject);
        match result {
            Ok(index_sha256) => {
                self.state = PipelineState::Done;
                let report = self.report(subject, Some(index_sha256), None);
                workspace::write_json(&self.paths.report_path(), &report, "run report")?;
                tracing::info!(subject, accepted = report.accepted.len(), "run done");
                Ok(report)
            }
            Err(err) => {
                self.state = PipelineState::Failed;
                let report = self.report(subject, None, Some(err.to_string()));
                // Best effort: the original error is the one to surface.
                let _ = workspace::write_json(&self.paths.report_path(), &report, "run report");
                let _ = self.flush_events();
                tracing::info!(subject, error = %err, "run failed");
                Err(err)
            }
        }
    }

    fn execute(&mut self, subject: &str) -> Result<String, PipelineError> {
        // Subject first; its accepted version seeds the expansion.
        let subject_version = self.curate_topic(subject, None, Some(0))?;
        self.state = PipelineState::Accepted;

        self.state = PipelineState::Expanding;
        let subject_artifact = self
            .store
            .get(subject, subject_version)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                name: subject.to_string(),
                version: subject_version,
            })?;
        let concepts = self.synthesizer.expand(&subject_artifact)?;
        tracing::info!(subject, concepts = concepts.len(), "expanding");

        // Each concept completes its own review loop before the next begins.
        for (i, concept) in concepts.into_iter().enumerate() {
            let hint = u32::try_from(i).unwrap_or(u32::MAX).saturating_add(1);
            self.curate_topic(&concept.name, Some(concept.content), Some(hint))?;
        }

        self.state = PipelineState::Finalizing;
        let index = crate::finalize::WorkspaceFinalizer::finalize(
            &self.paths,
            &self.store,
            self.synthesizer,
        )?;
        self.finalized = true;
        self.flush_events()?;
        Ok(index.sha256())
    }

    /// Run one artifact through the research/review/revise loop until the
    /// gate accepts it. Returns the accepted version.
    ///
    /// `initial` carries content produced upstream (concept drafts from the
    /// synthesizer); when absent the researcher produces the first version.
    fn curate_topic(
        &mut self,
        name: &str,
        initial: Option<ContentRef>,
        sequence_hint: Option<u32>,
    ) -> Result<u32, PipelineError> {
        self.state = PipelineState::Researching;
        let content = match initial {
            Some(content) => content,
            None => self.researcher.produce(name, None)?,
        };
        let mut version = self.store.create(name, content.clone(), sequence_hint)?.version;
        workspace::route_draft(&self.paths, name, version, &content)?;
        self.flush_events()?;

        let mut current = content;
        let mut rounds = 0u32;
        let mut revisions = 0u32;
        let mut prev_factual: Option<BTreeSet<String>> = None;

        loop {
            rounds += 1;
            self.total_rounds += 1;
            self.store.submit_for_review(name, version)?;
            self.state = PipelineState::Reviewing;

            let complaints = self.critic.review(&current)?;
            let artifact = self
                .store
                .get(name, version)
                .ok_or_else(|| StoreError::NotFound {
                    name: name.to_string(),
                    version,
                })?;
            let verdict = ReviewGate::evaluate(artifact, &complaints, &self.policy);
            self.flush_events()?;

            if verdict.is_accepted() {
                self.store.promote(name, version)?;
                self.flush_events()?;
                tracing::info!(name, version, rounds, "accepted");
                self.accepted.push(AcceptedNote {
                    name: name.to_string(),
                    version,
                    sequence_hint,
                    content_sha256: current.sha256(),
                    rounds,
                });
                return Ok(version);
            }

            self.state = PipelineState::Revising;
            tracing::info!(
                name,
                version,
                factual = verdict.factual_count,
                stylistic = verdict.stylistic_count,
                "revise requested"
            );

            let factual: BTreeSet<String> = verdict
                .complaints
                .iter()
                .filter(|c| {
                    Severity::from_code(&c.severity, self.policy.treat_unknown_severity_as)
                        == Severity::Factual
                })
                .map(|c| c.description.clone())
                .collect();
            if self.config.fail_on_stagnation
                && !factual.is_empty()
                && prev_factual.as_ref() == Some(&factual)
            {
                return Err(PipelineError::Stagnation {
                    name: name.to_string(),
                    round: rounds,
                });
            }
            prev_factual = Some(factual);

            revisions += 1;
            if let Some(max) = self.config.max_revisions {
                if revisions > max {
                    return Err(PipelineError::RevisionLimit {
                        name: name.to_string(),
                        revisions: max,
                    });
                }
            }

            self.store.archive(name, version)?;
            self.state = PipelineState::Researching;
            current = self.researcher.produce(name, Some(&verdict.complaints))?;
            version = self.store.new_revision(name, current.clone())?.version;
            workspace::route_draft(&self.paths, name, version, &current)?;
            self.flush_events()?;
        }
    }

    fn flush_events(&mut self) -> Result<(), PipelineError> {
        let events_path = self.paths.events_path();
        let pending = self.store.events_since(self.flushed_seq).to_vec();
        for event in &pending {
            workspace::append_jsonl(&events_path, event, "store event")?;
            self.flushed_seq = event.seq;
        }
        Ok(())
    }

    fn report(
        &self,
        subject: &str,
        index_sha256: Option<String>,
        error: Option<String>,
    ) -> RunReport {
        RunReport {
            schema_version: REPORT_SCHEMA_VERSION,
            generated_at_epoch_ms: workspace::now_epoch_ms(),
            subject: subject.to_string(),
            state: self.state,
            success: matches!(self.state, PipelineState::Done),
            accepted: self.accepted.clone(),
            review_rounds: self.total_rounds,
            index_sha256,
            error,
        }
    }
}
