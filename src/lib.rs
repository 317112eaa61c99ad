//! Staged knowledge-curation pipeline.
//!
//! A subject name goes in; repeated rounds of research, critique, and
//! revision produce a workspace of accepted notes plus an index document.
//! Content production and judgment are delegated to pluggable collaborators
//! ([`worker::Researcher`], [`worker::Critic`], [`worker::Synthesizer`]);
//! this crate owns only the state, ordering, and acceptance-criteria logic:
//!
//! - [`store::ArtifactStore`] issues strictly increasing version numbers and
//!   applies stage transitions, with an append-only event log.
//! - [`gate::ReviewGate`] decides accept/revise: factual complaints always
//!   force revision, a bounded number of stylistic ones is tolerated.
//! - [`pipeline::PipelineOrchestrator`] sequences the stages, one at a time.
//! - [`finalize::WorkspaceFinalizer`] publishes exactly the accepted surface.

pub mod artifact;
pub mod config;
pub mod error;
pub mod finalize;
pub mod gate;
pub mod pipeline;
mod staging;
pub mod store;
pub mod worker;
pub mod workspace;

pub use artifact::{Artifact, Complaint, ContentRef, ReviewVerdict, Severity, Stage, Verdict};
pub use config::{
    default_config, load_config, validate_config, write_config, CurationConfig,
    CONFIG_SCHEMA_VERSION,
};
pub use error::{
    CollaboratorError, ConfigError, FinalizeError, PipelineError, StoreError, WorkspaceError,
};
pub use finalize::WorkspaceFinalizer;
pub use gate::{GatePolicy, ReviewGate};
pub use pipeline::{
    AcceptedNote, PipelineOrchestrator, PipelineState, RunReport, REPORT_SCHEMA_VERSION,
};
pub use store::{ArtifactStore, StoreEvent, StoreEventKind};
pub use worker::{ConceptDraft, Critic, Researcher, Role, Synthesizer};
pub use workspace::{slugify, WorkspacePaths};
