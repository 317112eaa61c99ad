//! Error taxonomy for the curation pipeline.
//!
//! Every error here is fatal to the run: the core performs no silent
//! recovery. A `revise` verdict is normal control flow, not an error.

use crate::artifact::Stage;
use crate::worker::Role;
use std::path::PathBuf;
use thiserror::Error;

/// Artifact-store misuse. These indicate caller bugs and are never retried.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("artifact `{name}` already exists with unarchived version {version} ({stage})")]
    DuplicateName {
        name: String,
        version: u32,
        stage: Stage,
    },

    #[error("unknown artifact `{name}` v{version}")]
    NotFound { name: String, version: u32 },

    #[error("cannot {op} `{name}` v{version} while {stage}")]
    InvalidTransition {
        op: &'static str,
        name: String,
        version: u32,
        stage: Stage,
    },
}

/// Failure surfaced by an external collaborator. Propagated unchanged; the
/// run transitions to `Failed`.
#[derive(Debug, Error)]
#[error("{role} failed: {message}")]
pub struct CollaboratorError {
    pub role: Role,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(role: Role, message: impl Into<String>) -> Self {
        Self {
            role,
            message: message.into(),
        }
    }
}

/// Invalid or unreadable workspace configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported config schema_version {0}")]
    UnsupportedSchemaVersion(u32),

    #[error("invalid config option {option}: {message}")]
    InvalidOption {
        option: &'static str,
        message: String,
    },

    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Filesystem or serialization failure while writing the workspace.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialize {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl WorkspaceError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Finalizer failures. `IncompleteWorkspace` indicates an orchestrator bug;
/// the finalizer defends against it even though the state machine should make
/// it unreachable.
#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error("workspace incomplete: `{name}` v{version} still {stage}")]
    IncompleteWorkspace {
        name: String,
        version: u32,
        stage: Stage,
    },

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

/// Top-level run failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Finalize(#[from] FinalizeError),

    #[error("revision limit reached for `{name}` after {revisions} revisions")]
    RevisionLimit { name: String, revisions: u32 },

    #[error("review stalled for `{name}`: round {round} repeated the same factual complaints")]
    Stagnation { name: String, round: u32 },
}
