//! Versioned artifact container.
//!
//! The store is a dumb append-only container: it issues version numbers and
//! applies stage transitions, but workflow rules (when a revision may open,
//! when review happens) belong to the orchestrator. Every mutation is
//! recorded in a monotonically increasing event log so tests and the
//! workspace mirror can observe history without rewriting it.

use crate::artifact::{Artifact, ContentRef, Stage};
use crate::error::StoreError;
use crate::workspace::now_epoch_ms;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreEventKind {
    Created,
    RevisionOpened,
    SubmittedForReview,
    Promoted,
    Archived,
}

#[derive(Debug, Serialize, Clone)]
pub struct StoreEvent {
    pub seq: u64,
    pub at_epoch_ms: u128,
    pub kind: StoreEventKind,
    pub name: String,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_sha256: Option<String>,
}

#[derive(Debug, Default)]
pub struct ArtifactStore {
    artifacts: BTreeMap<String, Vec<Artifact>>,
    events: Vec<StoreEvent>,
    next_seq: u64,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the first version of `name` as a draft.
    ///
    /// Fails with `DuplicateName` if any unarchived version of `name` exists.
    /// If every prior version is archived, the new draft continues the
    /// version sequence; numbers are never reused.
    pub fn create(
        &mut self,
        name: &str,
        content: ContentRef,
        sequence_hint: Option<u32>,
    ) -> Result<&Artifact, StoreError> {
        if let Some(versions) = self.artifacts.get(name) {
            if let Some(live) = versions.iter().find(|a| a.stage != Stage::Archived) {
                return Err(StoreError::DuplicateName {
                    name: name.to_string(),
                    version: live.version,
                    stage: live.stage,
                });
            }
        }
        let version = self.next_version(name);
        self.push_version(name, version, content, sequence_hint, StoreEventKind::Created)
    }

    /// Open the next revision of `name` as a draft at `max(existing) + 1`.
    ///
    /// The store does not check review history; the orchestrator only calls
    /// this after recording a `revise` verdict for the prior version.
    pub fn new_revision(
        &mut self,
        name: &str,
        content: ContentRef,
    ) -> Result<&Artifact, StoreError> {
        let versions = self.artifacts.get(name).ok_or_else(|| StoreError::NotFound {
            name: name.to_string(),
            version: 0,
        })?;
        let sequence_hint = versions.last().and_then(|a| a.sequence_hint);
        let version = self.next_version(name);
        self.push_version(
            name,
            version,
            content,
            sequence_hint,
            StoreEventKind::RevisionOpened,
        )
    }

    /// Move a draft into review. At most one version per name may be under
    /// review at a time.
    pub fn submit_for_review(&mut self, name: &str, version: u32) -> Result<(), StoreError> {
        if let Some(reviewing) = self
            .artifacts
            .get(name)
            .and_then(|versions| versions.iter().find(|a| a.stage == Stage::UnderReview))
        {
            return Err(StoreError::InvalidTransition {
                op: "submit",
                name: name.to_string(),
                version: reviewing.version,
                stage: Stage::UnderReview,
            });
        }
        let artifact = self.find_mut(name, version)?;
        if artifact.stage != Stage::Draft {
            return Err(StoreError::InvalidTransition {
                op: "submit",
                name: name.to_string(),
                version,
                stage: artifact.stage,
            });
        }
        artifact.stage = Stage::UnderReview;
        self.record(StoreEventKind::SubmittedForReview, name, version, None);
        Ok(())
    }

    /// Accept a version. Accepted artifacts are immutable from here on.
    pub fn promote(&mut self, name: &str, version: u32) -> Result<(), StoreError> {
        let artifact = self.find_mut(name, version)?;
        if artifact.stage != Stage::UnderReview {
            return Err(StoreError::InvalidTransition {
                op: "promote",
                name: name.to_string(),
                version,
                stage: artifact.stage,
            });
        }
        artifact.stage = Stage::Accepted;
        self.record(StoreEventKind::Promoted, name, version, None);
        Ok(())
    }

    /// Archive a superseded version. History is never deleted. Archiving an
    /// already-archived version is a no-op; accepted versions cannot be
    /// archived.
    pub fn archive(&mut self, name: &str, version: u32) -> Result<(), StoreError> {
        let artifact = self.find_mut(name, version)?;
        match artifact.stage {
            Stage::Archived => Ok(()),
            Stage::Accepted => Err(StoreError::InvalidTransition {
                op: "archive",
                name: name.to_string(),
                version,
                stage: Stage::Accepted,
            }),
            Stage::Draft | Stage::UnderReview => {
                artifact.stage = Stage::Archived;
                self.record(StoreEventKind::Archived, name, version, None);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str, version: u32) -> Option<&Artifact> {
        self.artifacts
            .get(name)?
            .iter()
            .find(|a| a.version == version)
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.values().flatten()
    }

    pub fn accepted(&self) -> Vec<&Artifact> {
        self.artifacts()
            .filter(|a| a.stage == Stage::Accepted)
            .collect()
    }

    pub fn events(&self) -> &[StoreEvent] {
        &self.events
    }

    /// Events with `seq` greater than `after`, for incremental mirroring.
    pub fn events_since(&self, after: u64) -> &[StoreEvent] {
        let start = self.events.partition_point(|e| e.seq <= after);
        &self.events[start..]
    }

    fn next_version(&self, name: &str) -> u32 {
        self.artifacts
            .get(name)
            .and_then(|versions| versions.last())
            .map(|a| a.version + 1)
            .unwrap_or(1)
    }

    fn push_version(
        &mut self,
        name: &str,
        version: u32,
        content: ContentRef,
        sequence_hint: Option<u32>,
        kind: StoreEventKind,
    ) -> Result<&Artifact, StoreError> {
        let content_sha256 = content.sha256();
        let created_seq = self.record(kind, name, version, Some(content_sha256));
        let versions = self.artifacts.entry(name.to_string()).or_default();
        versions.push(Artifact {
            name: name.to_string(),
            version,
            stage: Stage::Draft,
            content,
            sequence_hint,
            created_seq,
        });
        Ok(versions.last().expect("version just pushed"))
    }

    fn find_mut(&mut self, name: &str, version: u32) -> Result<&mut Artifact, StoreError> {
        self.artifacts
            .get_mut(name)
            .and_then(|versions| versions.iter_mut().find(|a| a.version == version))
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
                version,
            })
    }

    fn record(
        &mut self,
        kind: StoreEventKind,
        name: &str,
        version: u32,
        content_sha256: Option<String>,
    ) -> u64 {
        self.next_seq += 1;
        self.events.push(StoreEvent {
            seq: self.next_seq,
            at_epoch_ms: now_epoch_ms(),
            kind,
            name: name.to_string(),
            version,
            content_sha256,
        });
        self.next_seq
    }
}
