//! Post-acceptance workspace reorganization.
//!
//! Runs exactly once, after every artifact has been accepted: orders the
//! accepted set, asks the synthesizer for an index document, publishes the
//! surface atomically, and prunes the transient `work/` tree. Non-accepted
//! versions stay in the event log but leave the visible surface.

use crate::artifact::{Artifact, ContentRef, Stage};
use crate::error::{FinalizeError, WorkspaceError};
use crate::staging::{publish_staging, write_staged_text};
use crate::store::ArtifactStore;
use crate::worker::Synthesizer;
use crate::workspace::{now_epoch_ms, slugify, WorkspacePaths};
use std::fs;

pub struct WorkspaceFinalizer;

impl WorkspaceFinalizer {
    /// Publish the accepted surface and return the index content.
    ///
    /// Defends against incomplete workspaces even though the orchestrator's
    /// state machine should make that unreachable.
    pub fn finalize(
        paths: &WorkspacePaths,
        store: &ArtifactStore,
        synthesizer: &mut dyn Synthesizer,
    ) -> Result<ContentRef, FinalizeError> {
        if let Some(open) = store
            .artifacts()
            .find(|a| matches!(a.stage, Stage::Draft | Stage::UnderReview))
        {
            return Err(FinalizeError::IncompleteWorkspace {
                name: open.name.clone(),
                version: open.version,
                stage: open.stage,
            });
        }

        let accepted = reading_order(store);
        let index = synthesizer.summarize(&accepted)?;

        let txn_id = format!("{}", now_epoch_ms());
        let staging_root = paths.txn_staging_root(&txn_id);
        let backup_root = paths.txn_backup_root(&txn_id);

        let mut used_slugs = std::collections::BTreeSet::new();
        for artifact in &accepted {
            let mut slug = slugify(&artifact.name);
            // Disambiguate names that collapse to the same slug.
            while !used_slugs.insert(slug.clone()) {
                slug.push_str("-x");
            }
            let rel = format!("notes/{slug}.md");
            write_staged_text(&staging_root, &rel, artifact.content.as_str())?;
        }
        write_staged_text(&staging_root, "index.md", index.as_str())?;

        let published = publish_staging(&staging_root, &backup_root, paths.root())?;
        tracing::info!(files = published.len(), "published accepted surface");

        // Successful publish: drop the txn dir and the transient work tree.
        let txn_root = paths.txn_root(&txn_id);
        if txn_root.is_dir() {
            let _ = fs::remove_dir_all(&txn_root);
        }
        let txns_root = paths.txns_root();
        if let Ok(mut entries) = fs::read_dir(&txns_root) {
            if entries.next().is_none() {
                let _ = fs::remove_dir(&txns_root);
            }
        }
        let work_dir = paths.work_dir();
        if work_dir.is_dir() {
            fs::remove_dir_all(&work_dir)
                .map_err(|source| WorkspaceError::io("prune", &work_dir, source))?;
        }

        Ok(index)
    }
}

/// Accepted artifacts sorted by caller-supplied `sequence_hint`, then by
/// creation order for artifacts without a hint.
fn reading_order(store: &ArtifactStore) -> Vec<&Artifact> {
    let mut accepted = store.accepted();
    accepted.sort_by_key(|a| (a.sequence_hint.unwrap_or(u32::MAX), a.created_seq));
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollaboratorError;
    use crate::worker::ConceptDraft;

    struct IndexOnly;

    impl Synthesizer for IndexOnly {
        fn expand(&mut self, _artifact: &Artifact) -> Result<Vec<ConceptDraft>, CollaboratorError> {
            Ok(Vec::new())
        }

        fn summarize(&mut self, accepted: &[&Artifact]) -> Result<ContentRef, CollaboratorError> {
            let names: Vec<&str> = accepted.iter().map(|a| a.name.as_str()).collect();
            Ok(ContentRef::new(names.join("\n")))
        }
    }

    fn accept(store: &mut ArtifactStore, name: &str, hint: Option<u32>) {
        let version = store
            .create(name, ContentRef::new(format!("{name} body")), hint)
            .expect("create")
            .version;
        store.submit_for_review(name, version).expect("submit");
        store.promote(name, version).expect("promote");
    }

    #[test]
    fn test_finalize_rejects_open_versions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = WorkspacePaths::new(dir.path().to_path_buf());
        let mut store = ArtifactStore::new();
        store
            .create("graphs", ContentRef::new("draft"), None)
            .expect("create");

        let err = WorkspaceFinalizer::finalize(&paths, &store, &mut IndexOnly).unwrap_err();
        assert!(matches!(
            err,
            FinalizeError::IncompleteWorkspace {
                stage: Stage::Draft,
                ..
            }
        ));
        // Rejected finalize publishes nothing.
        assert!(!dir.path().join("index.md").exists());
    }

    #[test]
    fn test_finalize_publishes_accepted_surface_and_prunes_work() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = WorkspacePaths::new(dir.path().to_path_buf());
        fs::create_dir_all(paths.work_dir().join("graphs")).expect("seed work dir");
        fs::write(paths.work_dir().join("graphs/v1.md"), "draft").expect("seed draft");

        let mut store = ArtifactStore::new();
        accept(&mut store, "Graph Theory", Some(0));
        accept(&mut store, "Spanning Trees", Some(1));

        let index =
            WorkspaceFinalizer::finalize(&paths, &store, &mut IndexOnly).expect("finalize");
        assert_eq!(index.as_str(), "Graph Theory\nSpanning Trees");

        assert!(dir.path().join("notes/graph-theory.md").exists());
        assert!(dir.path().join("notes/spanning-trees.md").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("index.md")).expect("index"),
            "Graph Theory\nSpanning Trees"
        );
        assert!(!paths.work_dir().exists());
        assert!(!paths.txns_root().exists() || collect_dir_is_empty(&paths));
    }

    fn collect_dir_is_empty(paths: &WorkspacePaths) -> bool {
        fs::read_dir(paths.txns_root())
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }

    #[test]
    fn test_reading_order_prefers_hint_then_creation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = WorkspacePaths::new(dir.path().to_path_buf());
        let mut store = ArtifactStore::new();
        accept(&mut store, "unhinted", None);
        accept(&mut store, "second", Some(2));
        accept(&mut store, "first", Some(1));

        let index =
            WorkspaceFinalizer::finalize(&paths, &store, &mut IndexOnly).expect("finalize");
        assert_eq!(index.as_str(), "first\nsecond\nunhinted");
    }

    #[test]
    fn test_finalize_ignores_archived_versions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = WorkspacePaths::new(dir.path().to_path_buf());
        let mut store = ArtifactStore::new();
        let v1 = store
            .create("graphs", ContentRef::new("wrong"), Some(0))
            .expect("create")
            .version;
        store.submit_for_review("graphs", v1).expect("submit");
        store.archive("graphs", v1).expect("archive");
        let v2 = store
            .new_revision("graphs", ContentRef::new("right"))
            .expect("revision")
            .version;
        store.submit_for_review("graphs", v2).expect("submit");
        store.promote("graphs", v2).expect("promote");

        WorkspaceFinalizer::finalize(&paths, &store, &mut IndexOnly).expect("finalize");
        assert_eq!(
            fs::read_to_string(dir.path().join("notes/graphs.md")).expect("note"),
            "right"
        );
    }
}
