//! Workspace layout and file plumbing for one curation run.
//!
//! The workspace is the run's only persistence: `curation/` carries config,
//! the event-log mirror, and the run report; `work/` holds routed draft
//! versions until the finalizer prunes it; `notes/` plus `index.md` are the
//! published surface.

use crate::artifact::ContentRef;
use crate::error::WorkspaceError;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    root: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn curation_dir(&self) -> PathBuf {
        self.root.join("curation")
    }

    pub fn config_path(&self) -> PathBuf {
        self.curation_dir().join("config.json")
    }

    pub fn events_path(&self) -> PathBuf {
        self.curation_dir().join("events.jsonl")
    }

    pub fn report_path(&self) -> PathBuf {
        self.curation_dir().join("report.json")
    }

    pub fn txns_root(&self) -> PathBuf {
        self.curation_dir().join("txns")
    }

    pub fn txn_root(&self, txn_id: &str) -> PathBuf {
        self.txns_root().join(txn_id)
    }

    pub fn txn_staging_root(&self, txn_id: &str) -> PathBuf {
        self.txn_root(txn_id).join("staging")
    }

    pub fn txn_backup_root(&self, txn_id: &str) -> PathBuf {
        self.txn_root(txn_id).join("backup")
    }

    pub fn work_dir(&self) -> PathBuf {
        self.root.join("work")
    }

    pub fn work_version_path(&self, slug: &str, version: u32) -> PathBuf {
        self.work_dir().join(slug).join(format!("v{version}.md"))
    }

    pub fn notes_dir(&self) -> PathBuf {
        self.root.join("notes")
    }

    pub fn note_path(&self, slug: &str) -> PathBuf {
        self.notes_dir().join(format!("{slug}.md"))
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join("index.md")
    }
}

/// File-name slug for an artifact name: lowercase alphanumerics joined by
/// single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("untitled");
    }
    slug
}

// A clock before the epoch degrades to 0 rather than failing the run.
pub(crate) fn now_epoch_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

pub(crate) fn write_text(path: &Path, text: &str) -> Result<(), WorkspaceError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| WorkspaceError::io("create", parent, source))?;
    }
    fs::write(path, text.as_bytes()).map_err(|source| WorkspaceError::io("write", path, source))
}

pub(crate) fn write_json<T: Serialize>(
    path: &Path,
    value: &T,
    what: &'static str,
) -> Result<(), WorkspaceError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|source| WorkspaceError::Json { what, source })?;
    write_text(path, &text)
}

pub(crate) fn append_jsonl<T: Serialize>(
    path: &Path,
    value: &T,
    what: &'static str,
) -> Result<(), WorkspaceError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| WorkspaceError::io("create", parent, source))?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| WorkspaceError::io("open", path, source))?;
    let line =
        serde_json::to_string(value).map_err(|source| WorkspaceError::Json { what, source })?;
    file.write_all(line.as_bytes())
        .map_err(|source| WorkspaceError::io("write", path, source))?;
    file.write_all(b"\n")
        .map_err(|source| WorkspaceError::io("write", path, source))
}

/// Route a freshly produced version into the transient `work/` area. The
/// content is written through untouched.
pub(crate) fn route_draft(
    paths: &WorkspacePaths,
    name: &str,
    version: u32,
    content: &ContentRef,
) -> Result<(), WorkspaceError> {
    let path = paths.work_version_path(&slugify(name), version);
    write_text(&path, content.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("Graph Theory"), "graph-theory");
        assert_eq!(slugify("  spanning -- trees  "), "spanning-trees");
        assert_eq!(slugify("Euler's Formula"), "euler-s-formula");
    }

    #[test]
    fn test_slugify_empty_falls_back() {
        assert_eq!(slugify("---"), "untitled");
    }

    #[test]
    fn test_route_draft_writes_versioned_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = WorkspacePaths::new(dir.path().to_path_buf());
        let content = ContentRef::new("v2 body");
        route_draft(&paths, "Graph Theory", 2, &content).expect("route draft");
        let written = fs::read_to_string(dir.path().join("work/graph-theory/v2.md"))
            .expect("draft file exists");
        assert_eq!(written, "v2 body");
    }
}
