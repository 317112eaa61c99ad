//! Staged writes with atomic publish and rollback.
//!
//! The finalizer writes the whole accepted surface into a staging tree
//! first, then publishes file by file with backups, so a failed publish
//! leaves the workspace as it was.

use crate::error::WorkspaceError;
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) fn write_staged_text(
    staging_root: &Path,
    rel_path: &str,
    text: &str,
) -> Result<(), WorkspaceError> {
    let staging_path = staging_root.join(rel_path);
    if let Some(parent) = staging_path.parent() {
        fs::create_dir_all(parent).map_err(|source| WorkspaceError::io("create", parent, source))?;
    }
    fs::write(&staging_path, text.as_bytes())
        .map_err(|source| WorkspaceError::io("write", &staging_path, source))
}

/// Move every staged file into the workspace. Files that already exist are
/// backed up under `backup_root` first; any publish failure rolls the whole
/// batch back.
pub(crate) fn publish_staging(
    staging_root: &Path,
    backup_root: &Path,
    workspace_root: &Path,
) -> Result<Vec<PathBuf>, WorkspaceError> {
    if !staging_root.exists() {
        return Ok(Vec::new());
    }
    let files = collect_files_recursive(staging_root)?;
    fs::create_dir_all(backup_root)
        .map_err(|source| WorkspaceError::io("create", backup_root, source))?;
    let mut published = Vec::new();
    let mut backups: Vec<(PathBuf, PathBuf)> = Vec::new();
    let mut created: Vec<PathBuf> = Vec::new();
    for file in files {
        let rel = file
            .strip_prefix(staging_root)
            .map_err(|_| {
                WorkspaceError::io(
                    "publish",
                    &file,
                    std::io::Error::other("staged file outside staging root"),
                )
            })?
            .to_path_buf();
        let dest = workspace_root.join(&rel);
        if dest.exists() {
            let backup = backup_root.join(&rel);
            if let Some(parent) = backup.parent() {
                fs::create_dir_all(parent)
                    .map_err(|source| WorkspaceError::io("create", parent, source))?;
            }
            fs::rename(&dest, &backup)
                .or_else(|_| fs::copy(&dest, &backup).map(|_| ()))
                .map_err(|source| WorkspaceError::io("backup", &dest, source))?;
            backups.push((dest.clone(), backup));
        } else {
            created.push(dest.clone());
        }

        if let Err(err) = publish_file(&file, &dest) {
            rollback_publish(&published, &backups, &created);
            return Err(err);
        }
        published.push(dest);
    }
    Ok(published)
}

pub(crate) fn collect_files_recursive(root: &Path) -> Result<Vec<PathBuf>, WorkspaceError> {
    let mut files = Vec::new();
    if !root.exists() {
        return Ok(files);
    }
    for entry in fs::read_dir(root).map_err(|source| WorkspaceError::io("read", root, source))? {
        let entry = entry.map_err(|source| WorkspaceError::io("read", root, source))?;
        let path = entry.path();
        if path.is_dir() {
            files.extend(collect_files_recursive(&path)?);
        } else if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn publish_file(source: &Path, dest: &Path) -> Result<(), WorkspaceError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|err| WorkspaceError::io("create", parent, err))?;
    }
    let file_name = dest
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("staged");
    let tmp_path = dest
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!(".{file_name}.tmp"));
    fs::copy(source, &tmp_path).map_err(|err| WorkspaceError::io("publish", dest, err))?;
    fs::rename(&tmp_path, dest).map_err(|err| WorkspaceError::io("publish", dest, err))
}

fn rollback_publish(published: &[PathBuf], backups: &[(PathBuf, PathBuf)], created: &[PathBuf]) {
    for path in published {
        if path.exists() {
            let _ = fs::remove_file(path);
        }
    }
    for path in created {
        if path.exists() {
            let _ = fs::remove_file(path);
        }
    }
    for (dest, backup) in backups {
        if let Some(parent) = dest.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = fs::rename(backup, dest).or_else(|_| fs::copy(backup, dest).map(|_| ()));
    }
}
