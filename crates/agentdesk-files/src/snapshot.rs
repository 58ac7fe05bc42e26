//! Flat listings of a workspace tree.

use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::FilesConfig;
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::paths::to_virtual;

/// One entry of a workspace snapshot.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualFileEntry {
    pub virtual_path: String,
    pub is_directory: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl VirtualFileEntry {
    fn directory(virtual_path: String) -> Self {
        Self {
            virtual_path,
            is_directory: true,
            size: None,
            modified_at: None,
        }
    }

    fn file(virtual_path: String, metadata: &Metadata) -> Self {
        Self {
            virtual_path,
            is_directory: false,
            size: Some(metadata.len()),
            modified_at: modified_at(metadata),
        }
    }
}

pub(crate) fn modified_at(metadata: &Metadata) -> Option<DateTime<Utc>> {
    metadata.modified().ok().map(DateTime::<Utc>::from)
}

/// Snapshot a workspace on the blocking pool.
pub async fn snapshot(root: &Path, config: &FilesConfig) -> WorkspaceResult<Vec<VirtualFileEntry>> {
    let root = root.to_path_buf();
    let config = config.clone();

    tokio::task::spawn_blocking(move || walk_workspace(&root, &config))
        .await
        .map_err(|err| WorkspaceError::Io(err.to_string()))?
}

/// Depth-first walk of `root`.
///
/// Hidden entries and noise directories are skipped together with their
/// subtrees. A directory is always listed before its descendants and
/// siblings are sorted by name. Symlinks are never descended: a link whose
/// target stays inside the root is listed as what it points to, any other
/// link is left out. Any read or stat failure aborts the whole walk.
pub fn walk_workspace(root: &Path, config: &FilesConfig) -> WorkspaceResult<Vec<VirtualFileEntry>> {
    let root: PathBuf = root.canonicalize()?;
    if !root.is_dir() {
        return Err(WorkspaceError::Io(format!(
            "workspace root is not a directory: {}",
            root.display()
        )));
    }

    let mut entries = Vec::new();
    let walker = WalkDir::new(&root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !config.is_skipped(&entry.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = entry?;
        let virtual_path = to_virtual(&root, entry.path())?;

        if entry.path_is_symlink() {
            match linked_entry(&root, entry.path(), virtual_path) {
                Some(linked) => entries.push(linked),
                None => debug!("Skipping link {}", entry.path().display()),
            }
        } else if entry.file_type().is_dir() {
            entries.push(VirtualFileEntry::directory(virtual_path));
        } else {
            let metadata = entry.metadata()?;
            entries.push(VirtualFileEntry::file(virtual_path, &metadata));
        }
    }

    debug!(
        "Snapshot of {} contains {} entries",
        root.display(),
        entries.len()
    );

    Ok(entries)
}

/// Entry for a symlink, classified by its target. `None` for dangling links
/// and links that leave the root.
fn linked_entry(root: &Path, link: &Path, virtual_path: String) -> Option<VirtualFileEntry> {
    let target = link.canonicalize().ok()?;
    if !target.starts_with(root) {
        return None;
    }
    let metadata = fs::metadata(&target).ok()?;
    if metadata.is_dir() {
        Some(VirtualFileEntry::directory(virtual_path))
    } else {
        Some(VirtualFileEntry::file(virtual_path, &metadata))
    }
}
