//! Conversion between disk paths and thread-facing virtual paths.
//!
//! A virtual path is rooted at `/` and always resolves relative to exactly one
//! workspace root. Every disk-touching operation goes through [`to_disk`], which
//! is the only place containment is enforced: parent references, symlinks and
//! absolute-path injection are all caught by comparing canonical forms.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::error::{WorkspaceError, WorkspaceResult};

/// Resolve a virtual path to a canonical disk path inside `root`.
///
/// The leading `/` is stripped and `.`/`..` are folded lexically before the
/// join. The joined path is then canonicalized (for paths that do not exist
/// yet, the deepest existing ancestor is canonicalized and the remainder
/// appended) and must equal or descend from the canonical root.
pub fn to_disk(root: &Path, virtual_path: &str) -> WorkspaceResult<PathBuf> {
    let relative = normalize_virtual(virtual_path)?;
    let canonical_root = root.canonicalize()?;
    let candidate = canonicalize_existing(&root.join(&relative))?;

    if !candidate.starts_with(&canonical_root) {
        warn!(
            "Workspace escape attempt: {:?} resolved to {:?} which is outside {:?}",
            virtual_path, candidate, canonical_root
        );
        return Err(WorkspaceError::AccessDenied);
    }

    Ok(candidate)
}

/// Render a disk path under `root` as a virtual path.
///
/// Accepts paths expressed against either the root as given or its canonical
/// form. The root itself maps to `/`.
pub fn to_virtual(root: &Path, absolute: &Path) -> WorkspaceResult<String> {
    if let Ok(relative) = absolute.strip_prefix(root) {
        return render_virtual(relative);
    }

    let canonical_root = root.canonicalize()?;
    match absolute.strip_prefix(&canonical_root) {
        Ok(relative) => render_virtual(relative),
        Err(_) => Err(WorkspaceError::AccessDenied),
    }
}

/// Fold a virtual path into a relative path with no `.` or `..` components.
fn normalize_virtual(virtual_path: &str) -> WorkspaceResult<PathBuf> {
    if virtual_path.contains('\0') {
        warn!("Virtual path contains null byte: {:?}", virtual_path);
        return Err(WorkspaceError::InvalidPath(
            "path contains a null byte".to_string(),
        ));
    }

    let relative = virtual_path.trim_start_matches('/');
    let mut normalized = PathBuf::new();

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(name) => normalized.push(name),
            Component::CurDir => continue,
            Component::ParentDir => {
                if !normalized.pop() {
                    warn!("Path traversal attempt detected: {:?}", virtual_path);
                    return Err(WorkspaceError::AccessDenied);
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(WorkspaceError::InvalidPath(format!(
                    "unexpected absolute component in {virtual_path}"
                )));
            }
        }
    }

    Ok(normalized)
}

fn canonicalize_existing(path: &Path) -> WorkspaceResult<PathBuf> {
    let mut existing = path;
    let mut missing = Vec::new();

    loop {
        match existing.canonicalize() {
            Ok(mut canonical) => {
                for name in missing.iter().rev() {
                    canonical.push(name);
                }
                return Ok(canonical);
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let (Some(name), Some(parent)) = (existing.file_name(), existing.parent()) else {
                    return Err(err.into());
                };
                missing.push(name.to_os_string());
                existing = parent;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn render_virtual(relative: &Path) -> WorkspaceResult<String> {
    let mut virtual_path = String::new();

    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                virtual_path.push('/');
                virtual_path.push_str(&part.to_string_lossy());
            }
            Component::CurDir => {}
            _ => return Err(WorkspaceError::AccessDenied),
        }
    }

    if virtual_path.is_empty() {
        virtual_path.push('/');
    }

    Ok(virtual_path)
}
