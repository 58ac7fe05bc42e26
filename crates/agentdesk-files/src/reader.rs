//! Contained reads of workspace files.

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;
use tracing::debug;

use crate::config::FilesConfig;
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::paths::to_disk;
use crate::snapshot::modified_at;

/// Text content of a workspace file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFile {
    pub content: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

/// Binary content of a workspace file, base64 encoded
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryFile {
    pub content_base64: String,
    pub mime_type: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

/// Read a workspace file as text.
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub async fn read_text(
    root: Option<&Path>,
    virtual_path: &str,
    config: &FilesConfig,
) -> WorkspaceResult<TextFile> {
    let (path, metadata) = resolve_file(root, virtual_path, config).await?;
    let bytes = fs::read(&path).await?;

    Ok(TextFile {
        content: String::from_utf8_lossy(&bytes).into_owned(),
        size: metadata.len(),
        modified_at: modified_at(&metadata),
    })
}

/// Read a workspace file as base64.
pub async fn read_binary(
    root: Option<&Path>,
    virtual_path: &str,
    config: &FilesConfig,
) -> WorkspaceResult<BinaryFile> {
    let (path, metadata) = resolve_file(root, virtual_path, config).await?;
    let bytes = fs::read(&path).await?;

    let mime_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();

    Ok(BinaryFile {
        content_base64: STANDARD.encode(&bytes),
        mime_type,
        size: metadata.len(),
        modified_at: modified_at(&metadata),
    })
}

async fn resolve_file(
    root: Option<&Path>,
    virtual_path: &str,
    config: &FilesConfig,
) -> WorkspaceResult<(PathBuf, Metadata)> {
    let root = root.ok_or(WorkspaceError::NoWorkspace)?;
    let path = to_disk(root, virtual_path)?;
    let metadata = fs::metadata(&path).await?;

    if metadata.is_dir() {
        return Err(WorkspaceError::IsDirectory);
    }

    if metadata.len() > config.max_read_bytes {
        return Err(WorkspaceError::FileTooLarge {
            size: metadata.len(),
            limit: config.max_read_bytes,
        });
    }

    debug!("Reading workspace file: {}", path.display());
    Ok((path, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;
    use tempfile::TempDir;

    fn workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        stdfs::write(dir.path().join("file.txt"), "hi").unwrap();
        stdfs::create_dir(dir.path().join("dir")).unwrap();
        stdfs::write(dir.path().join("image.png"), [0x89, b'P', b'N', b'G']).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_read_text() {
        let dir = workspace();

        let file = read_text(Some(dir.path()), "/file.txt", &FilesConfig::default())
            .await
            .unwrap();
        assert_eq!(file.content, "hi");
        assert_eq!(file.size, 2);
        assert!(file.modified_at.is_some());
    }

    #[tokio::test]
    async fn test_read_text_replaces_invalid_utf8() {
        let dir = workspace();
        stdfs::write(dir.path().join("latin1.txt"), [b'c', b'a', b'f', 0xe9]).unwrap();

        let file = read_text(Some(dir.path()), "/latin1.txt", &FilesConfig::default())
            .await
            .unwrap();
        assert_eq!(file.content, "caf\u{fffd}");
        assert_eq!(file.size, 4);
    }

    #[tokio::test]
    async fn test_read_binary() {
        let dir = workspace();

        let file = read_binary(Some(dir.path()), "/image.png", &FilesConfig::default())
            .await
            .unwrap();
        assert_eq!(file.content_base64, STANDARD.encode([0x89, b'P', b'N', b'G']));
        assert_eq!(file.mime_type, "image/png");
        assert_eq!(file.size, 4);
    }

    #[tokio::test]
    async fn test_read_without_workspace() {
        let config = FilesConfig::default();

        let text = read_text(None, "/file.txt", &config).await;
        assert!(matches!(text, Err(WorkspaceError::NoWorkspace)));

        let binary = read_binary(None, "/file.txt", &config).await;
        assert!(matches!(binary, Err(WorkspaceError::NoWorkspace)));
    }

    #[tokio::test]
    async fn test_read_outside_root_is_denied() {
        let dir = workspace();
        let config = FilesConfig::default();

        for escape in ["/../etc/passwd", "../../../../etc/hosts", "/dir/../../file.txt"] {
            let text = read_text(Some(dir.path()), escape, &config).await;
            assert!(matches!(text, Err(WorkspaceError::AccessDenied)), "{escape}");

            let binary = read_binary(Some(dir.path()), escape, &config).await;
            assert!(matches!(binary, Err(WorkspaceError::AccessDenied)), "{escape}");
        }
    }

    #[tokio::test]
    async fn test_read_directory() {
        let dir = workspace();

        let result = read_text(Some(dir.path()), "/dir", &FilesConfig::default()).await;
        assert!(matches!(result, Err(WorkspaceError::IsDirectory)));

        let result = read_binary(Some(dir.path()), "/", &FilesConfig::default()).await;
        assert!(matches!(result, Err(WorkspaceError::IsDirectory)));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = workspace();

        let result = read_text(Some(dir.path()), "/missing.txt", &FilesConfig::default()).await;
        assert!(matches!(result, Err(WorkspaceError::Io(_))));
    }

    #[tokio::test]
    async fn test_read_respects_size_limit() {
        let dir = workspace();
        let config = FilesConfig {
            max_read_bytes: 1,
            ..FilesConfig::default()
        };

        let result = read_text(Some(dir.path()), "/file.txt", &config).await;
        assert_eq!(
            result.unwrap_err(),
            WorkspaceError::FileTooLarge { size: 2, limit: 1 }
        );
    }
}
