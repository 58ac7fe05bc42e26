//! Per-thread workspace binding.
//!
//! A thread is either unbound or bound to one absolute directory. The binding
//! lives in the thread's metadata (`workspacePath`); a global fallback stored
//! in settings serves callers that have no thread id. Binding a thread starts
//! its filesystem watch and unbinding stops it. Nothing else starts a watch.

mod metadata;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use agentdesk_files::{
    BinaryFile, ErrorBody, FilesConfig, TextFile, VirtualFileEntry, WorkspaceError,
    WorkspaceEvent, WorkspaceResult, WorkspaceWatcher,
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::stores::{DirectoryPicker, SettingsStore, ThreadStore, ThreadUpdate};

pub use metadata::{WORKSPACE_PATH_KEY, with_workspace_path, workspace_path};

/// Snapshot reply: `{ success, files, workspacePath }` or
/// `{ success: false, error, code, files: [] }`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResult {
    pub success: bool,
    pub files: Vec<VirtualFileEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_path: Option<String>,
    #[serde(flatten)]
    pub failure: Option<ErrorBody>,
}

impl SnapshotResult {
    fn failed(err: &WorkspaceError) -> Self {
        Self {
            success: false,
            files: Vec::new(),
            workspace_path: None,
            failure: Some(err.into()),
        }
    }
}

fn store_error(err: anyhow::Error) -> WorkspaceError {
    WorkspaceError::Store(format!("{err:#}"))
}

pub struct WorkspaceBinding {
    threads: Arc<dyn ThreadStore>,
    settings: Arc<dyn SettingsStore>,
    picker: Arc<dyn DirectoryPicker>,
    watcher: WorkspaceWatcher,
    files: FilesConfig,
}

impl WorkspaceBinding {
    pub fn new(
        threads: Arc<dyn ThreadStore>,
        settings: Arc<dyn SettingsStore>,
        picker: Arc<dyn DirectoryPicker>,
        files: FilesConfig,
    ) -> Self {
        Self {
            threads,
            settings,
            picker,
            watcher: WorkspaceWatcher::new(files.clone()),
            files,
        }
    }

    /// Bound root for `thread_id`, or the global fallback without one.
    ///
    /// Unknown threads read as unbound.
    pub async fn get(&self, thread_id: Option<&str>) -> WorkspaceResult<Option<PathBuf>> {
        let path = match thread_id {
            Some(thread_id) => {
                let thread = self
                    .threads
                    .get_thread(thread_id)
                    .await
                    .map_err(store_error)?;
                thread.and_then(|t| workspace_path(t.metadata.as_deref()))
            }
            None => self.settings.get_string(WORKSPACE_PATH_KEY).await,
        };
        Ok(path.map(PathBuf::from))
    }

    /// Bind (`Some`) or unbind (`None`) a workspace root.
    ///
    /// With a thread id the path is merged into the thread metadata and the
    /// thread's watch is restarted or stopped. Without one only the global
    /// fallback setting changes; the fallback is never watched.
    pub async fn set(
        &self,
        thread_id: Option<&str>,
        path: Option<&str>,
    ) -> WorkspaceResult<Option<PathBuf>> {
        let path = path.map(str::trim).filter(|p| !p.is_empty());
        if let Some(relative) = path.filter(|p| !Path::new(p).is_absolute()) {
            return Err(WorkspaceError::InvalidPath(format!(
                "workspace path must be absolute: {relative}"
            )));
        }

        let Some(thread_id) = thread_id else {
            match path {
                Some(path) => self
                    .settings
                    .set(WORKSPACE_PATH_KEY, Value::String(path.to_string()))
                    .await
                    .map_err(store_error)?,
                None => self
                    .settings
                    .delete(WORKSPACE_PATH_KEY)
                    .await
                    .map_err(store_error)?,
            }
            info!("Global workspace set to {:?}", path);
            return Ok(path.map(PathBuf::from));
        };

        let thread = self
            .threads
            .get_thread(thread_id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| WorkspaceError::ThreadNotFound(thread_id.to_string()))?;

        let metadata = with_workspace_path(thread.metadata.as_deref(), path)?;
        self.threads
            .update_thread(thread_id, ThreadUpdate { metadata })
            .await
            .map_err(store_error)?;

        match path {
            Some(path) => {
                info!("Thread {} bound to workspace {}", thread_id, path);
                self.watcher.start(thread_id, Path::new(path));
            }
            None => {
                info!("Thread {} unbound from workspace", thread_id);
                self.watcher.stop(thread_id);
            }
        }

        Ok(path.map(PathBuf::from))
    }

    /// Ask the directory picker for a root and bind it. A cancelled dialog
    /// returns `None` and changes nothing.
    pub async fn select_via_dialog(
        &self,
        thread_id: Option<&str>,
    ) -> WorkspaceResult<Option<PathBuf>> {
        let result = self.picker.show().await;
        let Some(path) = result.paths.first().filter(|_| !result.canceled) else {
            debug!("Workspace selection cancelled");
            return Ok(None);
        };
        self.set(thread_id, Some(path.as_str())).await
    }

    /// Walk the bound root. Never starts a watch.
    pub async fn snapshot(
        &self,
        thread_id: Option<&str>,
    ) -> WorkspaceResult<(PathBuf, Vec<VirtualFileEntry>)> {
        let root = self.get(thread_id).await?.ok_or(WorkspaceError::NoWorkspace)?;
        let files = agentdesk_files::snapshot(&root, &self.files).await?;
        debug!("Snapshot of {} has {} entries", root.display(), files.len());
        Ok((root, files))
    }

    pub async fn load_snapshot(&self, thread_id: Option<&str>) -> SnapshotResult {
        match self.snapshot(thread_id).await {
            Ok((root, files)) => SnapshotResult {
                success: true,
                files,
                workspace_path: Some(root.to_string_lossy().into_owned()),
                failure: None,
            },
            Err(err) => SnapshotResult::failed(&err),
        }
    }

    pub async fn read_text(
        &self,
        thread_id: Option<&str>,
        virtual_path: &str,
    ) -> WorkspaceResult<TextFile> {
        let root = self.get(thread_id).await?;
        agentdesk_files::read_text(root.as_deref(), virtual_path, &self.files).await
    }

    pub async fn read_binary(
        &self,
        thread_id: Option<&str>,
        virtual_path: &str,
    ) -> WorkspaceResult<BinaryFile> {
        let root = self.get(thread_id).await?;
        agentdesk_files::read_binary(root.as_deref(), virtual_path, &self.files).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.watcher.subscribe()
    }

    pub fn watcher(&self) -> &WorkspaceWatcher {
        &self.watcher
    }

    pub fn shutdown(&self) {
        self.watcher.stop_all();
    }
}
