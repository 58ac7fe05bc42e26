//! Per-thread filesystem watches.
//!
//! Each thread has at most one live watch. Raw notify events are debounced,
//! filtered to visible paths and broadcast as [`WorkspaceEvent::FilesChanged`].
//! The watcher never snapshots on its own; deciding what to reload is left to
//! whoever consumes the notifications.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use dashmap::DashMap;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::config::FilesConfig;
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::paths::to_virtual;

/// Size of the broadcast channel for workspace events.
const EVENT_BUFFER_SIZE: usize = 256;

/// Size of the raw notify event channel per watch.
const RAW_EVENT_BUFFER_SIZE: usize = 128;

/// A burst is flushed at the latest this many debounce windows after its
/// first event, even if changes keep arriving.
const MAX_WAIT_FACTOR: u32 = 4;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkspaceEvent {
    #[serde(rename_all = "camelCase")]
    FilesChanged {
        thread_id: String,
        /// Virtual paths touched since the previous notification
        paths: Vec<String>,
    },
}

struct WatchHandle {
    root: PathBuf,
    // Dropping the watcher releases the OS subscription and closes the raw channel.
    _watcher: RecommendedWatcher,
    forwarder: JoinHandle<()>,
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

/// Live watches keyed by thread id.
pub struct WorkspaceWatcher {
    watches: DashMap<String, WatchHandle>,
    event_tx: broadcast::Sender<WorkspaceEvent>,
    config: FilesConfig,
}

impl WorkspaceWatcher {
    pub fn new(config: FilesConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self {
            watches: DashMap::new(),
            event_tx,
            config,
        }
    }

    /// Subscribe to change notifications for every watched thread.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.event_tx.subscribe()
    }

    /// Watch `root` on behalf of `thread_id`, replacing any existing watch.
    ///
    /// Failures are logged and swallowed; a thread without a watch simply
    /// receives no notifications.
    pub fn start(&self, thread_id: &str, root: &Path) {
        self.stop(thread_id);

        match self.spawn_watch(thread_id, root) {
            Ok(handle) => {
                info!(
                    "Watching workspace {} for thread {}",
                    handle.root.display(),
                    thread_id
                );
                // Last start wins if two calls race for the same thread.
                self.watches.insert(thread_id.to_string(), handle);
            }
            Err(err) => {
                warn!(
                    "Failed to watch workspace {} for thread {}: {}",
                    root.display(),
                    thread_id,
                    err
                );
            }
        }
    }

    /// Stop the watch for `thread_id`. No-op when none is active.
    pub fn stop(&self, thread_id: &str) {
        if let Some((_, handle)) = self.watches.remove(thread_id) {
            info!(
                "Stopped watching workspace {} for thread {}",
                handle.root.display(),
                thread_id
            );
        }
    }

    pub fn stop_all(&self) {
        let threads = self.watched_threads();
        for thread_id in threads {
            self.stop(&thread_id);
        }
    }

    pub fn is_watching(&self, thread_id: &str) -> bool {
        self.watches.contains_key(thread_id)
    }

    /// Root currently watched for `thread_id`, in canonical form.
    pub fn watched_root(&self, thread_id: &str) -> Option<PathBuf> {
        self.watches.get(thread_id).map(|h| h.root.clone())
    }

    pub fn watched_threads(&self) -> Vec<String> {
        self.watches.iter().map(|entry| entry.key().clone()).collect()
    }

    fn spawn_watch(&self, thread_id: &str, root: &Path) -> WorkspaceResult<WatchHandle> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| WorkspaceError::Io(format!("no async runtime for watcher: {err}")))?;
        let root = root.canonicalize()?;
        if !root.is_dir() {
            return Err(WorkspaceError::Io(format!(
                "workspace root is not a directory: {}",
                root.display()
            )));
        }

        let (tx, rx) = mpsc::channel(RAW_EVENT_BUFFER_SIZE);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if tx.blocking_send(res).is_err() {
                debug!("Workspace watch channel closed");
            }
        })
        .map_err(|err| WorkspaceError::Io(err.to_string()))?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|err| WorkspaceError::Io(err.to_string()))?;

        let forwarder = runtime.spawn(forward_events(
            thread_id.to_string(),
            root.clone(),
            rx,
            self.event_tx.clone(),
            self.config.clone(),
        ));

        Ok(WatchHandle {
            root,
            _watcher: watcher,
            forwarder,
        })
    }
}

async fn forward_events(
    thread_id: String,
    root: PathBuf,
    mut rx: mpsc::Receiver<notify::Result<Event>>,
    event_tx: broadcast::Sender<WorkspaceEvent>,
    config: FilesConfig,
) {
    let debounce: Duration = config.watch_debounce();
    let mut pending: BTreeSet<String> = BTreeSet::new();
    let mut deadline: Option<Instant> = None;
    let mut burst_start: Option<Instant> = None;

    loop {
        tokio::select! {
            incoming = rx.recv() => {
                match incoming {
                    Some(Ok(event)) => {
                        if !is_change(&event.kind) {
                            continue;
                        }
                        for path in &event.paths {
                            if let Some(virtual_path) = visible_virtual_path(&root, path, &config) {
                                pending.insert(virtual_path);
                            }
                        }
                        if !pending.is_empty() {
                            let now = Instant::now();
                            let first = *burst_start.get_or_insert(now);
                            deadline = Some(flush_deadline(first, now, debounce));
                        }
                    }
                    Some(Err(err)) => {
                        warn!("Workspace watcher error for thread {}: {:?}", thread_id, err);
                    }
                    None => break,
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                burst_start = None;
                let paths: Vec<String> = std::mem::take(&mut pending).into_iter().collect();
                debug!("{} workspace path(s) changed for thread {}", paths.len(), thread_id);

                // Nobody listening is fine.
                let _ = event_tx.send(WorkspaceEvent::FilesChanged {
                    thread_id: thread_id.clone(),
                    paths,
                });
            }
        }
    }

    debug!("Workspace watch forwarder for thread {} finished", thread_id);
}

/// Quiet period after the latest event, capped relative to the first event
/// of the burst so steady writers cannot hold notifications back.
fn flush_deadline(first: Instant, now: Instant, debounce: Duration) -> Instant {
    let quiet = now + debounce;
    let cap = first + debounce * MAX_WAIT_FACTOR;
    quiet.min(cap)
}

fn is_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Virtual path for an event path, or `None` when it is the root itself or
/// lies under a hidden or noise entry.
fn visible_virtual_path(root: &Path, path: &Path, config: &FilesConfig) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;

    let mut has_name = false;
    for component in relative.components() {
        match component {
            Component::Normal(name) => {
                if config.is_skipped(&name.to_string_lossy()) {
                    return None;
                }
                has_name = true;
            }
            _ => return None,
        }
    }

    if !has_name {
        return None;
    }

    to_virtual(root, path).ok()
}
