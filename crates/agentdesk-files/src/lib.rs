//! Workspace file access for agentdesk.
//!
//! This crate resolves thread-facing virtual paths against a bound workspace
//! root, lists workspace trees, reads file content and keeps per-thread
//! filesystem watches. It has no notion of threads beyond the identifiers
//! used to key watches; binding a root to a thread happens in `agentdesk`.

pub mod config;
pub mod error;
pub mod paths;
pub mod reader;
pub mod snapshot;
pub mod watcher;

pub use config::FilesConfig;
pub use error::{ErrorBody, Outcome, WorkspaceError, WorkspaceResult};
pub use paths::{to_disk, to_virtual};
pub use reader::{BinaryFile, TextFile, read_binary, read_text};
pub use snapshot::{VirtualFileEntry, snapshot, walk_workspace};
pub use watcher::{WorkspaceEvent, WorkspaceWatcher};
