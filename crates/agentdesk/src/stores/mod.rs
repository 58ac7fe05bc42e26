//! Collaborator stores used by the workspace binding and the model catalog.
//!
//! The traits are the narrow contracts the core needs from the rest of the
//! application; the concrete types are the implementations the `agentdesk`
//! binary wires up.

mod credentials;
mod json_file;
mod picker;
mod settings;
mod threads;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

pub use credentials::{FileCredentialStore, mask_api_key};
pub use picker::{CommandPicker, UnavailablePicker};
pub use settings::JsonSettingsStore;
pub use threads::SqliteThreadStore;

/// A chat thread as seen by the workspace core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRecord {
    pub id: String,
    /// JSON object text, owned by the chat subsystem.
    pub metadata: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ThreadUpdate {
    pub metadata: String,
}

#[async_trait]
pub trait ThreadStore: Send + Sync {
    async fn get_thread(&self, id: &str) -> Result<Option<ThreadRecord>>;
    async fn update_thread(&self, id: &str, update: ThreadUpdate) -> Result<()>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: Value) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;

    /// Non-empty string value for `key`.
    async fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key).await {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
            _ => None,
        }
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_api_key(&self, provider_id: &str) -> Option<String>;
    async fn set_api_key(&self, provider_id: &str, api_key: &str) -> Result<()>;
    async fn delete_api_key(&self, provider_id: &str) -> Result<()>;

    async fn has_api_key(&self, provider_id: &str) -> bool {
        self.get_api_key(provider_id).await.is_some()
    }
}

/// Outcome of a directory-picker dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PickerResult {
    pub canceled: bool,
    pub paths: Vec<String>,
}

impl PickerResult {
    pub fn canceled() -> Self {
        Self {
            canceled: true,
            paths: Vec::new(),
        }
    }

    pub fn selected(path: impl Into<String>) -> Self {
        Self {
            canceled: false,
            paths: vec![path.into()],
        }
    }
}

#[async_trait]
pub trait DirectoryPicker: Send + Sync {
    async fn show(&self) -> PickerResult;
}
