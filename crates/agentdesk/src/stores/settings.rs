//! Settings store - flat JSON key-value file.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

use super::SettingsStore;
use super::json_file::JsonMapFile;

/// Application settings persisted as a single JSON object.
#[derive(Debug)]
pub struct JsonSettingsStore {
    file: JsonMapFile,
}

impl JsonSettingsStore {
    /// Load settings from `path`. A missing file starts empty.
    pub fn open(path: &Path) -> Result<Self> {
        tracing::info!("Loading settings from: {:?}", path);
        Ok(Self {
            file: JsonMapFile::load(path, false)?,
        })
    }

    /// Settings that are never written to disk (tests, dry runs).
    pub fn in_memory() -> Self {
        Self {
            file: JsonMapFile::in_memory(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.file.path()
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn get(&self, key: &str) -> Option<Value> {
        self.file.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        tracing::debug!("Updating setting {}", key);
        self.file.insert(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        tracing::debug!("Deleting setting {}", key);
        self.file.remove(key).await
    }
}
