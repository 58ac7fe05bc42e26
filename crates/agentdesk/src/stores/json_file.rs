use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// A flat JSON object kept in memory and mirrored to a file on every write.
#[derive(Debug)]
pub(crate) struct JsonMapFile {
    path: Option<PathBuf>,
    private: bool,
    values: RwLock<Map<String, Value>>,
}

impl JsonMapFile {
    pub(crate) fn load(path: &Path, private: bool) -> Result<Self> {
        let values = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            if content.trim().is_empty() {
                Map::new()
            } else {
                match serde_json::from_str::<Value>(&content)
                    .with_context(|| format!("parsing {}", path.display()))?
                {
                    Value::Object(map) => map,
                    _ => anyhow::bail!("{} does not contain a JSON object", path.display()),
                }
            }
        } else {
            Map::new()
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            private,
            values: RwLock::new(values),
        })
    }

    pub(crate) fn in_memory() -> Self {
        Self {
            path: None,
            private: false,
            values: RwLock::new(Map::new()),
        }
    }

    pub(crate) fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) async fn get(&self, key: &str) -> Option<Value> {
        self.values.read().await.get(key).cloned()
    }

    pub(crate) async fn insert(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.write().await;
        values.insert(key.to_string(), value);
        self.persist(&values).await
    }

    pub(crate) async fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().await;
        if values.remove(key).is_some() {
            self.persist(&values).await?;
        }
        Ok(())
    }

    async fn persist(&self, values: &Map<String, Value>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(values).context("serializing JSON store")?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content)
            .await
            .with_context(|| format!("writing {}", tmp_path.display()))?;

        if self.private {
            restrict_permissions(&tmp_path).await?;
        }

        tokio::fs::rename(&tmp_path, path)
            .await
            .with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .await
        .with_context(|| format!("restricting permissions on {}", path.display()))
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
