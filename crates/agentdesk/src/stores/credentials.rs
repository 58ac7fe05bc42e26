//! API key storage.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

use super::CredentialStore;
use super::json_file::JsonMapFile;

/// Environment variables consulted when no key is stored for a provider.
const ENV_FALLBACKS: &[(&str, &str)] = &[
    ("anthropic", "ANTHROPIC_API_KEY"),
    ("openai", "OPENAI_API_KEY"),
    ("google", "GEMINI_API_KEY"),
    ("ollama-cloud", "OLLAMA_API_KEY"),
];

/// API keys kept in an owner-only JSON file, keyed by provider id.
#[derive(Debug)]
pub struct FileCredentialStore {
    file: JsonMapFile,
    env_fallback: bool,
}

impl FileCredentialStore {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            file: JsonMapFile::load(path, true)?,
            env_fallback: true,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            file: JsonMapFile::in_memory(),
            env_fallback: false,
        }
    }

    /// Enable or disable the environment variable fallback.
    pub fn with_env_fallback(mut self, enabled: bool) -> Self {
        self.env_fallback = enabled;
        self
    }

    fn env_key(&self, provider_id: &str) -> Option<String> {
        if !self.env_fallback {
            return None;
        }

        let (_, var) = ENV_FALLBACKS.iter().find(|(id, _)| *id == provider_id)?;
        std::env::var(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get_api_key(&self, provider_id: &str) -> Option<String> {
        match self.file.get(provider_id).await {
            Some(Value::String(key)) if !key.is_empty() => Some(key),
            _ => self.env_key(provider_id),
        }
    }

    async fn set_api_key(&self, provider_id: &str, api_key: &str) -> Result<()> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            anyhow::bail!("API key for {} is empty", provider_id);
        }
        tracing::info!("Storing API key for provider {}", provider_id);
        self.file
            .insert(provider_id, Value::String(api_key.to_string()))
            .await
    }

    async fn delete_api_key(&self, provider_id: &str) -> Result<()> {
        tracing::info!("Deleting API key for provider {}", provider_id);
        self.file.remove(provider_id).await
    }
}

/// Preview of a secret that is safe to show in the UI.
pub fn mask_api_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
