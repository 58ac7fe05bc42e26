//! Model catalog: static table merged with cached Ollama discovery.

use reqwest::Client;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use super::ModelsConfig;
use super::cache::CachedSource;
use super::error::{CatalogError, CatalogResult};
use super::providers::{OLLAMA_CLOUD, PROVIDERS, find_provider, is_ollama_provider, static_models};
use super::sources::{
    LOCAL_ENDPOINT_KEY, ModelSource, OllamaCloudSource, OllamaLocalSource, fetch_tags,
    fetch_version, local_endpoint, normalize_endpoint,
};
use super::types::{ApiKeyStatus, ConnectionCheck, ModelDescriptor, ProviderStatus, SourceMode};
use crate::stores::{CredentialStore, SettingsStore, mask_api_key};

/// Settings key holding the selected model id.
pub const DEFAULT_MODEL_KEY: &str = "defaultModel";

/// Long-lived catalog owning both discovery caches.
pub struct ModelCatalog {
    cloud: CachedSource,
    local: CachedSource,
    credentials: Arc<dyn CredentialStore>,
    settings: Arc<dyn SettingsStore>,
    client: Client,
    config: ModelsConfig,
}

impl ModelCatalog {
    /// Catalog backed by Ollama Cloud and the local Ollama server.
    pub fn new(
        config: ModelsConfig,
        client: Client,
        credentials: Arc<dyn CredentialStore>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        let cloud = Arc::new(OllamaCloudSource::new(
            credentials.clone(),
            client.clone(),
            config.cloud_base_url.clone(),
            config.request_timeout(),
        ));
        let local = Arc::new(OllamaLocalSource::new(
            settings.clone(),
            client.clone(),
            config.local_endpoint.clone(),
            config.local_timeout(),
        ));
        Self::with_sources(config, client, credentials, settings, cloud, local)
    }

    pub fn with_sources(
        config: ModelsConfig,
        client: Client,
        credentials: Arc<dyn CredentialStore>,
        settings: Arc<dyn SettingsStore>,
        cloud: Arc<dyn ModelSource>,
        local: Arc<dyn ModelSource>,
    ) -> Self {
        let ttl = config.cache_ttl();
        Self {
            cloud: CachedSource::new(cloud, ttl),
            local: CachedSource::new(local, ttl),
            credentials,
            settings,
            client,
            config,
        }
    }

    /// Full catalog: static entries, then cloud, then local.
    ///
    /// Both sources are queried concurrently and fail independently. Static
    /// Ollama placeholders (both providers) are dropped as soon as either
    /// source returns something.
    pub async fn list_models(&self) -> Vec<ModelDescriptor> {
        let (cloud, local) = tokio::join!(self.cloud.models(), self.local.models());
        let discovered = !cloud.is_empty() || !local.is_empty();

        let statics = static_models()
            .into_iter()
            .filter(|m| !(discovered && is_ollama_provider(&m.provider_id)));

        let mut seen = HashSet::new();
        let mut key_cache: HashMap<String, bool> = HashMap::new();
        let mut models = Vec::new();

        for mut model in statics.chain(cloud).chain(local) {
            if !seen.insert(model.id.clone()) {
                continue;
            }

            model.available = if model.source_mode == Some(SourceMode::Local) {
                true
            } else if let Some(has_key) = key_cache.get(&model.provider_id) {
                *has_key
            } else {
                let has_key = self.credentials.has_api_key(&model.provider_id).await;
                key_cache.insert(model.provider_id.clone(), has_key);
                has_key
            };

            models.push(model);
        }

        debug!("Catalog assembled with {} models", models.len());
        models
    }

    pub async fn refresh_cloud(&self) -> usize {
        let count = self.cloud.refresh().await;
        info!("Refreshed cloud models: {}", count);
        count
    }

    pub async fn refresh_local(&self) -> usize {
        let count = self.local.refresh().await;
        info!("Refreshed local models: {}", count);
        count
    }

    pub async fn invalidate_cloud(&self) {
        self.cloud.invalidate().await;
    }

    pub async fn invalidate_local(&self) {
        self.local.invalidate().await;
    }

    pub async fn providers(&self) -> Vec<ProviderStatus> {
        let mut providers = Vec::with_capacity(PROVIDERS.len());
        for provider in PROVIDERS {
            providers.push(ProviderStatus {
                id: provider.id.to_string(),
                name: provider.name.to_string(),
                description: provider.description.to_string(),
                requires_api_key: provider.requires_api_key,
                has_api_key: self.credentials.has_api_key(provider.id).await,
            });
        }
        providers
    }

    pub async fn api_key_status(&self, provider_id: &str) -> CatalogResult<ApiKeyStatus> {
        ensure_provider(provider_id)?;
        let key = self.credentials.get_api_key(provider_id).await;
        Ok(ApiKeyStatus {
            provider_id: provider_id.to_string(),
            has_api_key: key.is_some(),
            preview: key.as_deref().map(mask_api_key),
        })
    }

    pub async fn set_api_key(&self, provider_id: &str, api_key: &str) -> CatalogResult<()> {
        ensure_provider(provider_id)?;
        self.credentials.set_api_key(provider_id, api_key).await?;
        if provider_id == OLLAMA_CLOUD {
            self.cloud.invalidate().await;
        }
        Ok(())
    }

    pub async fn delete_api_key(&self, provider_id: &str) -> CatalogResult<()> {
        ensure_provider(provider_id)?;
        self.credentials.delete_api_key(provider_id).await?;
        if provider_id == OLLAMA_CLOUD {
            self.cloud.invalidate().await;
        }
        Ok(())
    }

    pub async fn local_endpoint(&self) -> String {
        local_endpoint(self.settings.as_ref(), &self.config.local_endpoint).await
    }

    /// Store a new local endpoint; an empty value restores the default.
    pub async fn set_local_endpoint(&self, endpoint: &str) -> CatalogResult<String> {
        if endpoint.trim().is_empty() {
            self.settings.delete(LOCAL_ENDPOINT_KEY).await?;
        } else {
            let endpoint = normalize_endpoint(endpoint)?;
            self.settings
                .set(LOCAL_ENDPOINT_KEY, Value::String(endpoint))
                .await?;
        }
        self.local.invalidate().await;

        let effective = self.local_endpoint().await;
        info!("Local model endpoint set to {}", effective);
        Ok(effective)
    }

    /// Check a local server without touching the cache.
    pub async fn test_local_connection(&self, endpoint: Option<&str>) -> ConnectionCheck {
        let endpoint = match endpoint.map(str::trim).filter(|e| !e.is_empty()) {
            Some(endpoint) => match normalize_endpoint(endpoint) {
                Ok(endpoint) => endpoint,
                Err(e) => return failed_check(endpoint, &e),
            },
            None => self.local_endpoint().await,
        };

        let timeout = self.config.local_timeout();
        match fetch_tags(&self.client, &endpoint, timeout).await {
            Ok(tags) => ConnectionCheck {
                success: true,
                model_count: Some(tags.models.len()),
                version: fetch_version(&self.client, &endpoint, timeout).await,
                endpoint,
                error: None,
            },
            Err(e) => {
                debug!("Local connection test failed: {}", e);
                failed_check(&endpoint, &e)
            }
        }
    }

    /// Stored default model, or the first available model.
    pub async fn default_model(&self) -> Option<String> {
        if let Some(id) = self.settings.get_string(DEFAULT_MODEL_KEY).await {
            return Some(id);
        }
        self.list_models()
            .await
            .into_iter()
            .find(|m| m.available)
            .map(|m| m.id)
    }

    pub async fn set_default_model(&self, model_id: &str) -> CatalogResult<String> {
        let model_id = model_id.trim();
        if model_id.is_empty() {
            self.settings.delete(DEFAULT_MODEL_KEY).await?;
        } else {
            self.settings
                .set(DEFAULT_MODEL_KEY, Value::String(model_id.to_string()))
                .await?;
        }
        Ok(model_id.to_string())
    }
}

fn ensure_provider(provider_id: &str) -> CatalogResult<()> {
    find_provider(provider_id)
        .map(|_| ())
        .ok_or_else(|| CatalogError::UnknownProvider(provider_id.to_string()))
}

fn failed_check(endpoint: &str, err: &CatalogError) -> ConnectionCheck {
    ConnectionCheck {
        success: false,
        endpoint: endpoint.to_string(),
        model_count: None,
        version: None,
        error: Some(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cache::tests::ScriptedSource;
    use crate::models::providers::OLLAMA_LOCAL;
    use crate::stores::{FileCredentialStore, JsonSettingsStore};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    struct Fixture {
        catalog: ModelCatalog,
        cloud: Arc<ScriptedSource>,
        local: Arc<ScriptedSource>,
        credentials: Arc<FileCredentialStore>,
    }

    fn fixture(cloud: Arc<ScriptedSource>, local: Arc<ScriptedSource>) -> Fixture {
        let credentials = Arc::new(FileCredentialStore::in_memory());
        let catalog = ModelCatalog::with_sources(
            ModelsConfig::default(),
            Client::new(),
            credentials.clone(),
            Arc::new(JsonSettingsStore::in_memory()),
            cloud.clone(),
            local.clone(),
        );
        Fixture {
            catalog,
            cloud,
            local,
            credentials,
        }
    }

    fn ids(models: &[ModelDescriptor]) -> Vec<&str> {
        models.iter().map(|m| m.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_no_discovery_keeps_static_table() {
        let f = fixture(
            ScriptedSource::failing(SourceMode::Cloud),
            ScriptedSource::failing(SourceMode::Local),
        );

        let models = f.catalog.list_models().await;
        let expected = static_models();
        assert_eq!(ids(&models), ids(&expected));
        assert!(models.iter().all(|m| !m.available));
    }

    #[tokio::test]
    async fn test_local_discovery_suppresses_both_ollama_placeholders() {
        let f = fixture(
            ScriptedSource::ok(SourceMode::Cloud, &[]),
            ScriptedSource::ok(SourceMode::Local, &["llama3.2:3b"]),
        );

        let models = f.catalog.list_models().await;
        assert!(
            !models
                .iter()
                .any(|m| is_ollama_provider(&m.provider_id) && m.source_mode.is_none())
        );
        assert_eq!(models.last().unwrap().id, "ollama-local:llama3.2:3b");
        assert!(models.last().unwrap().available);
    }

    #[tokio::test]
    async fn test_one_failing_source_does_not_hide_the_other() {
        let f = fixture(
            ScriptedSource::ok(SourceMode::Cloud, &["gpt-oss:120b"]),
            ScriptedSource::failing(SourceMode::Local),
        );

        let models = f.catalog.list_models().await;
        assert!(models.iter().any(|m| m.id == "ollama-cloud:gpt-oss:120b"));
        assert!(!models.iter().any(|m| m.provider_id == OLLAMA_LOCAL));
    }

    #[tokio::test]
    async fn test_order_static_cloud_local_and_dedup() {
        let f = fixture(
            ScriptedSource::ok(SourceMode::Cloud, &["a", "a"]),
            ScriptedSource::ok(SourceMode::Local, &["llama3.2"]),
        );

        let models = f.catalog.list_models().await;
        let tail: Vec<_> = ids(&models).into_iter().rev().take(2).collect();
        assert_eq!(tail, vec!["ollama-local:llama3.2", "ollama-cloud:a"]);

        let unique: HashSet<_> = models.iter().map(|m| &m.id).collect();
        assert_eq!(unique.len(), models.len());
    }

    #[tokio::test]
    async fn test_availability_follows_credentials() {
        let f = fixture(
            ScriptedSource::ok(SourceMode::Cloud, &["gpt-oss:120b"]),
            ScriptedSource::ok(SourceMode::Local, &[]),
        );

        let models = f.catalog.list_models().await;
        assert!(models.iter().all(|m| !m.available));

        f.credentials.set_api_key("anthropic", "sk-ant").await.unwrap();
        f.credentials.set_api_key(OLLAMA_CLOUD, "sk-cloud").await.unwrap();

        // Cached cloud entries pick up the new key without a refetch.
        let models = f.catalog.list_models().await;
        assert_eq!(f.cloud.calls(), 1);
        for model in &models {
            let expected = model.provider_id == "anthropic" || model.provider_id == OLLAMA_CLOUD;
            assert_eq!(model.available, expected, "{}", model.id);
        }
    }

    #[tokio::test]
    async fn test_refresh_counts_and_refetches() {
        let f = fixture(
            ScriptedSource::ok(SourceMode::Cloud, &["a", "b"]),
            ScriptedSource::ok(SourceMode::Local, &["llama3.2"]),
        );

        f.catalog.list_models().await;
        assert_eq!(f.catalog.refresh_cloud().await, 2);
        assert_eq!(f.catalog.refresh_local().await, 1);
        assert_eq!(f.cloud.calls(), 2);
        assert_eq!(f.local.calls(), 2);
    }

    #[tokio::test]
    async fn test_cloud_key_change_invalidates_cloud_cache() {
        let f = fixture(
            ScriptedSource::ok(SourceMode::Cloud, &["a"]),
            ScriptedSource::ok(SourceMode::Local, &["llama3.2"]),
        );

        f.catalog.list_models().await;
        f.catalog.set_api_key(OLLAMA_CLOUD, "sk-cloud").await.unwrap();
        f.catalog.list_models().await;
        assert_eq!(f.cloud.calls(), 2);
        assert_eq!(f.local.calls(), 1);

        f.catalog.set_api_key("openai", "sk-openai").await.unwrap();
        f.catalog.list_models().await;
        assert_eq!(f.cloud.calls(), 2);
    }

    #[tokio::test]
    async fn test_api_key_status_is_masked() {
        let f = fixture(
            ScriptedSource::ok(SourceMode::Cloud, &[]),
            ScriptedSource::ok(SourceMode::Local, &[]),
        );

        f.catalog
            .set_api_key("openai", "sk-proj-1234567890")
            .await
            .unwrap();
        let status = f.catalog.api_key_status("openai").await.unwrap();
        assert!(status.has_api_key);
        assert_eq!(status.preview.as_deref(), Some("sk-p...7890"));

        f.catalog.delete_api_key("openai").await.unwrap();
        assert!(!f.catalog.api_key_status("openai").await.unwrap().has_api_key);

        assert!(matches!(
            f.catalog.set_api_key("nope", "x").await,
            Err(CatalogError::UnknownProvider(_))
        ));
    }

    #[tokio::test]
    async fn test_providers_report_key_presence() {
        let f = fixture(
            ScriptedSource::ok(SourceMode::Cloud, &[]),
            ScriptedSource::ok(SourceMode::Local, &[]),
        );
        f.credentials.set_api_key("google", "g-key").await.unwrap();

        let providers = f.catalog.providers().await;
        assert_eq!(providers.len(), PROVIDERS.len());
        let google = providers.iter().find(|p| p.id == "google").unwrap();
        assert!(google.has_api_key);
        let local = providers.iter().find(|p| p.id == OLLAMA_LOCAL).unwrap();
        assert!(!local.requires_api_key);
    }

    #[tokio::test]
    async fn test_local_endpoint_roundtrip_invalidates_local_cache() {
        let f = fixture(
            ScriptedSource::ok(SourceMode::Cloud, &[]),
            ScriptedSource::ok(SourceMode::Local, &["llama3.2"]),
        );
        assert_eq!(f.catalog.local_endpoint().await, "http://localhost:11434");

        f.catalog.list_models().await;
        let endpoint = f
            .catalog
            .set_local_endpoint("http://gpu-box:11434/")
            .await
            .unwrap();
        assert_eq!(endpoint, "http://gpu-box:11434");
        f.catalog.list_models().await;
        assert_eq!(f.local.calls(), 2);

        assert!(matches!(
            f.catalog.set_local_endpoint("file:///tmp").await,
            Err(CatalogError::InvalidEndpoint(_))
        ));
        assert_eq!(f.catalog.local_endpoint().await, "http://gpu-box:11434");

        f.catalog.set_local_endpoint("").await.unwrap();
        assert_eq!(f.catalog.local_endpoint().await, "http://localhost:11434");
    }

    #[tokio::test]
    async fn test_default_model_falls_back_to_first_available() {
        let f = fixture(
            ScriptedSource::ok(SourceMode::Cloud, &[]),
            ScriptedSource::ok(SourceMode::Local, &["qwen3:8b"]),
        );

        assert_eq!(
            f.catalog.default_model().await.as_deref(),
            Some("ollama-local:qwen3:8b")
        );

        f.catalog.set_default_model("gpt-5").await.unwrap();
        assert_eq!(f.catalog.default_model().await.as_deref(), Some("gpt-5"));
    }

    #[tokio::test]
    async fn test_connection_check_does_not_touch_cache() {
        let router = Router::new()
            .route(
                "/api/tags",
                get(|| async { Json(json!({ "models": [{ "name": "llama3.2" }, { "name": "gemma2" }] })) }),
            )
            .route("/api/version", get(|| async { Json(json!({ "version": "0.12.3" })) }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let f = fixture(
            ScriptedSource::ok(SourceMode::Cloud, &[]),
            ScriptedSource::ok(SourceMode::Local, &["llama3.2"]),
        );

        let endpoint = format!("http://{addr}");
        let check = f.catalog.test_local_connection(Some(endpoint.as_str())).await;
        assert!(check.success);
        assert_eq!(check.model_count, Some(2));
        assert_eq!(check.version.as_deref(), Some("0.12.3"));
        assert_eq!(f.local.calls(), 0);

        let check = f.catalog.test_local_connection(Some("http://127.0.0.1:1")).await;
        assert!(!check.success);
        assert!(check.error.is_some());

        let check = f.catalog.test_local_connection(Some("gopher://x")).await;
        assert!(!check.success);
    }
}
