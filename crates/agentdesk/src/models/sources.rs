//! Dynamic model discovery against Ollama endpoints.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::error::{CatalogError, CatalogResult};
use super::format::{cloud_display_name, is_cloud_tag, local_display_name, supports_tool_calling};
use super::providers::{OLLAMA_CLOUD, OLLAMA_LOCAL};
use super::types::{ModelDescriptor, SourceMode};
use crate::stores::{CredentialStore, SettingsStore};

/// Settings key holding the user's local Ollama endpoint.
pub const LOCAL_ENDPOINT_KEY: &str = "ollamaEndpoint";

/// A dynamic model source. Implementations report failures as errors; the
/// cache layer turns them into empty results.
#[async_trait]
pub trait ModelSource: Send + Sync {
    fn mode(&self) -> SourceMode;

    async fn discover(&self) -> CatalogResult<Vec<ModelDescriptor>>;
}

/// `/api/tags` response from an Ollama server.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TagsResponse {
    #[serde(default)]
    pub models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagEntry {
    pub name: String,
    #[serde(default)]
    pub details: Option<TagDetails>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TagDetails {
    #[serde(default)]
    pub parameter_size: Option<String>,
    #[serde(default)]
    pub quantization_level: Option<String>,
}

/// Validate an `http(s)` endpoint and drop trailing slashes.
pub fn normalize_endpoint(endpoint: &str) -> CatalogResult<String> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    let url = reqwest::Url::parse(trimmed)
        .map_err(|e| CatalogError::InvalidEndpoint(format!("{trimmed}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CatalogError::InvalidEndpoint(format!(
            "{trimmed}: only http and https are supported"
        )));
    }
    Ok(trimmed.to_string())
}

/// Endpoint stored in settings, or `default` when none is set.
pub(crate) async fn local_endpoint(settings: &dyn SettingsStore, default: &str) -> String {
    settings
        .get_string(LOCAL_ENDPOINT_KEY)
        .await
        .map(|e| e.trim().trim_end_matches('/').to_string())
        .unwrap_or_else(|| default.trim_end_matches('/').to_string())
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder, url: &str) -> CatalogResult<T> {
    let response = request
        .send()
        .await
        .map_err(|e| CatalogError::request(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CatalogError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| CatalogError::Parse(format!("{url}: {e}")))
}

/// Saturates instead of truncating.
pub(crate) fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// GET `{endpoint}/api/tags`, abandoned after `timeout`.
pub(crate) async fn fetch_tags(
    client: &Client,
    endpoint: &str,
    timeout: Duration,
) -> CatalogResult<TagsResponse> {
    let url = format!("{endpoint}/api/tags");
    let outcome = tokio::time::timeout(timeout, send_json(client.get(&url), &url)).await;
    match outcome {
        Ok(result) => result,
        Err(_) => Err(CatalogError::Timeout {
            url,
            timeout_ms: whole_millis(timeout),
        }),
    }
}

/// Server version from `{endpoint}/api/version`, if the server reports one.
pub(crate) async fn fetch_version(client: &Client, endpoint: &str, timeout: Duration) -> Option<String> {
    #[derive(Deserialize)]
    struct VersionResponse {
        version: String,
    }

    let url = format!("{endpoint}/api/version");
    let request = send_json::<VersionResponse>(client.get(&url), &url);
    match tokio::time::timeout(timeout, request).await {
        Ok(Ok(body)) => Some(body.version),
        _ => None,
    }
}

/// Models served by the user's local Ollama instance.
pub struct OllamaLocalSource {
    settings: Arc<dyn SettingsStore>,
    client: Client,
    default_endpoint: String,
    timeout: Duration,
}

impl OllamaLocalSource {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        client: Client,
        default_endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            settings,
            client,
            default_endpoint: default_endpoint.into(),
            timeout,
        }
    }

    pub async fn endpoint(&self) -> String {
        local_endpoint(self.settings.as_ref(), &self.default_endpoint).await
    }
}

#[async_trait]
impl ModelSource for OllamaLocalSource {
    fn mode(&self) -> SourceMode {
        SourceMode::Local
    }

    async fn discover(&self) -> CatalogResult<Vec<ModelDescriptor>> {
        let endpoint = self.endpoint().await;
        debug!("Discovering local models at {}", endpoint);
        let tags = fetch_tags(&self.client, &endpoint, self.timeout).await?;
        Ok(local_models(tags))
    }
}

/// Drop cloud-routed tags and models without tool calling support.
pub(crate) fn local_models(tags: TagsResponse) -> Vec<ModelDescriptor> {
    let mut filtered = Vec::new();
    let mut seen = HashSet::new();
    let mut models = Vec::new();

    for tag in tags.models {
        if is_cloud_tag(&tag.name) {
            continue;
        }
        if !supports_tool_calling(&tag.name) {
            filtered.push(tag.name);
            continue;
        }
        if seen.insert(tag.name.clone()) {
            models.push(local_descriptor(&tag));
        }
    }

    if !filtered.is_empty() {
        info!(
            filtered = filtered.len(),
            "Skipping {} local models without tool calling support: {}",
            filtered.len(),
            filtered.join(", ")
        );
    }

    models
}

fn local_descriptor(tag: &TagEntry) -> ModelDescriptor {
    let details: Vec<&str> = tag
        .details
        .iter()
        .flat_map(|d| [d.parameter_size.as_deref(), d.quantization_level.as_deref()])
        .flatten()
        .filter(|s| !s.is_empty())
        .collect();

    let description = if details.is_empty() {
        "Local Ollama model".to_string()
    } else {
        format!("Local Ollama model ({})", details.join(", "))
    };

    ModelDescriptor {
        id: format!("{OLLAMA_LOCAL}:{}", tag.name),
        display_name: local_display_name(&tag.name),
        provider_id: OLLAMA_LOCAL.to_string(),
        model_identifier: tag.name.clone(),
        description,
        available: true,
        source_mode: Some(SourceMode::Local),
    }
}

/// Models hosted on Ollama Cloud. Needs the `ollama-cloud` API key.
pub struct OllamaCloudSource {
    credentials: Arc<dyn CredentialStore>,
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl OllamaCloudSource {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        client: Client,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            credentials,
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    async fn fetch(&self, url: &str, api_key: &str) -> CatalogResult<Value> {
        let request = self
            .client
            .get(url)
            .bearer_auth(api_key)
            .timeout(self.timeout);
        send_json(request, url).await
    }
}

#[async_trait]
impl ModelSource for OllamaCloudSource {
    fn mode(&self) -> SourceMode {
        SourceMode::Cloud
    }

    async fn discover(&self) -> CatalogResult<Vec<ModelDescriptor>> {
        let Some(api_key) = self.credentials.get_api_key(OLLAMA_CLOUD).await else {
            debug!("No Ollama Cloud API key, skipping cloud discovery");
            return Ok(Vec::new());
        };

        let primary = format!("{}/v1/models", self.base_url);
        let body = match self.fetch(&primary, &api_key).await {
            Err(CatalogError::Status { status, .. }) => {
                let fallback = format!("{}/api/tags", self.base_url);
                debug!("{} returned {}, trying {}", primary, status, fallback);
                self.fetch(&fallback, &api_key).await?
            }
            other => other?,
        };

        let mut seen = HashSet::new();
        let models: Vec<ModelDescriptor> = parse_cloud_models(&body)?
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .map(|name| cloud_descriptor(&name))
            .collect();

        debug!("Discovered {} cloud models", models.len());
        Ok(models)
    }
}

/// Model names from `{data:[..]}`, `{models:[..]}` or a bare array.
pub(crate) fn parse_cloud_models(body: &Value) -> CatalogResult<Vec<String>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("data").or_else(|| map.get("models")) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(CatalogError::Parse(
                    "expected a `data` or `models` array".to_string(),
                ));
            }
        },
        _ => {
            return Err(CatalogError::Parse(
                "expected a JSON object or array".to_string(),
            ));
        }
    };

    Ok(items.iter().filter_map(cloud_model_name).collect())
}

fn cloud_model_name(item: &Value) -> Option<String> {
    let name = match item {
        Value::String(name) => Some(name.as_str()),
        Value::Object(map) => ["id", "name", "model"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str)),
        _ => None,
    }?;

    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn cloud_descriptor(name: &str) -> ModelDescriptor {
    ModelDescriptor {
        id: format!("{OLLAMA_CLOUD}:{name}"),
        display_name: cloud_display_name(name),
        provider_id: OLLAMA_CLOUD.to_string(),
        model_identifier: name.to_string(),
        description: "Hosted on Ollama Cloud".to_string(),
        available: false,
        source_mode: Some(SourceMode::Cloud),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{FileCredentialStore, JsonSettingsStore};
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn tags_body() -> Value {
        json!({
            "models": [
                { "name": "llama3.2:3b", "details": { "parameter_size": "3.2B", "quantization_level": "Q4_K_M" } },
                { "name": "gemma2:9b" },
                { "name": "gpt-oss:120b:cloud" },
                { "name": "qwen2.5-coder:7b" }
            ]
        })
    }

    fn local_source(endpoint: &str, timeout: Duration) -> OllamaLocalSource {
        OllamaLocalSource::new(
            Arc::new(JsonSettingsStore::in_memory()),
            Client::new(),
            endpoint,
            timeout,
        )
    }

    #[tokio::test]
    async fn test_local_discovery_filters_models() {
        let endpoint = serve(Router::new().route("/api/tags", get(|| async { Json(tags_body()) }))).await;

        let models = local_source(&endpoint, Duration::from_secs(5))
            .discover()
            .await
            .unwrap();

        let ids: Vec<_> = models.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["ollama-local:llama3.2:3b", "ollama-local:qwen2.5-coder:7b"]);
        assert!(models.iter().all(|m| m.source_mode == Some(SourceMode::Local)));
        assert_eq!(models[0].display_name, "Llama3 2 (3B)");
        assert_eq!(models[0].description, "Local Ollama model (3.2B, Q4_K_M)");
    }

    #[tokio::test]
    async fn test_local_endpoint_from_settings() {
        let endpoint = serve(Router::new().route("/api/tags", get(|| async { Json(tags_body()) }))).await;

        let settings = Arc::new(JsonSettingsStore::in_memory());
        settings
            .set(LOCAL_ENDPOINT_KEY, json!(format!("{endpoint}/")))
            .await
            .unwrap();

        let source = OllamaLocalSource::new(
            settings,
            Client::new(),
            "http://127.0.0.1:1",
            Duration::from_secs(5),
        );
        assert_eq!(source.endpoint().await, endpoint);
        assert_eq!(source.discover().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_local_timeout_is_error() {
        let endpoint = serve(Router::new().route(
            "/api/tags",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(tags_body())
            }),
        ))
        .await;

        let result = local_source(&endpoint, Duration::from_millis(100)).discover().await;
        assert!(matches!(result, Err(CatalogError::Timeout { timeout_ms: 100, .. })));
    }

    #[tokio::test]
    async fn test_local_unreachable_is_request_error() {
        let result = local_source("http://127.0.0.1:1", Duration::from_secs(5))
            .discover()
            .await;
        assert!(matches!(result, Err(CatalogError::Request { .. })));
    }

    #[derive(Clone, Default)]
    struct Hits {
        primary: Arc<AtomicUsize>,
        fallback: Arc<AtomicUsize>,
    }

    fn bearer(headers: &HeaderMap) -> Option<&str> {
        headers.get("authorization")?.to_str().ok()
    }

    async fn cloud_source(base_url: &str, api_key: Option<&str>) -> OllamaCloudSource {
        let credentials = FileCredentialStore::in_memory();
        if let Some(key) = api_key {
            credentials.set_api_key(OLLAMA_CLOUD, key).await.unwrap();
        }
        OllamaCloudSource::new(
            Arc::new(credentials),
            Client::new(),
            base_url,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_cloud_without_key_skips_network() {
        let hits = Hits::default();
        let router = Router::new()
            .route(
                "/v1/models",
                get(|State(hits): State<Hits>| async move {
                    hits.primary.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "data": [] }))
                }),
            )
            .with_state(hits.clone());
        let base = serve(router).await;

        let models = cloud_source(&base, None).await.discover().await.unwrap();
        assert!(models.is_empty());
        assert_eq!(hits.primary.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cloud_primary_endpoint() {
        let router = Router::new().route(
            "/v1/models",
            get(|headers: HeaderMap| async move {
                if bearer(&headers) != Some("Bearer sk-cloud") {
                    return Err(StatusCode::UNAUTHORIZED);
                }
                Ok(Json(json!({
                    "data": [{ "id": "gpt-oss:120b" }, { "id": "qwen3-coder:480b" }, { "id": "gpt-oss:120b" }]
                })))
            }),
        );
        let base = serve(router).await;

        let models = cloud_source(&base, Some("sk-cloud")).await.discover().await.unwrap();
        let ids: Vec<_> = models.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["ollama-cloud:gpt-oss:120b", "ollama-cloud:qwen3-coder:480b"]);
        assert_eq!(models[0].display_name, "Gpt Oss 120b");
        assert_eq!(models[0].source_mode, Some(SourceMode::Cloud));
    }

    #[tokio::test]
    async fn test_cloud_falls_back_on_status() {
        let hits = Hits::default();
        let router = Router::new()
            .route(
                "/v1/models",
                get(|State(hits): State<Hits>| async move {
                    hits.primary.fetch_add(1, Ordering::SeqCst);
                    StatusCode::NOT_FOUND
                }),
            )
            .route(
                "/api/tags",
                get(|State(hits): State<Hits>| async move {
                    hits.fallback.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "models": [{ "name": "deepseek-v3.1:671b" }] }))
                }),
            )
            .with_state(hits.clone());
        let base = serve(router).await;

        let models = cloud_source(&base, Some("sk-cloud")).await.discover().await.unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].model_identifier, "deepseek-v3.1:671b");
        assert_eq!(hits.primary.load(Ordering::SeqCst), 1);
        assert_eq!(hits.fallback.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cloud_fallback_failure_is_error() {
        let router = Router::new()
            .route("/v1/models", get(|| async { StatusCode::NOT_FOUND }))
            .route("/api/tags", get(|| async { StatusCode::BAD_GATEWAY }));
        let base = serve(router).await;

        let result = cloud_source(&base, Some("sk-cloud")).await.discover().await;
        assert!(matches!(result, Err(CatalogError::Status { status: 502, .. })));
    }

    #[test]
    fn test_parse_cloud_shapes() {
        assert_eq!(
            parse_cloud_models(&json!(["kimi-k2", { "model": "glm-4.6" }, 42, ""])).unwrap(),
            vec!["kimi-k2", "glm-4.6"]
        );
        assert_eq!(
            parse_cloud_models(&json!({ "models": [{ "name": "a" }] })).unwrap(),
            vec!["a"]
        );
        assert_eq!(
            parse_cloud_models(&json!({ "data": [{ "id": "b", "name": "ignored" }] })).unwrap(),
            vec!["b"]
        );
        assert!(parse_cloud_models(&json!({ "items": [] })).is_err());
        assert!(parse_cloud_models(&json!("nope")).is_err());
    }

    #[test]
    fn test_whole_millis_saturates() {
        assert_eq!(whole_millis(Duration::from_millis(5_000)), 5_000);
        assert_eq!(whole_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(
            normalize_endpoint(" http://localhost:11434/ ").unwrap(),
            "http://localhost:11434"
        );
        assert!(normalize_endpoint("ftp://host").is_err());
        assert!(normalize_endpoint("not a url").is_err());
    }
}
