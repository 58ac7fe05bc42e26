//! Model catalog.
//!
//! A static provider/model table merged with two dynamic Ollama sources
//! (cloud and local), each behind its own TTL cache and each failing on its
//! own without affecting the rest of the catalog.

mod cache;
mod catalog;
mod error;
mod format;
mod providers;
mod sources;
mod types;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use cache::{CachedSource, DiscoveryCache};
pub use catalog::{DEFAULT_MODEL_KEY, ModelCatalog};
pub use error::{CatalogError, CatalogResult};
pub use format::{
    TOOL_CALLING_FAMILIES, cloud_display_name, local_display_name, supports_tool_calling,
};
pub use providers::{OLLAMA_CLOUD, OLLAMA_LOCAL, PROVIDERS, Provider, static_models};
pub use sources::{LOCAL_ENDPOINT_KEY, ModelSource, OllamaCloudSource, OllamaLocalSource};
pub use types::{ApiKeyStatus, ConnectionCheck, ModelDescriptor, ProviderStatus, SourceMode};

/// Model discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// How long a non-empty discovery result stays fresh (in milliseconds)
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// Local Ollama endpoint used when the user has not set one
    #[serde(default = "default_local_endpoint")]
    pub local_endpoint: String,

    /// Local discovery timeout (in milliseconds)
    #[serde(default = "default_local_timeout_ms")]
    pub local_timeout_ms: u64,

    /// Ollama Cloud base URL
    #[serde(default = "default_cloud_base_url")]
    pub cloud_base_url: String,

    /// Cloud request timeout (in milliseconds)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_cache_ttl_ms() -> u64 {
    300_000
}

fn default_local_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_local_timeout_ms() -> u64 {
    5_000
}

fn default_cloud_base_url() -> String {
    "https://ollama.com".to_string()
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: default_cache_ttl_ms(),
            local_endpoint: default_local_endpoint(),
            local_timeout_ms: default_local_timeout_ms(),
            cloud_base_url: default_cloud_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ModelsConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn local_timeout(&self) -> Duration {
        Duration::from_millis(self.local_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
