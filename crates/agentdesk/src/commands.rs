//! Operation surface for the UI layer.
//!
//! One method per capability. Every method returns a plain serializable
//! value carrying `success` plus either the payload or `error`/`code`;
//! nothing here returns `Err`.

use std::path::PathBuf;
use std::sync::Arc;

use agentdesk_files::{BinaryFile, Outcome, TextFile};
use serde::Serialize;

use crate::models::{
    ApiKeyStatus, CatalogResult, ConnectionCheck, ModelCatalog, ModelDescriptor, ProviderStatus,
};
use crate::workspace::{SnapshotResult, WorkspaceBinding};

#[derive(Debug, Clone, Serialize)]
pub struct ModelList {
    pub models: Vec<ModelDescriptor>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultModel {
    pub model_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderList {
    pub providers: Vec<ProviderStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshCount {
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocalEndpoint {
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspacePath {
    pub workspace_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSelection {
    pub canceled: bool,
    pub workspace_path: Option<String>,
}

fn catalog_outcome<T>(result: CatalogResult<T>) -> Outcome<T> {
    match result {
        Ok(data) => Outcome::ok(data),
        Err(err) => Outcome::fail(err.body()),
    }
}

fn path_string(path: Option<PathBuf>) -> Option<String> {
    path.map(|p| p.to_string_lossy().into_owned())
}

/// Shared handle over the catalog and the workspace binding.
#[derive(Clone)]
pub struct Commands {
    catalog: Arc<ModelCatalog>,
    workspace: Arc<WorkspaceBinding>,
}

impl Commands {
    pub fn new(catalog: Arc<ModelCatalog>, workspace: Arc<WorkspaceBinding>) -> Self {
        Self { catalog, workspace }
    }

    pub fn workspace(&self) -> &WorkspaceBinding {
        &self.workspace
    }

    // Models

    pub async fn list_models(&self) -> Outcome<ModelList> {
        Outcome::ok(ModelList {
            models: self.catalog.list_models().await,
        })
    }

    pub async fn get_default_model(&self) -> Outcome<DefaultModel> {
        Outcome::ok(DefaultModel {
            model_id: self.catalog.default_model().await,
        })
    }

    pub async fn set_default_model(&self, model_id: &str) -> Outcome<DefaultModel> {
        catalog_outcome(
            self.catalog
                .set_default_model(model_id)
                .await
                .map(|id| DefaultModel {
                    model_id: (!id.is_empty()).then_some(id),
                }),
        )
    }

    pub async fn set_api_key(&self, provider_id: &str, api_key: &str) -> Outcome<ApiKeyStatus> {
        let result = match self.catalog.set_api_key(provider_id, api_key).await {
            Ok(()) => self.catalog.api_key_status(provider_id).await,
            Err(err) => Err(err),
        };
        catalog_outcome(result)
    }

    pub async fn get_api_key(&self, provider_id: &str) -> Outcome<ApiKeyStatus> {
        catalog_outcome(self.catalog.api_key_status(provider_id).await)
    }

    pub async fn delete_api_key(&self, provider_id: &str) -> Outcome<ApiKeyStatus> {
        let result = match self.catalog.delete_api_key(provider_id).await {
            Ok(()) => self.catalog.api_key_status(provider_id).await,
            Err(err) => Err(err),
        };
        catalog_outcome(result)
    }

    pub async fn list_providers(&self) -> Outcome<ProviderList> {
        Outcome::ok(ProviderList {
            providers: self.catalog.providers().await,
        })
    }

    pub async fn refresh_cloud_models(&self) -> Outcome<RefreshCount> {
        Outcome::ok(RefreshCount {
            count: self.catalog.refresh_cloud().await,
        })
    }

    pub async fn refresh_local_models(&self) -> Outcome<RefreshCount> {
        Outcome::ok(RefreshCount {
            count: self.catalog.refresh_local().await,
        })
    }

    pub async fn test_local_connection(&self, endpoint: Option<&str>) -> ConnectionCheck {
        self.catalog.test_local_connection(endpoint).await
    }

    pub async fn get_local_endpoint(&self) -> Outcome<LocalEndpoint> {
        Outcome::ok(LocalEndpoint {
            endpoint: self.catalog.local_endpoint().await,
        })
    }

    pub async fn set_local_endpoint(&self, endpoint: &str) -> Outcome<LocalEndpoint> {
        catalog_outcome(
            self.catalog
                .set_local_endpoint(endpoint)
                .await
                .map(|endpoint| LocalEndpoint { endpoint }),
        )
    }

    // Workspace

    pub async fn get_workspace(&self, thread_id: Option<&str>) -> Outcome<WorkspacePath> {
        self.workspace
            .get(thread_id)
            .await
            .map(|path| WorkspacePath {
                workspace_path: path_string(path),
            })
            .into()
    }

    pub async fn set_workspace(
        &self,
        thread_id: Option<&str>,
        path: Option<&str>,
    ) -> Outcome<WorkspacePath> {
        self.workspace
            .set(thread_id, path)
            .await
            .map(|path| WorkspacePath {
                workspace_path: path_string(path),
            })
            .into()
    }

    pub async fn select_workspace(&self, thread_id: Option<&str>) -> Outcome<WorkspaceSelection> {
        self.workspace
            .select_via_dialog(thread_id)
            .await
            .map(|path| WorkspaceSelection {
                canceled: path.is_none(),
                workspace_path: path_string(path),
            })
            .into()
    }

    pub async fn load_snapshot(&self, thread_id: Option<&str>) -> SnapshotResult {
        self.workspace.load_snapshot(thread_id).await
    }

    pub async fn read_text_file(&self, thread_id: Option<&str>, path: &str) -> Outcome<TextFile> {
        self.workspace.read_text(thread_id, path).await.into()
    }

    pub async fn read_binary_file(
        &self,
        thread_id: Option<&str>,
        path: &str,
    ) -> Outcome<BinaryFile> {
        self.workspace.read_binary(thread_id, path).await.into()
    }
}
