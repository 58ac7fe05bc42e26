//! HTTP request handlers.

use agentdesk_files::{BinaryFile, Outcome, TextFile};
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use super::state::AppState;
use crate::commands::{
    DefaultModel, LocalEndpoint, ModelList, ProviderList, RefreshCount, WorkspacePath,
    WorkspaceSelection,
};
use crate::models::{ApiKeyStatus, ConnectionCheck};
use crate::workspace::SnapshotResult;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadQuery {
    pub thread_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileQuery {
    pub thread_id: Option<String>,
    pub path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDefaultModelRequest {
    pub model_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetApiKeyRequest {
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct SetEndpointRequest {
    pub endpoint: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TestConnectionRequest {
    pub endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetWorkspaceRequest {
    pub thread_id: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /models
pub async fn list_models(State(state): State<AppState>) -> Json<Outcome<ModelList>> {
    Json(state.commands.list_models().await)
}

/// POST /models/refresh/cloud
pub async fn refresh_cloud_models(State(state): State<AppState>) -> Json<Outcome<RefreshCount>> {
    Json(state.commands.refresh_cloud_models().await)
}

/// POST /models/refresh/local
pub async fn refresh_local_models(State(state): State<AppState>) -> Json<Outcome<RefreshCount>> {
    Json(state.commands.refresh_local_models().await)
}

/// GET /models/default
pub async fn get_default_model(State(state): State<AppState>) -> Json<Outcome<DefaultModel>> {
    Json(state.commands.get_default_model().await)
}

/// PUT /models/default
pub async fn set_default_model(
    State(state): State<AppState>,
    Json(request): Json<SetDefaultModelRequest>,
) -> Json<Outcome<DefaultModel>> {
    Json(state.commands.set_default_model(&request.model_id).await)
}

/// GET /providers
pub async fn list_providers(State(state): State<AppState>) -> Json<Outcome<ProviderList>> {
    Json(state.commands.list_providers().await)
}

/// GET /providers/{provider_id}/key
pub async fn get_api_key(
    State(state): State<AppState>,
    Path(provider_id): Path<String>,
) -> Json<Outcome<ApiKeyStatus>> {
    Json(state.commands.get_api_key(&provider_id).await)
}

/// PUT /providers/{provider_id}/key
pub async fn set_api_key(
    State(state): State<AppState>,
    Path(provider_id): Path<String>,
    Json(request): Json<SetApiKeyRequest>,
) -> Json<Outcome<ApiKeyStatus>> {
    Json(
        state
            .commands
            .set_api_key(&provider_id, &request.api_key)
            .await,
    )
}

/// DELETE /providers/{provider_id}/key
pub async fn delete_api_key(
    State(state): State<AppState>,
    Path(provider_id): Path<String>,
) -> Json<Outcome<ApiKeyStatus>> {
    Json(state.commands.delete_api_key(&provider_id).await)
}

/// GET /local/endpoint
pub async fn get_local_endpoint(State(state): State<AppState>) -> Json<Outcome<LocalEndpoint>> {
    Json(state.commands.get_local_endpoint().await)
}

/// PUT /local/endpoint
pub async fn set_local_endpoint(
    State(state): State<AppState>,
    Json(request): Json<SetEndpointRequest>,
) -> Json<Outcome<LocalEndpoint>> {
    Json(state.commands.set_local_endpoint(&request.endpoint).await)
}

/// POST /local/test
///
/// Body is optional; without an endpoint the configured one is checked.
pub async fn test_local_connection(
    State(state): State<AppState>,
    request: Option<Json<TestConnectionRequest>>,
) -> Json<ConnectionCheck> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    Json(
        state
            .commands
            .test_local_connection(request.endpoint.as_deref())
            .await,
    )
}

/// GET /workspace?threadId=
pub async fn get_workspace(
    State(state): State<AppState>,
    Query(query): Query<ThreadQuery>,
) -> Json<Outcome<WorkspacePath>> {
    Json(state.commands.get_workspace(query.thread_id.as_deref()).await)
}

/// PUT /workspace
pub async fn set_workspace(
    State(state): State<AppState>,
    Json(request): Json<SetWorkspaceRequest>,
) -> Json<Outcome<WorkspacePath>> {
    Json(
        state
            .commands
            .set_workspace(request.thread_id.as_deref(), request.path.as_deref())
            .await,
    )
}

/// POST /workspace/select?threadId=
pub async fn select_workspace(
    State(state): State<AppState>,
    Query(query): Query<ThreadQuery>,
) -> Json<Outcome<WorkspaceSelection>> {
    Json(
        state
            .commands
            .select_workspace(query.thread_id.as_deref())
            .await,
    )
}

/// GET /workspace/snapshot?threadId=
pub async fn load_snapshot(
    State(state): State<AppState>,
    Query(query): Query<ThreadQuery>,
) -> Json<SnapshotResult> {
    Json(state.commands.load_snapshot(query.thread_id.as_deref()).await)
}

/// GET /workspace/file?threadId=&path=
pub async fn read_text_file(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> Json<Outcome<TextFile>> {
    Json(
        state
            .commands
            .read_text_file(query.thread_id.as_deref(), &query.path)
            .await,
    )
}

/// GET /workspace/file/binary?threadId=&path=
pub async fn read_binary_file(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> Json<Outcome<BinaryFile>> {
    Json(
        state
            .commands
            .read_binary_file(query.thread_id.as_deref(), &query.path)
            .await,
    )
}
