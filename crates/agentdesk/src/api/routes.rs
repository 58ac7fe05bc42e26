//! API route definitions.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers;
use super::origins::reject_foreign_origin;
use super::state::AppState;
use super::ws;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    let cors = state.origins.cors_layer();

    Router::new()
        .route("/health", get(handlers::health))
        // Models
        .route("/models", get(handlers::list_models))
        .route("/models/refresh/cloud", post(handlers::refresh_cloud_models))
        .route("/models/refresh/local", post(handlers::refresh_local_models))
        .route(
            "/models/default",
            get(handlers::get_default_model).put(handlers::set_default_model),
        )
        .route("/providers", get(handlers::list_providers))
        .route(
            "/providers/{provider_id}/key",
            get(handlers::get_api_key)
                .put(handlers::set_api_key)
                .delete(handlers::delete_api_key),
        )
        .route(
            "/local/endpoint",
            get(handlers::get_local_endpoint).put(handlers::set_local_endpoint),
        )
        .route("/local/test", post(handlers::test_local_connection))
        // Workspace
        .route(
            "/workspace",
            get(handlers::get_workspace).put(handlers::set_workspace),
        )
        .route("/workspace/select", post(handlers::select_workspace))
        .route("/workspace/snapshot", get(handlers::load_snapshot))
        .route("/workspace/file", get(handlers::read_text_file))
        .route("/workspace/file/binary", get(handlers::read_binary_file))
        .route("/ws/events", get(ws::events_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            reject_foreign_origin,
        ))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(trace_layer).layer(cors))
}
