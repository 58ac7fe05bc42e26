//! Browser origin policy for the local API.
//!
//! The server binds to loopback, but any page open in the user's browser can
//! still reach it. Requests that carry an `Origin` header must name one of the
//! allowed origins; requests without one come from non-browser clients and
//! pass.

use std::sync::Arc;

use agentdesk_files::ErrorBody;
use axum::Json;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use super::state::AppState;
use crate::config::ServerConfig;

#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed: Arc<Vec<HeaderValue>>,
}

impl OriginPolicy {
    /// Configured origins, or the server's own loopback origins when none are
    /// configured. Invalid entries and `*` are dropped.
    pub fn from_config(server: &ServerConfig) -> Self {
        let configured: Vec<String> = if server.allowed_origins.is_empty() {
            vec![
                format!("http://localhost:{}", server.port),
                format!("http://127.0.0.1:{}", server.port),
            ]
        } else {
            server.allowed_origins.clone()
        };

        let allowed: Vec<HeaderValue> = configured
            .iter()
            .map(|origin| origin.trim().trim_end_matches('/'))
            .filter_map(|origin| {
                if origin == "*" {
                    warn!("CORS: Ignoring wildcard origin");
                    return None;
                }
                origin.parse::<HeaderValue>().ok().or_else(|| {
                    warn!("CORS: Invalid origin in config: {}", origin);
                    None
                })
            })
            .collect();

        if allowed.is_empty() {
            warn!("CORS: No valid origins configured, denying all cross-origin requests");
        } else {
            info!("CORS: Allowing {} origin(s)", allowed.len());
        }

        Self {
            allowed: Arc::new(allowed),
        }
    }

    pub fn allows(&self, origin: Option<&HeaderValue>) -> bool {
        match origin {
            Some(origin) => self.allowed.contains(origin),
            None => true,
        }
    }

    pub fn cors_layer(&self) -> CorsLayer {
        let cors = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]);

        if self.allowed.is_empty() {
            // No allow-origin header is ever sent.
            cors
        } else {
            cors.allow_origin(AllowOrigin::list(self.allowed.iter().cloned()))
        }
    }
}

/// Middleware rejecting requests, WebSocket upgrades included, from origins
/// outside the policy.
pub async fn reject_foreign_origin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request.headers().get(header::ORIGIN);
    if state.origins.allows(origin) {
        return next.run(request).await;
    }

    warn!(
        "Rejected {} {} from origin {:?}",
        request.method(),
        request.uri().path(),
        origin
    );
    (
        StatusCode::FORBIDDEN,
        Json(ErrorBody {
            error: "Origin not allowed".to_string(),
            code: "ORIGIN_NOT_ALLOWED",
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(origins: &[&str]) -> ServerConfig {
        ServerConfig {
            allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_defaults_to_own_loopback_origins() {
        let policy = OriginPolicy::from_config(&server(&[]));

        assert!(policy.allows(Some(&HeaderValue::from_static("http://localhost:4317"))));
        assert!(policy.allows(Some(&HeaderValue::from_static("http://127.0.0.1:4317"))));
        assert!(!policy.allows(Some(&HeaderValue::from_static("http://localhost:3000"))));
        assert!(!policy.allows(Some(&HeaderValue::from_static("https://evil.example"))));
        assert!(policy.allows(None));
    }

    #[test]
    fn test_configured_origins_replace_defaults() {
        let policy = OriginPolicy::from_config(&server(&["tauri://localhost/", "*"]));

        assert!(policy.allows(Some(&HeaderValue::from_static("tauri://localhost"))));
        assert!(!policy.allows(Some(&HeaderValue::from_static("http://localhost:4317"))));
        assert!(!policy.allows(Some(&HeaderValue::from_static("https://evil.example"))));
    }

    #[test]
    fn test_invalid_origins_deny_everything() {
        let policy = OriginPolicy::from_config(&server(&["bad\norigin"]));
        assert!(!policy.allows(Some(&HeaderValue::from_static("http://localhost:4317"))));
        assert!(policy.allows(None));
    }
}
