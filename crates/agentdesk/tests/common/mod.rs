//! Test utilities and common setup.

use agentdesk::App;
use agentdesk::api;
use agentdesk::config::AppConfig;
use axum_test::TestServer;
use tempfile::TempDir;

/// Nothing listens here, so discovery fails fast with a connection error.
pub const UNREACHABLE: &str = "http://127.0.0.1:1";

pub struct TestContext {
    pub server: TestServer,
    pub app: App,
    pub dir: TempDir,
}

impl TestContext {
    /// Create a directory under the scratch area and return its absolute path.
    pub fn workspace(&self, name: &str) -> String {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(&path).unwrap();
        path.to_string_lossy().into_owned()
    }
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.models.local_endpoint = UNREACHABLE.to_string();
    config.models.cloud_base_url = UNREACHABLE.to_string();
    config.models.local_timeout_ms = 1_000;
    config.models.request_timeout_ms = 1_000;
    config
}

/// In-memory application with threads `t1` and `t2`.
pub async fn test_app() -> TestContext {
    let app = App::in_memory(&test_config()).await.unwrap();
    app.threads.create_thread("t1", Some("first"), None).await.unwrap();
    app.threads.create_thread("t2", Some("second"), None).await.unwrap();

    let server = TestServer::new(api::create_router(app.state())).unwrap();

    TestContext {
        server,
        app,
        dir: TempDir::new().unwrap(),
    }
}
