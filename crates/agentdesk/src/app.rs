//! Wiring: stores, catalog, workspace binding and the command surface.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{info, warn};

use crate::api::{AppState, OriginPolicy};
use crate::commands::Commands;
use crate::config::{APP_NAME, AppConfig, AppPaths, PickerConfig, ServerConfig};
use crate::db::Database;
use crate::models::ModelCatalog;
use crate::stores::{
    CommandPicker, CredentialStore, DirectoryPicker, FileCredentialStore, JsonSettingsStore,
    SettingsStore, SqliteThreadStore, UnavailablePicker,
};
use crate::workspace::WorkspaceBinding;

/// Everything a running agentdesk process owns.
pub struct App {
    pub database: Database,
    pub threads: Arc<SqliteThreadStore>,
    pub catalog: Arc<ModelCatalog>,
    pub workspace: Arc<WorkspaceBinding>,
    pub commands: Commands,
    server: ServerConfig,
}

impl App {
    /// Open the on-disk stores under `paths.data_dir`.
    pub async fn open(config: &AppConfig, paths: &AppPaths) -> Result<Self> {
        let db_path = paths.database_path();
        info!("Database path: {}", db_path.display());
        let database = Database::new(&db_path).await?;

        let settings = Arc::new(
            JsonSettingsStore::open(&paths.settings_path()).context("opening settings store")?,
        );
        let credentials = Arc::new(
            FileCredentialStore::open(&paths.credentials_path())
                .context("opening credential store")?,
        );

        Self::from_parts(
            config,
            database,
            settings,
            credentials,
            picker_from_config(&config.picker),
        )
    }

    /// In-memory stores and no picker.
    pub async fn in_memory(config: &AppConfig) -> Result<Self> {
        Self::from_parts(
            config,
            Database::in_memory().await?,
            Arc::new(JsonSettingsStore::in_memory()),
            Arc::new(FileCredentialStore::in_memory()),
            Arc::new(UnavailablePicker),
        )
    }

    pub fn from_parts(
        config: &AppConfig,
        database: Database,
        settings: Arc<dyn SettingsStore>,
        credentials: Arc<dyn CredentialStore>,
        picker: Arc<dyn DirectoryPicker>,
    ) -> Result<Self> {
        let client = http_client()?;
        let threads = Arc::new(SqliteThreadStore::new(database.pool().clone()));

        let catalog = Arc::new(ModelCatalog::new(
            config.models.clone(),
            client,
            credentials,
            settings.clone(),
        ));
        let workspace = Arc::new(WorkspaceBinding::new(
            threads.clone(),
            settings,
            picker,
            config.files.clone(),
        ));
        let commands = Commands::new(catalog.clone(), workspace.clone());

        Ok(Self {
            database,
            threads,
            catalog,
            workspace,
            commands,
            server: config.server.clone(),
        })
    }

    pub fn state(&self) -> AppState {
        AppState::new(
            self.commands.clone(),
            OriginPolicy::from_config(&self.server),
        )
    }

    /// Stop every workspace watch.
    pub fn shutdown(&self) {
        self.workspace.shutdown();
    }
}

fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(format!("{APP_NAME}/{}", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(5))
        .build()
        .context("building HTTP client")
}

fn picker_from_config(config: &PickerConfig) -> Arc<dyn DirectoryPicker> {
    match CommandPicker::from_command_line(&config.command) {
        Some(picker) => Arc::new(picker),
        None => {
            warn!("No directory picker configured, workspace selection dialogs are disabled");
            Arc::new(UnavailablePicker)
        }
    }
}
