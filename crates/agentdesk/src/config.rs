//! Configuration loading.
//!
//! Layers, lowest to highest: built-in defaults, the TOML config file,
//! `AGENTDESK__SECTION__KEY` environment variables.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use agentdesk_files::FilesConfig;
use anyhow::{Context, Result, anyhow};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::models::ModelsConfig;

pub const APP_NAME: &str = "agentdesk";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub files: FilesConfig,
    pub models: ModelsConfig,
    pub picker: PickerConfig,
}

/// Local IPC server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed to call the API. Empty means the server's own
    /// `http://localhost:{port}` and `http://127.0.0.1:{port}`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4317,
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Overrides the XDG data directory. `~` and `$VARS` are expanded.
    pub data_dir: Option<String>,
}

/// External directory picker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Program and arguments; the chosen directory is read from stdout.
    /// Empty disables the picker.
    pub command: Vec<String>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            command: default_picker_command(),
        }
    }
}

fn default_picker_command() -> Vec<String> {
    let command: &[&str] = if cfg!(target_os = "macos") {
        &["osascript", "-e", "POSIX path of (choose folder)"]
    } else if cfg!(target_os = "linux") {
        &["zenity", "--file-selection", "--directory"]
    } else {
        &[]
    };
    command.iter().map(|s| s.to_string()).collect()
}

/// Resolved on-disk locations.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    pub fn discover(override_path: Option<PathBuf>) -> Result<Self> {
        let config_file = match override_path {
            Some(path) => {
                let expanded = expand_path(path)?;
                if expanded.is_dir() {
                    expanded.join("config.toml")
                } else {
                    expanded
                }
            }
            None => default_config_dir()?.join("config.toml"),
        };

        if config_file.parent().is_none() {
            return Err(anyhow!("invalid config file path: {config_file:?}"));
        }

        Ok(Self {
            config_file,
            data_dir: default_data_dir()?,
        })
    }

    pub fn apply_overrides(mut self, cfg: &AppConfig) -> Result<Self> {
        if let Some(ref data_override) = cfg.paths.data_dir {
            self.data_dir = expand_str_path(data_override)?;
        }
        Ok(self)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("agentdesk.db")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir.join("credentials.json")
    }
}

impl fmt::Display for AppPaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "config: {}, data: {}",
            self.config_file.display(),
            self.data_dir.display()
        )
    }
}

/// Load the layered configuration. A missing file is not an error.
pub fn load_config(config_file: &Path) -> Result<AppConfig> {
    let built = Config::builder()
        .add_source(
            File::from(config_file)
                .format(FileFormat::Toml)
                .required(false),
        )
        .add_source(Environment::with_prefix(env_prefix().as_str()).separator("__"))
        .build()
        .with_context(|| format!("loading config from {}", config_file.display()))?;

    built
        .try_deserialize()
        .context("deserializing configuration")
}

pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {parent:?}"))?;
    }

    let config = AppConfig::default();
    let toml = toml::to_string_pretty(&config).context("serializing default config to TOML")?;
    let mut body = format!("# Configuration for {APP_NAME}\n# File: {}\n\n", path.display());
    body.push_str(&toml);
    fs::write(path, body).with_context(|| format!("writing config file to {}", path.display()))
}

fn expand_path(path: PathBuf) -> Result<PathBuf> {
    if let Some(text) = path.to_str() {
        expand_str_path(text)
    } else {
        Ok(path)
    }
}

pub fn expand_str_path(text: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(text).context("expanding path")?;
    Ok(PathBuf::from(expanded.to_string()))
}

fn default_config_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir).join(APP_NAME));
    }

    if let Some(mut dir) = dirs::config_dir() {
        dir.push(APP_NAME);
        return Ok(dir);
    }

    dirs::home_dir()
        .map(|home| home.join(".config").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine configuration directory"))
}

fn default_data_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir).join(APP_NAME));
    }

    if let Some(mut dir) = dirs::data_dir() {
        dir.push(APP_NAME);
        return Ok(dir);
    }

    dirs::home_dir()
        .map(|home| home.join(".local").join("share").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine data directory"))
}

fn env_prefix() -> String {
    APP_NAME.to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.server.port, 4317);
        assert_eq!(config.models.cache_ttl_ms, 300_000);
        assert_eq!(config.models.local_endpoint, "http://localhost:11434");
        assert_eq!(config.files.noise_dirs, vec!["node_modules".to_string()]);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[server]
port = 9000
allowed_origins = ["tauri://localhost"]

[models]
local_timeout_ms = 1000

[files]
noise_dirs = ["node_modules", "target"]
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.allowed_origins, vec!["tauri://localhost".to_string()]);
        assert_eq!(config.models.local_timeout_ms, 1000);
        assert_eq!(config.models.cache_ttl_ms, 300_000);
        assert!(config.files.is_skipped("target"));
    }

    #[test]
    fn test_default_config_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.toml");

        write_default_config(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Configuration for agentdesk"));

        let config = load_config(&path).unwrap();
        assert_eq!(config.server.port, ServerConfig::default().port);
        assert_eq!(config.picker.command, default_picker_command());
    }

    #[test]
    fn test_paths_override_data_dir() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            paths: PathsConfig {
                data_dir: Some(dir.path().to_string_lossy().into_owned()),
            },
            ..AppConfig::default()
        };

        let paths = AppPaths::discover(Some(dir.path().to_path_buf()))
            .unwrap()
            .apply_overrides(&config)
            .unwrap();

        assert_eq!(paths.config_file, dir.path().join("config.toml"));
        assert_eq!(paths.database_path(), dir.path().join("agentdesk.db"));
    }
}
