use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Workspace file access configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Directory names skipped by snapshots and watch notifications
    #[serde(default = "default_noise_dirs")]
    pub noise_dirs: Vec<String>,

    /// Maximum file size returned by a read (in bytes)
    #[serde(default = "default_max_read_bytes")]
    pub max_read_bytes: u64,

    /// Quiet period before a batch of change events is emitted (in milliseconds)
    #[serde(default = "default_watch_debounce_ms")]
    pub watch_debounce_ms: u64,
}

fn default_noise_dirs() -> Vec<String> {
    vec!["node_modules".to_string()]
}

fn default_max_read_bytes() -> u64 {
    50 * 1024 * 1024 // 50 MB
}

fn default_watch_debounce_ms() -> u64 {
    250
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            noise_dirs: default_noise_dirs(),
            max_read_bytes: default_max_read_bytes(),
            watch_debounce_ms: default_watch_debounce_ms(),
        }
    }
}

impl FilesConfig {
    /// Check if an entry name is hidden or noise and should be skipped
    pub fn is_skipped(&self, name: &str) -> bool {
        name.starts_with('.') || self.noise_dirs.iter().any(|d| d == name)
    }

    pub fn watch_debounce(&self) -> Duration {
        Duration::from_millis(self.watch_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_skipped() {
        let config = FilesConfig::default();
        assert!(config.is_skipped(".git"));
        assert!(config.is_skipped(".env"));
        assert!(config.is_skipped("node_modules"));
        assert!(!config.is_skipped("src"));
        assert!(!config.is_skipped("node_modules_backup"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: FilesConfig = from_json(r#"{ "max_read_bytes": 10 }"#);
        assert_eq!(config.max_read_bytes, 10);
        assert_eq!(config.noise_dirs, vec!["node_modules".to_string()]);
        assert_eq!(config.watch_debounce(), Duration::from_millis(250));
    }

    fn from_json(json: &str) -> FilesConfig {
        serde_json::from_str(json).unwrap()
    }
}
