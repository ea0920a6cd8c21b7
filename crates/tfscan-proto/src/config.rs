use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;

/// Environment variable that overrides `api.base_url`.
pub const API_URL_ENV: &str = "TFSCAN_API_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Root of the catalog/scan service, without the `/api/...` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Forwarded to the catalog as `page_size` when set.
    #[serde(default)]
    pub page_size: Option<u32>,
    /// Per-request timeout.  Unset means requests may wait indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// How long error toasts stay on screen.
    #[serde(default = "default_toast_secs")]
    pub toast_secs: u64,
    /// Redraw/expiry tick.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: None,
            request_timeout_secs: None,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            toast_secs: default_toast_secs(),
            tick_ms: default_tick_ms(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_toast_secs() -> u64 {
    5
}

fn default_tick_ms() -> u64 {
    100
}

fn default_log_filter() -> String {
    "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string()
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|&s| s > 0)
            .map(Duration::from_secs)
    }
}

impl UiConfig {
    pub fn toast_duration(&self) -> Duration {
        Duration::from_secs(self.toast_secs.max(1))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.clamp(16, 1000))
    }
}

impl Config {
    /// Load from the default location, writing defaults on first run, then
    /// apply environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(std::env::var(API_URL_ENV).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `TFSCAN_API_URL` wins over the file when set and non-blank.
    pub fn apply_env(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url {
            let url = url.trim();
            if !url.is_empty() {
                self.api.base_url = url.to_string();
            }
        }
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.page_size, None);
        assert_eq!(config.api.request_timeout(), None);
        assert_eq!(config.ui.toast_secs, 5);
        assert!(config.log.filter.starts_with("debug"));
    }

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.api.base_url, "http://localhost:8000");

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.ui.tick_ms, config.ui.tick_ms);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[api]\nbase_url = \"http://scanner:9000\"\nrequest_timeout_secs = 30\n",
        )
        .unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api.base_url, "http://scanner:9000");
        assert_eq!(config.api.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.ui.toast_secs, 5);
    }

    #[test]
    fn test_broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\nbase_url = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_env_override() {
        let mut config = Config::default();
        config.apply_env(Some("  ".into()));
        assert_eq!(config.api.base_url, "http://localhost:8000");
        config.apply_env(Some("http://10.0.0.2:8000/".into()));
        assert_eq!(config.api.base_url, "http://10.0.0.2:8000/");
        config.apply_env(None);
        assert_eq!(config.api.base_url, "http://10.0.0.2:8000/");
    }
}
