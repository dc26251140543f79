//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/medsync/config.toml)
//! 3. Environment variables (MEDSYNC_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix
const ENV_PREFIX: &str = "MEDSYNC";

/// Default HTTP request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (SQLite db)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Base URL of the medication API
    #[serde(default)]
    pub api_url: Option<String>,

    /// API key sent as `x-api-key`
    #[serde(default)]
    pub api_key: Option<String>,

    /// User whose medications are synchronized
    #[serde(default)]
    pub username: Option<String>,

    /// Whether write commands sync automatically
    #[serde(default)]
    pub sync_enabled: bool,

    /// HTTP request timeout
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Write logs to this file instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            api_url: None,
            api_key: None,
            username: None,
            sync_enabled: false,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (MEDSYNC_DATA_DIR, MEDSYNC_API_URL, ...)
    /// 2. Config file (~/.config/medsync/config.toml or MEDSYNC_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values that cannot work at runtime
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Some(val) = env_optional("API_URL") {
            self.api_url = val;
        }

        if let Some(val) = env_optional("API_KEY") {
            self.api_key = val;
        }

        if let Some(val) = env_optional("USERNAME") {
            self.username = val;
        }

        if let Ok(val) = std::env::var(format!("{}_SYNC_ENABLED", ENV_PREFIX)) {
            self.sync_enabled = val.eq_ignore_ascii_case("true") || val == "1";
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with MEDSYNC_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("medsync")
            .join("config.toml")
    }

    /// Get the path to the SQLite database
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("medsync.db")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The configured username, or an error explaining how to set it
    pub fn require_username(&self) -> Result<&str> {
        self.username.as_deref().context(
            "No username configured. Run `medsync config set username <name>` \
             or set MEDSYNC_USERNAME.",
        )
    }

    /// The configured API URL, or an error explaining how to set it
    pub fn require_api_url(&self) -> Result<&str> {
        self.api_url.as_deref().context(
            "No API URL configured. Run `medsync config set api_url <url>` \
             or set MEDSYNC_API_URL.",
        )
    }

    /// Everything needed to talk to the remote: (api_url, username)
    pub fn require_remote(&self) -> Result<(&str, &str)> {
        Ok((self.require_api_url()?, self.require_username()?))
    }
}

/// Read `MEDSYNC_<name>`; `Some(None)` when set to an empty string
fn env_optional(name: &str) -> Option<Option<String>> {
    std::env::var(format!("{}_{}", ENV_PREFIX, name))
        .ok()
        .map(|val| if val.is_empty() { None } else { Some(val) })
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("medsync")
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "MEDSYNC_DATA_DIR",
        "MEDSYNC_API_URL",
        "MEDSYNC_API_KEY",
        "MEDSYNC_USERNAME",
        "MEDSYNC_SYNC_ENABLED",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.sync_enabled);
        assert!(config.api_url.is_none());
        assert!(config.username.is_none());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.data_dir.ends_with("medsync"));
    }

    #[test]
    fn test_sqlite_path() {
        let config = Config::default();
        assert!(config.sqlite_path().ends_with("medsync.db"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("MEDSYNC_DATA_DIR", "/tmp/medsync-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/medsync-test"));
    }

    #[test]
    fn test_env_override_sync_enabled() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        assert!(!config.sync_enabled);

        env::set_var("MEDSYNC_SYNC_ENABLED", "true");
        config.apply_env_overrides();
        assert!(config.sync_enabled);

        env::set_var("MEDSYNC_SYNC_ENABLED", "1");
        config.sync_enabled = false;
        config.apply_env_overrides();
        assert!(config.sync_enabled);

        env::set_var("MEDSYNC_SYNC_ENABLED", "false");
        config.apply_env_overrides();
        assert!(!config.sync_enabled);
    }

    #[test]
    fn test_env_override_remote_settings() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("MEDSYNC_API_URL", "http://localhost:8080");
        env::set_var("MEDSYNC_API_KEY", "secret");
        env::set_var("MEDSYNC_USERNAME", "alice");
        config.apply_env_overrides();
        assert_eq!(config.api_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.require_remote().unwrap(), ("http://localhost:8080", "alice"));

        // Empty string clears it
        env::set_var("MEDSYNC_API_KEY", "");
        config.apply_env_overrides();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_require_username_missing() {
        let config = Config::default();
        let err = config.require_username().unwrap_err();
        assert!(err.to_string().contains("No username configured"));
        assert!(config.require_remote().is_err());
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/medsync"),
            api_url: Some("https://api.example.com".to_string()),
            api_key: None,
            username: Some("alice".to_string()),
            sync_enabled: true,
            request_timeout_secs: 10,
            log_file: None,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("api_url"));
        assert!(toml_str.contains("sync_enabled"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.api_url, config.api_url);
        assert_eq!(parsed.username, config.username);
        assert_eq!(parsed.request_timeout_secs, 10);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            api_url = "https://api.example.com"
            username = "bob"
            sync_enabled = true
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.api_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.username.as_deref(), Some("bob"));
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.sync_enabled);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let _guard = EnvGuard::new(ENV_VARS);

        let err = Config::load_from_str("request_timeout_secs = 0").unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            format!(
                "data_dir = {:?}\nrequest_timeout_secs = 0\n",
                dir.path().join("data").display().to_string()
            ),
        )
        .unwrap();
        assert!(Config::load_from_path(&path).is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let _guard = EnvGuard::new(ENV_VARS);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config {
            data_dir: dir.path().join("data"),
            username: Some("carol".to_string()),
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.username.as_deref(), Some("carol"));
        assert!(loaded.data_dir.exists());
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let dir = tempfile::tempdir().unwrap();
        env::set_var("MEDSYNC_DATA_DIR", dir.path().join("data"));

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        // Should return defaults when file doesn't exist
        assert!(!config.sync_enabled);
        assert!(config.api_url.is_none());
    }
}
