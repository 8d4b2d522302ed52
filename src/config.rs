//! Configuration management for the chirp CLI
//!
//! Values are layered: built-in defaults, then the JSON file in the user's
//! config directory, then `CHIRP_*` environment variables.

use config::{Config as ConfigLoader, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{ChirpError, Result};
use crate::ui::UI;
use crate::ConfigCommand;

const DEFAULT_USER_SERVICE_URL: &str = "http://localhost:8081";
const DEFAULT_POST_SERVICE_URL: &str = "http://localhost:8083";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub user_service_url: String,
    pub post_service_url: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    #[serde(default = "default_token_storage_enabled")]
    pub token_storage_enabled: bool,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

fn default_token_storage_enabled() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_service_url: DEFAULT_USER_SERVICE_URL.to_string(),
            post_service_url: DEFAULT_POST_SERVICE_URL.to_string(),
            timeout: default_timeout(),
            verbose: false,
            storage_dir: default_storage_dir(),
            token_storage_enabled: default_token_storage_enabled(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

impl Config {
    /// Load from the default config file location
    pub async fn load() -> Result<Self> {
        Self::load_from(&default_config_path()).await
    }

    /// Load from an explicit config file; a missing file means defaults
    pub async fn load_from(config_path: &Path) -> Result<Self> {
        let config = Self::from_file_and_env(Some(config_path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file_and_env(config_file: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = ConfigLoader::builder()
            .set_default("user_service_url", defaults.user_service_url)?
            .set_default("post_service_url", defaults.post_service_url)?
            .set_default("timeout", DEFAULT_TIMEOUT_SECS as i64)?
            .set_default("verbose", false)?
            .set_default(
                "storage_dir",
                defaults.storage_dir.to_string_lossy().to_string(),
            )?
            .set_default("token_storage_enabled", true)?
            .set_default("refresh_interval", DEFAULT_REFRESH_INTERVAL_SECS as i64)?;

        if let Some(config_path) = config_file {
            if config_path.exists() {
                builder = builder.add_source(File::from(config_path));
            }
        }
        builder = builder.add_source(Environment::with_prefix("CHIRP").try_parsing(true));

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    pub async fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ChirpError::storage_write("Failed to create config directory", e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content)
            .await
            .map_err(|e| ChirpError::storage_write("Failed to write config", e))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("user_service_url", &self.user_service_url),
            ("post_service_url", &self.post_service_url),
        ] {
            if url.trim().is_empty() {
                return Err(ChirpError::invalid_endpoint(format!("{} cannot be empty", name)));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ChirpError::invalid_endpoint(format!(
                    "{} must start with http:// or https:// (got '{}')",
                    name, url
                )));
            }
        }
        if self.timeout == 0 {
            return Err(ChirpError::config("timeout must be at least 1 second"));
        }
        if self.refresh_interval == 0 {
            return Err(ChirpError::config(
                "refresh_interval must be at least 1 second",
            ));
        }
        Ok(())
    }

    /// Where the session's key/value document lives
    pub fn session_path(&self) -> PathBuf {
        self.storage_dir.join("session.json")
    }
}

/// Join a service base URL and an endpoint path without doubling slashes
pub fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    let endpoint = endpoint.strip_prefix('/').unwrap_or(endpoint);
    format!("{}/{}", base_url.trim_end_matches('/'), endpoint)
}

pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chirp")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.json")
}

pub fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chirp")
}

/// Handles `chirp config ...`
pub struct ConfigService {
    config: Config,
    config_path: PathBuf,
    ui: UI,
}

impl ConfigService {
    pub fn new(config: Config) -> Self {
        Self::with_config_path(config, default_config_path())
    }

    pub fn with_config_path(config: Config, config_path: PathBuf) -> Self {
        Self {
            config,
            config_path,
            ui: UI::new(),
        }
    }

    pub async fn handle_config(&mut self, command: ConfigCommand) -> Result<()> {
        match command {
            ConfigCommand::Show => {
                self.show();
                return Ok(());
            }
            ConfigCommand::SetUserService { url } => self.config.user_service_url = url,
            ConfigCommand::SetPostService { url } => self.config.post_service_url = url,
            ConfigCommand::SetTimeout { seconds } => self.config.timeout = seconds,
            ConfigCommand::SetRefreshInterval { seconds } => self.config.refresh_interval = seconds,
            ConfigCommand::SetVerbose { enabled } => self.config.verbose = enabled,
            ConfigCommand::Reset => self.config = Config::default(),
        }

        self.config.validate()?;
        self.config.save(&self.config_path).await?;
        tracing::info!(path = %self.config_path.display(), "configuration saved");
        self.ui.success("Configuration updated");
        self.show();
        Ok(())
    }

    fn show(&self) {
        self.ui.card(
            "Configuration",
            vec![
                ("User service", self.config.user_service_url.clone()),
                ("Post service", self.config.post_service_url.clone()),
                ("Timeout", format!("{}s", self.config.timeout)),
                ("Refresh interval", format!("{}s", self.config.refresh_interval)),
                ("Verbose logging", self.config.verbose.to_string()),
                (
                    "Session storage",
                    if self.config.token_storage_enabled {
                        self.config.session_path().display().to_string()
                    } else {
                        "disabled (memory only)".to_string()
                    },
                ),
                ("Config file", self.config_path.display().to_string()),
            ],
        );
    }
}
